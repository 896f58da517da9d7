//! Windows Registry preference store.
//!
//! Backs [`PreferenceStore`] with values under `HKCU\Software\MicMuteRs`.
//! Strings are `REG_SZ`; booleans and f32 bit patterns are `REG_DWORD`.

use windows::core::PCWSTR;
use windows::Win32::System::Registry::{
    RegCloseKey, RegCreateKeyExW, RegDeleteValueW, RegOpenKeyExW, RegQueryValueExW,
    RegSetValueExW, HKEY, HKEY_CURRENT_USER, KEY_READ, KEY_WRITE, REG_CREATE_KEY_DISPOSITION,
    REG_DWORD, REG_OPTION_NON_VOLATILE, REG_SZ,
};

use super::prefs::{PreferenceStore, PreferencesError};

const APP_KEY: &str = r"Software\MicMuteRs";

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Registry-backed preference store.
pub struct RegistryPreferences {
    app_key_path: Vec<u16>,
}

impl RegistryPreferences {
    pub fn new() -> Self {
        Self {
            app_key_path: to_wide(APP_KEY),
        }
    }

    fn open_read(&self) -> Option<HKEY> {
        unsafe {
            let mut hkey = HKEY::default();
            let result = RegOpenKeyExW(
                HKEY_CURRENT_USER,
                PCWSTR::from_raw(self.app_key_path.as_ptr()),
                0,
                KEY_READ,
                &mut hkey,
            );
            if result.is_err() {
                return None;
            }
            Some(hkey)
        }
    }

    fn open_write(&self) -> Result<HKEY, PreferencesError> {
        unsafe {
            let mut hkey = HKEY::default();
            let mut disposition = REG_CREATE_KEY_DISPOSITION::default();
            let result = RegCreateKeyExW(
                HKEY_CURRENT_USER,
                PCWSTR::from_raw(self.app_key_path.as_ptr()),
                0,
                PCWSTR::null(),
                REG_OPTION_NON_VOLATILE,
                KEY_WRITE,
                None,
                &mut hkey,
                Some(&mut disposition),
            );
            if result.is_err() {
                return Err(PreferencesError::StorageAccess(
                    "failed to open application registry key".to_string(),
                ));
            }
            Ok(hkey)
        }
    }

    fn get_dword(&self, key: &str) -> Option<u32> {
        unsafe {
            let hkey = self.open_read()?;
            let value_name = to_wide(key);
            let mut data: u32 = 0;
            let mut data_size = std::mem::size_of::<u32>() as u32;

            let result = RegQueryValueExW(
                hkey,
                PCWSTR::from_raw(value_name.as_ptr()),
                None,
                None,
                Some(&mut data as *mut u32 as *mut u8),
                Some(&mut data_size),
            );
            let _ = RegCloseKey(hkey);

            if result.is_ok() {
                Some(data)
            } else {
                None
            }
        }
    }

    fn set_dword(&self, key: &str, data: u32) -> Result<(), PreferencesError> {
        unsafe {
            let hkey = self.open_write()?;
            let value_name = to_wide(key);

            let result = RegSetValueExW(
                hkey,
                PCWSTR::from_raw(value_name.as_ptr()),
                0,
                REG_DWORD,
                Some(std::slice::from_raw_parts(
                    &data as *const u32 as *const u8,
                    std::mem::size_of::<u32>(),
                )),
            );
            let _ = RegCloseKey(hkey);

            if result.is_err() {
                Err(PreferencesError::WriteFailed {
                    key: key.to_string(),
                })
            } else {
                Ok(())
            }
        }
    }
}

impl Default for RegistryPreferences {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferenceStore for RegistryPreferences {
    fn get_string(&self, key: &str) -> Option<String> {
        unsafe {
            let hkey = self.open_read()?;
            let value_name = to_wide(key);

            // First query for the size, then for the data.
            let mut data_size = 0u32;
            let result = RegQueryValueExW(
                hkey,
                PCWSTR::from_raw(value_name.as_ptr()),
                None,
                None,
                None,
                Some(&mut data_size),
            );
            if result.is_err() || data_size == 0 {
                let _ = RegCloseKey(hkey);
                return None;
            }

            let mut buf = vec![0u8; data_size as usize];
            let result = RegQueryValueExW(
                hkey,
                PCWSTR::from_raw(value_name.as_ptr()),
                None,
                None,
                Some(buf.as_mut_ptr()),
                Some(&mut data_size),
            );
            let _ = RegCloseKey(hkey);

            if result.is_err() {
                return None;
            }

            let wide: Vec<u16> = buf
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .take_while(|&c| c != 0)
                .collect();
            Some(String::from_utf16_lossy(&wide))
        }
    }

    fn set_string(&self, key: &str, value: &str) -> Result<(), PreferencesError> {
        unsafe {
            let hkey = self.open_write()?;
            let value_name = to_wide(key);
            let data = to_wide(value);

            let result = RegSetValueExW(
                hkey,
                PCWSTR::from_raw(value_name.as_ptr()),
                0,
                REG_SZ,
                Some(std::slice::from_raw_parts(
                    data.as_ptr() as *const u8,
                    data.len() * 2,
                )),
            );
            let _ = RegCloseKey(hkey);

            if result.is_err() {
                Err(PreferencesError::WriteFailed {
                    key: key.to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_dword(key).map(|v| v != 0)
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), PreferencesError> {
        self.set_dword(key, u32::from(value))
    }

    fn get_f32(&self, key: &str) -> Option<f32> {
        self.get_dword(key).map(f32::from_bits)
    }

    fn set_f32(&self, key: &str, value: f32) -> Result<(), PreferencesError> {
        self.set_dword(key, value.to_bits())
    }

    fn remove(&self, key: &str) -> Result<(), PreferencesError> {
        unsafe {
            let Some(hkey) = self.open_read() else {
                return Ok(());
            };
            let _ = RegCloseKey(hkey);

            let hkey = self.open_write()?;
            let value_name = to_wide(key);
            let _ = RegDeleteValueW(hkey, PCWSTR::from_raw(value_name.as_ptr()));
            let _ = RegCloseKey(hkey);
            Ok(())
        }
    }
}
