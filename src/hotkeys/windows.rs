//! Win32 hotkey backend.
//!
//! `RegisterHotKey` binds combinations to the application's message window;
//! the binary's window procedure receives `WM_HOTKEY` and feeds the id into
//! [`HotkeyManager::dispatch`](super::HotkeyManager::dispatch) under this
//! manager's signature.

use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    RegisterHotKey, UnregisterHotKey, HOT_KEY_MODIFIERS,
};

use super::backend::HotkeyBackend;
use super::HotkeyError;

/// Hotkey registrations against one message window.
pub struct WindowsHotkeyBackend {
    hwnd: HWND,
}

impl WindowsHotkeyBackend {
    pub fn new(hwnd: HWND) -> Self {
        Self { hwnd }
    }
}

impl HotkeyBackend for WindowsHotkeyBackend {
    fn install(&mut self) -> Result<(), HotkeyError> {
        // WM_HOTKEY is delivered to the window without a separate callback
        // installation step.
        Ok(())
    }

    fn uninstall(&mut self) {}

    fn register(
        &mut self,
        registration_id: u32,
        key_code: u32,
        modifiers: u32,
    ) -> Result<(), HotkeyError> {
        unsafe {
            RegisterHotKey(
                self.hwnd,
                registration_id as i32,
                HOT_KEY_MODIFIERS(modifiers),
                key_code,
            )
            .map_err(|e| HotkeyError::Registration {
                key_code,
                modifiers,
                status: e.code().0,
            })
        }
    }

    fn unregister(&mut self, registration_id: u32) {
        unsafe {
            let _ = UnregisterHotKey(self.hwnd, registration_id as i32);
        }
    }
}
