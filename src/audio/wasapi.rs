//! Windows Core Audio backend.
//!
//! Implements [`AudioBackend`] over the MMDevice API and
//! `IAudioEndpointVolume`. Endpoint identity on Windows is an opaque string;
//! this backend hands out arena-style numeric handles and keeps the
//! handle-to-endpoint-id table for the session, so the rest of the crate
//! never sees a raw COM identifier.
//!
//! COM must be initialized on the calling thread before constructing the
//! backend (the binary owns the `CoInitializeEx` lifecycle).

use std::cell::RefCell;
use std::collections::HashMap;

use windows::core::{GUID, HRESULT, PCWSTR};
use windows::Win32::Media::Audio::Endpoints::IAudioEndpointVolume;
use windows::Win32::Media::Audio::{
    eCapture, eConsole, IMMDevice, IMMDeviceEnumerator, MMDeviceEnumerator, DEVICE_STATE_ACTIVE,
};
use windows::Win32::System::Com::{CoCreateInstance, CLSCTX_ALL, STGM};
use windows::Win32::UI::Shell::PropertiesSystem::PROPERTYKEY;

use super::backend::AudioBackend;
use super::device::{AudioError, DeviceId, VolumeElement, NO_DEVICE};

// Property key for the device friendly name
const PKEY_DEVICE_FRIENDLY_NAME: PROPERTYKEY = PROPERTYKEY {
    fmtid: GUID::from_u128(0xa45c254e_df1c_4efd_8020_67d146a850e0),
    pid: 14,
};

fn query_err(e: &windows::core::Error, op: &'static str) -> AudioError {
    AudioError::query(e.code().0, op)
}

/// Numeric-handle arena over WASAPI capture endpoints.
pub struct WasapiBackend {
    enumerator: IMMDeviceEnumerator,
    handles: RefCell<HandleArena>,
}

#[derive(Default)]
struct HandleArena {
    by_endpoint: HashMap<String, DeviceId>,
    by_handle: HashMap<DeviceId, String>,
    next: DeviceId,
}

impl HandleArena {
    fn intern(&mut self, endpoint_id: String) -> DeviceId {
        if let Some(&id) = self.by_endpoint.get(&endpoint_id) {
            return id;
        }
        self.next += 1;
        let id = self.next;
        self.by_endpoint.insert(endpoint_id.clone(), id);
        self.by_handle.insert(id, endpoint_id);
        id
    }

    fn endpoint(&self, id: DeviceId) -> Option<String> {
        self.by_handle.get(&id).cloned()
    }
}

impl WasapiBackend {
    /// Create the backend. COM must already be initialized.
    pub fn new() -> Result<Self, AudioError> {
        unsafe {
            let enumerator: IMMDeviceEnumerator =
                CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)
                    .map_err(|e| query_err(&e, "CoCreateInstance(MMDeviceEnumerator)"))?;

            Ok(Self {
                enumerator,
                handles: RefCell::new(HandleArena {
                    next: NO_DEVICE,
                    ..Default::default()
                }),
            })
        }
    }

    fn device(&self, id: DeviceId) -> Option<IMMDevice> {
        let endpoint = self.handles.borrow().endpoint(id)?;
        let wide: Vec<u16> = endpoint.encode_utf16().chain(std::iter::once(0)).collect();
        unsafe { self.enumerator.GetDevice(PCWSTR::from_raw(wide.as_ptr())).ok() }
    }

    fn endpoint_volume(&self, id: DeviceId) -> Option<IAudioEndpointVolume> {
        let device = self.device(id)?;
        unsafe { device.Activate::<IAudioEndpointVolume>(CLSCTX_ALL, None).ok() }
    }

    fn channel_count(&self, id: DeviceId) -> u32 {
        self.endpoint_volume(id)
            .and_then(|v| unsafe { v.GetChannelCount().ok() })
            .unwrap_or(0)
    }
}

impl AudioBackend for WasapiBackend {
    fn device_ids(&self) -> Result<Vec<DeviceId>, AudioError> {
        unsafe {
            let collection = self
                .enumerator
                .EnumAudioEndpoints(eCapture, DEVICE_STATE_ACTIVE)
                .map_err(|e| query_err(&e, "EnumAudioEndpoints(capture)"))?;

            let count = collection
                .GetCount()
                .map_err(|e| query_err(&e, "IMMDeviceCollection::GetCount"))?;

            let mut ids = Vec::with_capacity(count as usize);
            for i in 0..count {
                let Ok(device) = collection.Item(i) else { continue };
                let Ok(endpoint) = device.GetId() else { continue };
                let Ok(endpoint) = endpoint.to_string() else { continue };
                ids.push(self.handles.borrow_mut().intern(endpoint));
            }
            Ok(ids)
        }
    }

    fn input_channel_count(&self, id: DeviceId) -> u32 {
        // Capture endpoints only ever enter the arena, so the endpoint
        // volume channel count is the input channel count.
        self.channel_count(id)
    }

    fn device_name(&self, id: DeviceId) -> Option<String> {
        let device = self.device(id)?;
        unsafe {
            let store = device.OpenPropertyStore(STGM(0)).ok()?; // STGM_READ
            let prop = store.GetValue(&PKEY_DEVICE_FRIENDLY_NAME as *const _).ok()?;
            let name = prop.to_string();
            if name.is_empty() {
                None
            } else {
                Some(name)
            }
        }
    }

    fn device_uid(&self, id: DeviceId) -> Option<String> {
        // The endpoint ID string is stable across sessions; it is the UID.
        self.handles.borrow().endpoint(id)
    }

    fn default_input_device(&self) -> Result<DeviceId, AudioError> {
        unsafe {
            let device = match self.enumerator.GetDefaultAudioEndpoint(eCapture, eConsole) {
                Ok(d) => d,
                // No capture device present at all: report the sentinel and
                // let the registry classify it.
                Err(_) => return Ok(NO_DEVICE),
            };
            let endpoint = device
                .GetId()
                .map_err(|e| query_err(&e, "IMMDevice::GetId"))?
                .to_string()
                .map_err(|_| AudioError::query(-1, "endpoint id conversion"))?;
            Ok(self.handles.borrow_mut().intern(endpoint))
        }
    }

    fn set_default_input_device(&self, id: DeviceId) -> Result<(), AudioError> {
        let endpoint = self
            .handles
            .borrow()
            .endpoint(id)
            .ok_or_else(|| AudioError::query(-1, "set default input device"))?;
        policy::set_default_capture_device(&endpoint)
    }

    fn has_volume_control(&self, id: DeviceId, element: VolumeElement) -> bool {
        match element {
            VolumeElement::Main => self.endpoint_volume(id).is_some(),
            VolumeElement::Channel(ch) => ch >= 1 && ch <= self.channel_count(id),
        }
    }

    fn volume_is_settable(&self, id: DeviceId, element: VolumeElement) -> bool {
        // Endpoint volume is software-backed on Windows; present implies
        // settable.
        self.has_volume_control(id, element)
    }

    fn read_volume(&self, id: DeviceId, element: VolumeElement) -> Result<f32, AudioError> {
        let volume = self
            .endpoint_volume(id)
            .ok_or_else(|| AudioError::query(-1, "activate endpoint volume"))?;
        unsafe {
            match element {
                VolumeElement::Main => volume
                    .GetMasterVolumeLevelScalar()
                    .map_err(|e| query_err(&e, "GetMasterVolumeLevelScalar")),
                VolumeElement::Channel(ch) => volume
                    .GetChannelVolumeLevelScalar(ch - 1)
                    .map_err(|e| query_err(&e, "GetChannelVolumeLevelScalar")),
            }
        }
    }

    fn write_volume(
        &self,
        id: DeviceId,
        element: VolumeElement,
        level: f32,
    ) -> Result<(), AudioError> {
        let volume = self
            .endpoint_volume(id)
            .ok_or_else(|| AudioError::query(-1, "activate endpoint volume"))?;
        unsafe {
            match element {
                VolumeElement::Main => volume
                    .SetMasterVolumeLevelScalar(level, std::ptr::null())
                    .map_err(|e| query_err(&e, "SetMasterVolumeLevelScalar")),
                VolumeElement::Channel(ch) => volume
                    .SetChannelVolumeLevelScalar(ch - 1, level, std::ptr::null())
                    .map_err(|e| query_err(&e, "SetChannelVolumeLevelScalar")),
            }
        }
    }

    fn has_mute_control(&self, id: DeviceId) -> bool {
        self.endpoint_volume(id).is_some()
    }

    fn read_mute(&self, id: DeviceId) -> Result<bool, AudioError> {
        let volume = self
            .endpoint_volume(id)
            .ok_or_else(|| AudioError::query(-1, "activate endpoint volume"))?;
        unsafe {
            volume
                .GetMute()
                .map(|b| b.as_bool())
                .map_err(|e| query_err(&e, "GetMute"))
        }
    }

    fn write_mute(&self, id: DeviceId, muted: bool) -> Result<(), AudioError> {
        let volume = self
            .endpoint_volume(id)
            .ok_or_else(|| AudioError::query(-1, "activate endpoint volume"))?;
        unsafe {
            volume
                .SetMute(muted, std::ptr::null())
                .map_err(|e| query_err(&e, "SetMute"))
        }
    }
}

mod policy {
    //! Default-device selection via the undocumented but stable
    //! IPolicyConfig COM interface.

    use super::*;
    use windows::core::IUnknown;

    #[windows::core::interface("F8679F50-850A-41CF-9C72-430F290290C8")]
    unsafe trait IPolicyConfig: IUnknown {
        // Reserved methods to maintain vtable order
        fn reserved1(&self) -> HRESULT;
        fn reserved2(&self) -> HRESULT;
        fn reserved3(&self) -> HRESULT;
        fn reserved4(&self) -> HRESULT;
        fn reserved5(&self) -> HRESULT;
        fn reserved6(&self) -> HRESULT;
        fn reserved7(&self) -> HRESULT;
        fn reserved8(&self) -> HRESULT;
        fn reserved9(&self) -> HRESULT;
        fn reserved10(&self) -> HRESULT;

        fn SetDefaultEndpoint(&self, device_id: PCWSTR, role: u32) -> HRESULT;
    }

    const CLSID_POLICY_CONFIG_CLIENT: GUID =
        GUID::from_u128(0x870af99c_171d_4f9e_af0d_e63df40c2bc9);

    const ROLE_CONSOLE: u32 = 0;

    pub(super) fn set_default_capture_device(endpoint: &str) -> Result<(), AudioError> {
        unsafe {
            let policy_config: IPolicyConfig =
                CoCreateInstance(&CLSID_POLICY_CONFIG_CLIENT, None, CLSCTX_ALL)
                    .map_err(|e| query_err(&e, "CoCreateInstance(PolicyConfig)"))?;

            let wide: Vec<u16> = endpoint.encode_utf16().chain(std::iter::once(0)).collect();
            policy_config
                .SetDefaultEndpoint(PCWSTR(wide.as_ptr()), ROLE_CONSOLE)
                .ok()
                .map_err(|e| query_err(&e, "IPolicyConfig::SetDefaultEndpoint"))?;

            Ok(())
        }
    }
}
