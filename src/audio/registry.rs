//! Input device registry.
//!
//! Enumerates input-capable devices, resolves their identity, manages the
//! OS-wide default input device, and reads/writes volume and mute state
//! through an [`AudioBackend`].
//!
//! Volume is element-addressed: a device exposes either one master element
//! or one element per input channel. Resolution prefers the master element
//! and falls back to enumerating channels 1..=n, keeping every element that
//! actually has the control. Getting this order wrong silently no-ops a
//! user's volume change on per-channel hardware, so both the read and the
//! write path share the same resolver.

use tracing::debug;

use super::backend::AudioBackend;
use super::device::{AudioError, DeviceId, InputDevice, VolumeElement, VolumeInfo, NO_DEVICE};

/// Registry over a platform audio backend.
pub struct DeviceRegistry<B: AudioBackend> {
    backend: B,
}

impl<B: AudioBackend> DeviceRegistry<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// The underlying backend, for host code that owns the event loop.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// All devices exposing at least one input channel, sorted by
    /// case-insensitive display name.
    ///
    /// Fails softly: a device that errors during name or UID resolution is
    /// skipped rather than aborting the whole listing.
    pub fn list_input_devices(&self) -> Vec<InputDevice> {
        let ids = self.backend.device_ids().unwrap_or_default();

        let mut devices: Vec<InputDevice> = Vec::with_capacity(ids.len());
        for id in ids {
            if self.backend.input_channel_count(id) == 0 {
                continue;
            }

            let name = match self.backend.device_name(id) {
                Some(name) => name,
                None => {
                    debug!(device = id, "skipping device without resolvable name");
                    continue;
                }
            };
            let uid = match self.backend.device_uid(id) {
                Some(uid) => uid,
                None => {
                    debug!(device = id, "skipping device without resolvable uid");
                    continue;
                }
            };

            devices.push(InputDevice { id, uid, name });
        }

        devices.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        devices
    }

    /// Handle of the current OS-wide default input device.
    pub fn default_input_device(&self) -> Result<DeviceId, AudioError> {
        let id = self.backend.default_input_device()?;
        if id == NO_DEVICE {
            return Err(AudioError::NoDefaultDevice);
        }
        Ok(id)
    }

    /// Change the OS-wide default input device.
    ///
    /// The side effect is process-wide: every other application sees the
    /// new default too.
    pub fn set_default_input_device(&self, id: DeviceId) -> Result<(), AudioError> {
        self.backend.set_default_input_device(id)
    }

    /// Find an input device by its durable UID.
    pub fn find_device_by_uid(&self, uid: &str) -> Option<DeviceId> {
        self.list_input_devices()
            .into_iter()
            .find(|d| d.uid == uid)
            .map(|d| d.id)
    }

    /// Aggregate volume across the device's resolved elements, or `None` if
    /// no element exposes a volume scalar.
    ///
    /// The level is the average of every readable element; `is_settable` is
    /// true if at least one resolved element accepts writes.
    pub fn volume_info(&self, id: DeviceId) -> Option<VolumeInfo> {
        let elements = self.volume_elements(id);
        if elements.is_empty() {
            return None;
        }

        let mut values: Vec<f32> = Vec::with_capacity(elements.len());
        let mut any_settable = false;

        for el in elements {
            if self.backend.volume_is_settable(id, el) {
                any_settable = true;
            }
            if let Ok(v) = self.backend.read_volume(id, el) {
                values.push(v);
            }
        }

        if values.is_empty() {
            return None;
        }

        let avg = values.iter().sum::<f32>() / values.len() as f32;
        Some(VolumeInfo {
            level: avg.clamp(0.0, 1.0),
            is_settable: any_settable,
        })
    }

    /// Write a volume level to every settable element of the device.
    ///
    /// The input is clamped to [0, 1]. Partial success across elements is
    /// not an error; the call fails only when not a single element accepted
    /// the write. Mute state is never touched.
    pub fn set_volume(&self, id: DeviceId, level: f32) -> Result<(), AudioError> {
        let elements = self.volume_elements(id);
        if elements.is_empty() {
            // No volume control at all: nothing to do.
            return Ok(());
        }

        let level = level.clamp(0.0, 1.0);
        let mut wrote_any = false;
        let mut last_err: Option<AudioError> = None;

        for el in elements {
            if !self.backend.volume_is_settable(id, el) {
                continue;
            }
            match self.backend.write_volume(id, el, level) {
                Ok(()) => wrote_any = true,
                Err(e) => last_err = Some(e),
            }
        }

        match (wrote_any, last_err) {
            (false, Some(e)) => Err(e),
            _ => Ok(()),
        }
    }

    /// Whether the device has a master boolean mute control.
    pub fn supports_mute(&self, id: DeviceId) -> bool {
        self.backend.has_mute_control(id)
    }

    /// Read the master mute switch. Fails on devices without one.
    pub fn mute(&self, id: DeviceId) -> Result<bool, AudioError> {
        self.backend.read_mute(id)
    }

    /// Write the master mute switch. Fails on devices without one.
    /// Volume state is never touched.
    pub fn set_mute(&self, id: DeviceId, muted: bool) -> Result<(), AudioError> {
        self.backend.write_mute(id, muted)
    }

    /// Whether the device exposes any volume element.
    pub fn supports_volume(&self, id: DeviceId) -> bool {
        !self.volume_elements(id).is_empty()
    }

    /// Resolve the element set used for all volume reads and writes.
    ///
    /// Master element if it carries the control, otherwise every channel
    /// element in 1..=n that does.
    fn volume_elements(&self, id: DeviceId) -> Vec<VolumeElement> {
        if self.backend.has_volume_control(id, VolumeElement::Main) {
            return vec![VolumeElement::Main];
        }

        let channels = self.backend.input_channel_count(id);
        (1..=channels)
            .map(VolumeElement::Channel)
            .filter(|&el| self.backend.has_volume_control(id, el))
            .collect()
    }
}
