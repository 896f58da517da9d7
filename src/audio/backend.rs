//! Platform seam for audio device property access.
//!
//! `AudioBackend` is the narrow surface the OS audio subsystem has to
//! provide: enumeration, identity lookup, default-device selection, and
//! per-element volume/mute property access. Everything above it
//! ([`DeviceRegistry`](super::registry::DeviceRegistry) and the mute policy)
//! is platform-independent.

use super::device::{AudioError, DeviceId, VolumeElement};

/// Low-level audio property access, implemented per platform.
///
/// Capability queries (`has_*`, `*_is_settable`) are cheap and must reflect
/// the device's state at call time; callers re-query rather than cache,
/// since devices can appear, vanish, or change capabilities between calls.
pub trait AudioBackend {
    /// All device handles currently known to the OS, input or not.
    fn device_ids(&self) -> Result<Vec<DeviceId>, AudioError>;

    /// Number of input channels the device exposes (0 for output-only).
    fn input_channel_count(&self, id: DeviceId) -> u32;

    /// Display name, if resolvable.
    fn device_name(&self, id: DeviceId) -> Option<String>;

    /// Durable UID string, if resolvable.
    fn device_uid(&self, id: DeviceId) -> Option<String>;

    /// The OS-wide default input device handle.
    ///
    /// May return the `0` sentinel; the registry turns that into
    /// [`AudioError::NoDefaultDevice`].
    fn default_input_device(&self) -> Result<DeviceId, AudioError>;

    /// Change the OS-wide default input device. Affects every application.
    fn set_default_input_device(&self, id: DeviceId) -> Result<(), AudioError>;

    /// Whether the element exposes a volume scalar at all.
    fn has_volume_control(&self, id: DeviceId, element: VolumeElement) -> bool;

    /// Whether the element's volume scalar accepts writes.
    fn volume_is_settable(&self, id: DeviceId, element: VolumeElement) -> bool;

    /// Read one element's volume scalar (0.0 to 1.0).
    fn read_volume(&self, id: DeviceId, element: VolumeElement) -> Result<f32, AudioError>;

    /// Write one element's volume scalar. The value is already clamped by
    /// the registry.
    fn write_volume(
        &self,
        id: DeviceId,
        element: VolumeElement,
        level: f32,
    ) -> Result<(), AudioError>;

    /// Whether the device has a master boolean mute control.
    fn has_mute_control(&self, id: DeviceId) -> bool;

    /// Read the master mute switch.
    fn read_mute(&self, id: DeviceId) -> Result<bool, AudioError>;

    /// Write the master mute switch.
    fn write_mute(&self, id: DeviceId, muted: bool) -> Result<(), AudioError>;
}
