//! Audio device data models.
//!
//! Defines the core data structures for representing input devices,
//! their volume state, and the audio subsystem error type.

use thiserror::Error;

/// Opaque numeric handle for an audio device.
///
/// Valid only for the current OS session; `0` is the reserved "no device"
/// sentinel. Durable identity across sessions is the device UID string.
pub type DeviceId = u32;

/// Sentinel `DeviceId` meaning "no device".
pub const NO_DEVICE: DeviceId = 0;

/// An input-capable audio device, as seen at enumeration time.
///
/// Snapshots are read-only; nothing in this crate mutates a device value
/// after enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputDevice {
    /// Session-scoped numeric handle
    pub id: DeviceId,

    /// Stable string UID, used for persisted user preference
    pub uid: String,

    /// Human-readable device name
    pub name: String,
}

/// Aggregate volume state of one device at one instant.
///
/// Always the result of a fresh query across the device's volume elements,
/// never cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeInfo {
    /// Average scalar level across readable elements (0.0 to 1.0)
    pub level: f32,

    /// True if at least one element accepts volume writes
    pub is_settable: bool,
}

/// An addressable sub-control of a device's volume.
///
/// Hardware is heterogeneous here: some devices expose one master control,
/// others only per-channel controls numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeElement {
    /// The master/global element
    Main,

    /// A per-channel element (channels are numbered 1..=n)
    Channel(u32),
}

/// Audio subsystem error types.
#[derive(Debug, Error)]
pub enum AudioError {
    /// An OS property get/set failed or returned an unexpected status.
    #[error("{op} failed with status {status}")]
    DeviceQuery { status: i32, op: &'static str },

    /// The OS reports no default input device.
    #[error("no default input device")]
    NoDefaultDevice,

    /// The device exposes neither a mute control nor a volume control.
    #[error("device supports neither mute nor input volume control")]
    Unsupported,
}

impl AudioError {
    /// Shorthand for a property query failure.
    pub fn query(status: i32, op: &'static str) -> Self {
        AudioError::DeviceQuery { status, op }
    }
}
