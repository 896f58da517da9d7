//! Audio subsystem: device enumeration, volume, and mute policy.
//!
//! The [`backend::AudioBackend`] trait is the platform seam; everything
//! above it is platform-independent and tested against a scripted backend.

pub mod backend;
pub mod device;
pub mod mute;
pub mod registry;

#[cfg(windows)]
pub mod wasapi;

#[cfg(test)]
pub(crate) mod mock;

pub use backend::AudioBackend;
pub use device::{AudioError, DeviceId, InputDevice, VolumeElement, VolumeInfo, NO_DEVICE};
pub use mute::MuteController;
pub use registry::DeviceRegistry;
