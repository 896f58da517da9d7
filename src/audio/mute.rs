//! Mute policy over the device registry.
//!
//! Two policies, selected fresh on every call against whichever device is
//! the default input *right now* (the default can change between calls, so
//! a cached device id would mute the wrong hardware):
//!
//! - native mute when the device has a boolean mute switch;
//! - volume-zeroing fallback when it only has a volume control, with the
//!   pre-mute level remembered per device for restoration.
//!
//! Devices with neither control fail every operation with
//! [`AudioError::Unsupported`].

use std::collections::HashMap;

use super::backend::AudioBackend;
use super::device::{AudioError, DeviceId};
use super::registry::DeviceRegistry;

/// Levels at or below this count as muted for the volume fallback.
pub const MUTE_EPSILON: f32 = 0.0001;

/// Restore level used when no pre-mute volume was ever recorded for the
/// device (first mute of a freshly-seen device, or a restart lost the map).
pub const RESTORE_DEFAULT: f32 = 0.7;

/// Unmuting never restores below this, so a recorded near-zero level does
/// not leave the mic effectively muted.
pub const RESTORE_FLOOR: f32 = 0.05;

/// Mute/unmute policy layer.
///
/// Holds only the in-memory pre-mute volume map; all device state is read
/// fresh through the registry on each call.
#[derive(Debug, Default)]
pub struct MuteController {
    last_nonzero_volume: HashMap<DeviceId, f32>,
}

impl MuteController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the current default input device is muted.
    ///
    /// Native mute switch when present, else `level <= MUTE_EPSILON` on the
    /// volume fallback.
    pub fn is_muted<B: AudioBackend>(
        &self,
        registry: &DeviceRegistry<B>,
    ) -> Result<bool, AudioError> {
        let id = registry.default_input_device()?;

        if registry.supports_mute(id) {
            return registry.mute(id);
        }

        if let Some(info) = registry.volume_info(id) {
            return Ok(info.level <= MUTE_EPSILON);
        }

        Err(AudioError::Unsupported)
    }

    /// Toggle the current default input device. Returns the new mute state.
    pub fn toggle<B: AudioBackend>(
        &mut self,
        registry: &DeviceRegistry<B>,
    ) -> Result<bool, AudioError> {
        let id = registry.default_input_device()?;

        if registry.supports_mute(id) {
            let muted = registry.mute(id)?;
            registry.set_mute(id, !muted)?;
            return Ok(!muted);
        }

        if let Some(info) = registry.volume_info(id) {
            if info.level > MUTE_EPSILON {
                self.last_nonzero_volume.insert(id, info.level);
                registry.set_volume(id, 0.0)?;
                return Ok(true);
            }
            let recorded = self
                .last_nonzero_volume
                .get(&id)
                .copied()
                .unwrap_or(RESTORE_DEFAULT);
            registry.set_volume(id, recorded.clamp(RESTORE_FLOOR, 1.0))?;
            return Ok(false);
        }

        Err(AudioError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::super::mock::MockBackend;
    use super::*;

    fn registry_with(backend: MockBackend) -> DeviceRegistry<MockBackend> {
        DeviceRegistry::new(backend)
    }

    #[test]
    fn native_mute_toggle_leaves_volume_untouched() {
        let backend = MockBackend::new();
        backend.add_input_device(1, "A", "Mic A", 1);
        backend.enable_mute_control(1, true);
        backend.set_master_volume(1, 0.6, true);
        backend.set_default(1);

        let registry = registry_with(backend);
        let mut mute = MuteController::new();

        assert!(mute.is_muted(&registry).unwrap());
        assert!(!mute.toggle(&registry).unwrap());
        assert!(!mute.is_muted(&registry).unwrap());
        assert!((registry.backend().master_volume(1).unwrap() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn volume_fallback_round_trips_the_recorded_level() {
        let backend = MockBackend::new();
        backend.add_input_device(1, "A", "Mic A", 1);
        backend.set_master_volume(1, 0.42, true);
        backend.set_default(1);

        let registry = registry_with(backend);
        let mut mute = MuteController::new();

        assert!(mute.toggle(&registry).unwrap());
        assert!(mute.is_muted(&registry).unwrap());
        assert!(registry.backend().master_volume(1).unwrap() <= MUTE_EPSILON);

        assert!(!mute.toggle(&registry).unwrap());
        assert!((registry.backend().master_volume(1).unwrap() - 0.42).abs() < 1e-6);
    }

    #[test]
    fn first_unmute_without_recorded_level_restores_default() {
        let backend = MockBackend::new();
        backend.add_input_device(1, "A", "Mic A", 1);
        backend.set_master_volume(1, 0.0, true);
        backend.set_default(1);

        let registry = registry_with(backend);
        let mut mute = MuteController::new();

        assert!(mute.is_muted(&registry).unwrap());
        assert!(!mute.toggle(&registry).unwrap());
        assert!((registry.backend().master_volume(1).unwrap() - RESTORE_DEFAULT).abs() < 1e-6);
    }

    #[test]
    fn restore_is_clamped_to_the_floor() {
        let backend = MockBackend::new();
        backend.add_input_device(1, "A", "Mic A", 1);
        backend.set_master_volume(1, 0.001, true);
        backend.set_default(1);

        let registry = registry_with(backend);
        let mut mute = MuteController::new();

        // 0.001 is above MUTE_EPSILON, so this records it and mutes.
        assert!(mute.toggle(&registry).unwrap());
        // Restoring 0.001 would leave the mic inaudible; the floor applies.
        assert!(!mute.toggle(&registry).unwrap());
        assert!((registry.backend().master_volume(1).unwrap() - RESTORE_FLOOR).abs() < 1e-6);
    }

    #[test]
    fn pre_mute_levels_are_tracked_per_device() {
        let backend = MockBackend::new();
        backend.add_input_device(1, "A", "Mic A", 1);
        backend.add_input_device(2, "B", "Mic B", 1);
        backend.set_master_volume(1, 0.3, true);
        backend.set_master_volume(2, 0.8, true);
        backend.set_default(1);

        let registry = registry_with(backend);
        let mut mute = MuteController::new();

        mute.toggle(&registry).unwrap();

        // Default device hot-swaps between calls; the controller follows it.
        registry.backend().set_default(2);
        mute.toggle(&registry).unwrap();
        registry.backend().set_default(1);
        mute.toggle(&registry).unwrap();
        registry.backend().set_default(2);
        mute.toggle(&registry).unwrap();

        assert!((registry.backend().master_volume(1).unwrap() - 0.3).abs() < 1e-6);
        assert!((registry.backend().master_volume(2).unwrap() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn unsupported_device_fails_every_operation() {
        let backend = MockBackend::new();
        backend.add_input_device(1, "A", "Mic A", 1);
        backend.set_default(1);

        let registry = registry_with(backend);
        let mut mute = MuteController::new();

        assert!(matches!(
            mute.is_muted(&registry),
            Err(AudioError::Unsupported)
        ));
        assert!(matches!(mute.toggle(&registry), Err(AudioError::Unsupported)));
    }

    #[test]
    fn no_default_device_propagates() {
        let backend = MockBackend::new();
        backend.add_input_device(1, "A", "Mic A", 1);

        let registry = registry_with(backend);
        let mut mute = MuteController::new();

        assert!(matches!(
            mute.toggle(&registry),
            Err(AudioError::NoDefaultDevice)
        ));
    }
}
