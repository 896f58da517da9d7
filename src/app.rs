//! Application facade.
//!
//! Wires the device registry, mute policy, and shortcut persistence into
//! the surface the UI layer calls. Owns no UI and no event loop; the host
//! binary routes OS events (hotkeys, timers) into the subsystems.

use std::time::Duration;

use tracing::{debug, warn};

use crate::audio::{
    AudioBackend, AudioError, DeviceId, DeviceRegistry, InputDevice, MuteController, VolumeInfo,
};
use crate::hotkeys::{Shortcut, ShortcutStore};
use crate::platform::prefs::{self, PreferenceStore};

/// Delay between the last volume-slider write and the device list refresh.
///
/// Rebuilding the device menu mid-drag replaces the slider under the
/// user's pointer, so the refresh waits for the drag to settle.
pub const DEVICE_REFRESH_DEBOUNCE: Duration = Duration::from_millis(150);

/// Facade over the core subsystems.
pub struct App<B: AudioBackend, P: PreferenceStore> {
    registry: DeviceRegistry<B>,
    mute: MuteController,
    prefs: P,
    shortcuts: Vec<Shortcut>,
    refresh_generation: u64,
}

impl<B: AudioBackend, P: PreferenceStore> App<B, P> {
    /// Build the facade: bootstrap the shortcut list and re-apply the
    /// persisted input device if it is still present.
    pub fn new(backend: B, prefs: P) -> Self {
        let registry = DeviceRegistry::new(backend);
        let shortcuts = ShortcutStore::bootstrap_if_missing(&prefs);

        let mut app = Self {
            registry,
            mute: MuteController::new(),
            prefs,
            shortcuts,
            refresh_generation: 0,
        };
        app.apply_saved_input_device();
        app
    }

    fn apply_saved_input_device(&mut self) {
        let Some(uid) = prefs::selected_input_uid(&self.prefs) else {
            return;
        };
        let Some(id) = self.registry.find_device_by_uid(&uid) else {
            debug!(%uid, "saved input device not present, ignoring");
            return;
        };
        if let Err(e) = self.registry.set_default_input_device(id) {
            warn!(error = %e, "failed to apply saved input device");
        }
    }

    pub fn registry(&self) -> &DeviceRegistry<B> {
        &self.registry
    }

    pub fn list_input_devices(&self) -> Vec<InputDevice> {
        self.registry.list_input_devices()
    }

    pub fn default_input_device_id(&self) -> Result<DeviceId, AudioError> {
        self.registry.default_input_device()
    }

    /// Durable UID of the current default input device, if any.
    pub fn default_input_device_uid(&self) -> Option<String> {
        let id = self.registry.default_input_device().ok()?;
        self.registry
            .list_input_devices()
            .into_iter()
            .find(|d| d.id == id)
            .map(|d| d.uid)
    }

    /// Make the device with this UID the OS-wide default input and persist
    /// the choice. Returns false (and does nothing) when no such device is
    /// currently present.
    pub fn set_default_input_device(&mut self, uid: &str) -> Result<bool, AudioError> {
        let Some(id) = self.registry.find_device_by_uid(uid) else {
            return Ok(false);
        };
        self.registry.set_default_input_device(id)?;
        if let Err(e) = prefs::set_selected_input_uid(&self.prefs, uid) {
            warn!(error = %e, "failed to persist input device preference");
        }
        Ok(true)
    }

    pub fn volume_info(&self, id: DeviceId) -> Option<VolumeInfo> {
        self.registry.volume_info(id)
    }

    pub fn set_volume(&self, id: DeviceId, level: f32) -> Result<(), AudioError> {
        self.registry.set_volume(id, level)
    }

    /// Volume write driven by a slider drag.
    ///
    /// Every write supersedes any pending device-list refresh; the final
    /// write returns a debounce token the host should schedule for
    /// [`DEVICE_REFRESH_DEBOUNCE`] and then check with [`Self::refresh_due`].
    pub fn set_volume_from_slider(
        &mut self,
        id: DeviceId,
        level: f32,
        is_final: bool,
    ) -> Result<Option<u64>, AudioError> {
        self.registry.set_volume(id, level)?;
        self.refresh_generation = self.refresh_generation.wrapping_add(1);
        if is_final {
            Ok(Some(self.refresh_generation))
        } else {
            Ok(None)
        }
    }

    /// Whether a debounced refresh token is still current.
    pub fn refresh_due(&self, token: u64) -> bool {
        token == self.refresh_generation
    }

    /// Best-effort mute state of the current default input device.
    pub fn is_muted(&self) -> bool {
        match self.mute.is_muted(&self.registry) {
            Ok(muted) => muted,
            Err(e) => {
                debug!(error = %e, "mute state unavailable");
                false
            }
        }
    }

    /// Toggle the default input device, returning the new best-effort
    /// state. A failed toggle is logged and leaves the device untouched;
    /// the returned state is a fresh read either way.
    pub fn toggle_mute(&mut self) -> bool {
        match self.mute.toggle(&self.registry) {
            Ok(muted) => muted,
            Err(e) => {
                warn!(error = %e, "toggle mute failed");
                self.is_muted()
            }
        }
    }

    pub fn shortcuts(&self) -> &[Shortcut] {
        &self.shortcuts
    }

    /// Append a shortcut and return the updated list for re-registration.
    pub fn add_shortcut(&mut self, key_code: u32, modifiers: u32) -> &[Shortcut] {
        self.shortcuts = ShortcutStore::add(&self.prefs, key_code, modifiers);
        &self.shortcuts
    }

    /// Remove a shortcut by id and return the updated list for
    /// re-registration.
    pub fn remove_shortcut(&mut self, id: &str) -> &[Shortcut] {
        self.shortcuts = ShortcutStore::remove(&self.prefs, id);
        &self.shortcuts
    }
}
