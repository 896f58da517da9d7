//! User preference storage.
//!
//! [`PreferenceStore`] is a flat key-value seam; the Windows build backs it
//! with the registry, other builds and tests use [`MemoryPreferences`].
//! Typed accessors for the handful of known keys live here too, so key
//! names and defaults have one home.

use std::cell::RefCell;
use std::collections::HashMap;

use thiserror::Error;

/// Preferences service error types.
#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("failed to access preference storage: {0}")]
    StorageAccess(String),

    #[error("failed to write preference: {key}")]
    WriteFailed { key: String },
}

/// Flat key-value preference storage.
///
/// Reads return `None` for missing or unreadable values; decode problems
/// never propagate as errors. Writes can fail when the backing store does.
pub trait PreferenceStore {
    fn get_string(&self, key: &str) -> Option<String>;
    fn set_string(&self, key: &str, value: &str) -> Result<(), PreferencesError>;

    fn get_bool(&self, key: &str) -> Option<bool>;
    fn set_bool(&self, key: &str, value: bool) -> Result<(), PreferencesError>;

    fn get_f32(&self, key: &str) -> Option<f32>;
    fn set_f32(&self, key: &str, value: f32) -> Result<(), PreferencesError>;

    fn remove(&self, key: &str) -> Result<(), PreferencesError>;
}

/// Preference key names. Versioned so a future format change can migrate
/// by key instead of in place.
pub mod keys {
    /// Durable UID of the user-selected input device
    pub const INPUT_UID: &str = "microphone.input.uid.v1";

    /// Serialized shortcut list (JSON, one key)
    pub const SHORTCUTS: &str = "shortcuts.list.v1";

    /// Toggle feedback sounds on/off
    pub const SOUNDS_ENABLED: &str = "sounds.enabled.v1";

    /// Feedback sound volume
    pub const SOUND_VOLUME: &str = "sounds.volume.v1";

    /// UI language override
    pub const LANGUAGE_CODE: &str = "language.code.v1";
}

/// Default feedback sound volume.
pub const SOUND_VOLUME_DEFAULT: f32 = 0.6;

pub fn selected_input_uid<P: PreferenceStore>(store: &P) -> Option<String> {
    store.get_string(keys::INPUT_UID)
}

pub fn set_selected_input_uid<P: PreferenceStore>(
    store: &P,
    uid: &str,
) -> Result<(), PreferencesError> {
    store.set_string(keys::INPUT_UID, uid)
}

/// Feedback sounds are on unless the user turned them off.
pub fn sounds_enabled<P: PreferenceStore>(store: &P) -> bool {
    store.get_bool(keys::SOUNDS_ENABLED).unwrap_or(true)
}

pub fn set_sounds_enabled<P: PreferenceStore>(
    store: &P,
    enabled: bool,
) -> Result<(), PreferencesError> {
    store.set_bool(keys::SOUNDS_ENABLED, enabled)
}

pub fn sound_volume<P: PreferenceStore>(store: &P) -> f32 {
    store
        .get_f32(keys::SOUND_VOLUME)
        .unwrap_or(SOUND_VOLUME_DEFAULT)
}

pub fn set_sound_volume<P: PreferenceStore>(
    store: &P,
    volume: f32,
) -> Result<(), PreferencesError> {
    store.set_f32(keys::SOUND_VOLUME, volume.clamp(0.0, 1.0))
}

pub fn language_code<P: PreferenceStore>(store: &P) -> Option<String> {
    store.get_string(keys::LANGUAGE_CODE)
}

pub fn set_language_code<P: PreferenceStore>(
    store: &P,
    code: &str,
) -> Result<(), PreferencesError> {
    store.set_string(keys::LANGUAGE_CODE, code)
}

#[derive(Debug, Clone)]
enum PrefValue {
    Str(String),
    Bool(bool),
    F32(f32),
}

/// In-process preference store.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: RefCell<HashMap<String, PrefValue>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get_string(&self, key: &str) -> Option<String> {
        match self.values.borrow().get(key) {
            Some(PrefValue::Str(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn set_string(&self, key: &str, value: &str) -> Result<(), PreferencesError> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), PrefValue::Str(value.to_string()));
        Ok(())
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.values.borrow().get(key) {
            Some(PrefValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<(), PreferencesError> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), PrefValue::Bool(value));
        Ok(())
    }

    fn get_f32(&self, key: &str) -> Option<f32> {
        match self.values.borrow().get(key) {
            Some(PrefValue::F32(v)) => Some(*v),
            _ => None,
        }
    }

    fn set_f32(&self, key: &str, value: f32) -> Result<(), PreferencesError> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), PrefValue::F32(value));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PreferencesError> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sound_defaults_apply_until_written() {
        let store = MemoryPreferences::new();
        assert!(sounds_enabled(&store));
        assert!((sound_volume(&store) - SOUND_VOLUME_DEFAULT).abs() < 1e-6);

        set_sounds_enabled(&store, false).unwrap();
        set_sound_volume(&store, 1.5).unwrap();

        assert!(!sounds_enabled(&store));
        assert!((sound_volume(&store) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn input_uid_round_trips() {
        let store = MemoryPreferences::new();
        assert_eq!(selected_input_uid(&store), None);
        set_selected_input_uid(&store, "uid-a").unwrap();
        assert_eq!(selected_input_uid(&store).as_deref(), Some("uid-a"));
    }
}
