//! Platform utilities: preference storage.

pub mod prefs;

#[cfg(windows)]
pub mod registry_prefs;

pub use prefs::{MemoryPreferences, PreferenceStore, PreferencesError};

#[cfg(windows)]
pub use registry_prefs::RegistryPreferences;
