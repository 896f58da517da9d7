//! mic-mute-rs - Library
//!
//! A system-wide microphone mute utility.
//!
//! ## Features
//!
//! - Toggle the default input device from global hotkeys or the UI
//! - Native mute switch with a volume-zeroing fallback for devices
//!   without one, restoring the pre-mute level on unmute
//! - Per-element volume control (master or per-channel hardware)
//! - Transient on-screen indicator with glitch-free rapid toggling
//! - Persisted shortcut list and input device selection

pub mod app;
pub mod audio;
pub mod hotkeys;
pub mod indicator;
pub mod platform;

pub use app::{App, DEVICE_REFRESH_DEBOUNCE};
pub use audio::{
    AudioBackend, AudioError, DeviceId, DeviceRegistry, InputDevice, MuteController, VolumeInfo,
};
pub use hotkeys::{HotkeyBackend, HotkeyError, HotkeyManager, Shortcut, ShortcutStore};
pub use indicator::{IndicatorController, IndicatorPhase, IndicatorStatus, IndicatorTimer};
pub use platform::{MemoryPreferences, PreferenceStore, PreferencesError};
