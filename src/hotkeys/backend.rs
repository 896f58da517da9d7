//! Platform seam for global hotkey registration.

use super::HotkeyError;

/// OS hotkey facility, implemented per platform.
///
/// The facility is process-wide; exactly one [`HotkeyManager`] instance
/// should own a backend. Fired hotkeys travel the other way: the host event
/// loop receives them from the OS and feeds them into
/// [`HotkeyManager::dispatch`].
///
/// [`HotkeyManager`]: super::HotkeyManager
/// [`HotkeyManager::dispatch`]: super::HotkeyManager::dispatch
pub trait HotkeyBackend {
    /// Install the OS-level event callback. Called at most once per
    /// manager; the manager guarantees idempotence.
    fn install(&mut self) -> Result<(), HotkeyError>;

    /// Release the installed callback. Must tolerate being called without
    /// a prior successful `install`.
    fn uninstall(&mut self);

    /// Register one key/modifier combination under a registration id.
    ///
    /// Fails when the OS refuses the combination, e.g. another process
    /// already claimed it.
    fn register(&mut self, registration_id: u32, key_code: u32, modifiers: u32)
        -> Result<(), HotkeyError>;

    /// Release one registration. Unknown ids are a no-op.
    fn unregister(&mut self, registration_id: u32);
}
