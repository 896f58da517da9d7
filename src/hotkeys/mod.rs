//! Global hotkey registration and dispatch.
//!
//! One manager coordinates every registration against the OS hotkey
//! facility (a single shared resource per process). Registration is
//! transactional in intent: `register` replaces the entire active set,
//! aborting on the first failure, which leaves a documented
//! "possibly partial" state the caller must treat as inconsistent until a
//! retry succeeds.

pub mod backend;
pub mod store;

#[cfg(windows)]
pub mod windows;

use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use backend::HotkeyBackend;
pub use store::ShortcutStore;

/// Private signature namespace for this manager's registrations.
///
/// Dispatch drops events carrying any other signature, so hotkey events
/// meant for another component sharing the OS facility are never routed to
/// our handlers.
pub const SIGNATURE: u32 = u32::from_be_bytes(*b"MMRS");

/// Default shortcut key code, seeded on first run (virtual key `M`).
pub const DEFAULT_KEY_CODE: u32 = 0x4D;

/// Default shortcut modifiers, seeded on first run (Ctrl+Shift).
pub const DEFAULT_MODIFIERS: u32 = 0x0002 | 0x0004;

/// One global keyboard shortcut.
///
/// `registration_id` is caller-allocated (see [`ShortcutStore`]), nonzero,
/// and unique among active registrations; the manager trusts it as
/// already-unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcut {
    /// Opaque identity for list management (add/remove from the UI)
    pub id: String,

    /// Small integer identifying the active registration
    pub registration_id: u32,

    /// Platform virtual key code
    pub key_code: u32,

    /// Modifier bitmask
    pub modifiers: u32,
}

/// Hotkey subsystem error types.
#[derive(Debug, Error)]
pub enum HotkeyError {
    /// The OS refused a key/modifier combination.
    #[error("hotkey registration refused (key {key_code:#x}, modifiers {modifiers:#x}, status {status})")]
    Registration {
        key_code: u32,
        modifiers: u32,
        status: i32,
    },

    /// Installing the OS event callback failed.
    #[error("hotkey callback install failed with status {status}")]
    CallbackInstall { status: i32 },
}

type Handler = Rc<dyn Fn()>;

/// Process-wide hotkey registry.
///
/// Owns the backend and the registration-id-to-handler table, which is the
/// single source of truth for active hotkeys.
pub struct HotkeyManager<B: HotkeyBackend> {
    backend: B,
    installed: bool,
    handlers: HashMap<u32, Handler>,
    // Preserves registration order for teardown.
    active: Vec<u32>,
}

impl<B: HotkeyBackend> HotkeyManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            installed: false,
            handlers: HashMap::new(),
            active: Vec::new(),
        }
    }

    /// Replace the entire active registration set.
    ///
    /// Installs the OS callback on first use, unregisters every previously
    /// active hotkey, then registers each shortcut in order, binding its
    /// `registration_id` to `handler`. Aborts on the first registration
    /// failure: the shortcuts registered before the failing one stay
    /// active, so callers must treat the set as inconsistent until a retry
    /// succeeds.
    pub fn register<F>(&mut self, shortcuts: &[Shortcut], handler: F) -> Result<(), HotkeyError>
    where
        F: Fn() + 'static,
    {
        self.install_if_needed()?;
        self.unregister_all();

        let handler: Handler = Rc::new(handler);
        for s in shortcuts {
            self.backend
                .register(s.registration_id, s.key_code, s.modifiers)?;
            self.handlers.insert(s.registration_id, Rc::clone(&handler));
            self.active.push(s.registration_id);
        }
        debug!(count = shortcuts.len(), "hotkeys registered");
        Ok(())
    }

    /// Release every active registration. Idempotent.
    pub fn unregister_all(&mut self) {
        for id in self.active.drain(..) {
            self.backend.unregister(id);
        }
        self.handlers.clear();
    }

    /// Number of currently active registrations.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Route one fired hotkey event from the host event loop.
    ///
    /// Events from a foreign signature namespace are ignored; otherwise the
    /// stored handler runs synchronously on the caller's thread.
    pub fn dispatch(&self, signature: u32, registration_id: u32) {
        if signature != SIGNATURE {
            return;
        }
        if let Some(handler) = self.handlers.get(&registration_id) {
            handler();
        }
    }

    fn install_if_needed(&mut self) -> Result<(), HotkeyError> {
        if self.installed {
            return Ok(());
        }
        self.backend.install()?;
        self.installed = true;
        Ok(())
    }
}

impl<B: HotkeyBackend> Drop for HotkeyManager<B> {
    fn drop(&mut self) {
        self.unregister_all();
        if self.installed {
            self.backend.uninstall();
            self.installed = false;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests_support {
    //! Recording fake for the OS hotkey facility, shared across hotkey and
    //! store tests.

    use super::{HotkeyBackend, HotkeyError};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    pub struct FakeState {
        pub installs: u32,
        pub uninstalls: u32,
        pub registered: Vec<u32>,
        pub refuse: Vec<u32>,
    }

    #[derive(Clone, Default)]
    pub struct FakeBackend {
        pub state: Rc<RefCell<FakeState>>,
    }

    impl HotkeyBackend for FakeBackend {
        fn install(&mut self) -> Result<(), HotkeyError> {
            self.state.borrow_mut().installs += 1;
            Ok(())
        }

        fn uninstall(&mut self) {
            self.state.borrow_mut().uninstalls += 1;
        }

        fn register(
            &mut self,
            registration_id: u32,
            key_code: u32,
            modifiers: u32,
        ) -> Result<(), HotkeyError> {
            let mut state = self.state.borrow_mut();
            if state.refuse.contains(&registration_id) {
                return Err(HotkeyError::Registration {
                    key_code,
                    modifiers,
                    status: -1,
                });
            }
            state.registered.push(registration_id);
            Ok(())
        }

        fn unregister(&mut self, registration_id: u32) {
            self.state
                .borrow_mut()
                .registered
                .retain(|&id| id != registration_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::tests_support::FakeBackend;
    use super::*;
    use std::cell::RefCell;

    fn shortcut(registration_id: u32) -> Shortcut {
        Shortcut {
            id: format!("s{registration_id}"),
            registration_id,
            key_code: DEFAULT_KEY_CODE,
            modifiers: DEFAULT_MODIFIERS,
        }
    }

    #[test]
    fn register_replaces_the_whole_set() {
        let backend = FakeBackend::default();
        let state = Rc::clone(&backend.state);
        let mut manager = HotkeyManager::new(backend);

        manager.register(&[shortcut(1), shortcut(2)], || {}).unwrap();
        assert_eq!(state.borrow().registered, vec![1, 2]);

        manager.register(&[shortcut(3)], || {}).unwrap();
        assert_eq!(state.borrow().registered, vec![3]);
        assert_eq!(manager.active_count(), 1);
    }

    #[test]
    fn register_empty_leaves_no_active_hotkeys() {
        let backend = FakeBackend::default();
        let state = Rc::clone(&backend.state);
        let mut manager = HotkeyManager::new(backend);

        manager.register(&[shortcut(1)], || {}).unwrap();
        manager.register(&[], || {}).unwrap();
        assert!(state.borrow().registered.is_empty());

        manager.register(&[shortcut(1), shortcut(2)], || {}).unwrap();
        assert_eq!(state.borrow().registered, vec![1, 2]);
    }

    #[test]
    fn callback_installs_exactly_once() {
        let backend = FakeBackend::default();
        let state = Rc::clone(&backend.state);
        let mut manager = HotkeyManager::new(backend);

        manager.register(&[shortcut(1)], || {}).unwrap();
        manager.register(&[shortcut(2)], || {}).unwrap();
        assert_eq!(state.borrow().installs, 1);
    }

    #[test]
    fn failed_registration_aborts_and_leaves_partial_set() {
        let backend = FakeBackend::default();
        let state = Rc::clone(&backend.state);
        state.borrow_mut().refuse.push(2);
        let mut manager = HotkeyManager::new(backend);

        let result = manager.register(&[shortcut(1), shortcut(2), shortcut(3)], || {});
        assert!(matches!(result, Err(HotkeyError::Registration { .. })));

        // Documented "possibly partial": everything before the failure is
        // active, nothing after it.
        assert_eq!(state.borrow().registered, vec![1]);

        // Retry with a reduced set recovers.
        manager.register(&[shortcut(1), shortcut(3)], || {}).unwrap();
        assert_eq!(state.borrow().registered, vec![1, 3]);
    }

    #[test]
    fn dispatch_fires_the_bound_handler_once() {
        let backend = FakeBackend::default();
        let mut manager = HotkeyManager::new(backend);
        let fired = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&fired);
        manager
            .register(&[shortcut(1), shortcut(2)], move || {
                sink.borrow_mut().push(());
            })
            .unwrap();

        manager.dispatch(SIGNATURE, 1);
        assert_eq!(fired.borrow().len(), 1);
        manager.dispatch(SIGNATURE, 2);
        assert_eq!(fired.borrow().len(), 2);
    }

    #[test]
    fn dispatch_ignores_foreign_signatures_and_unknown_ids() {
        let backend = FakeBackend::default();
        let mut manager = HotkeyManager::new(backend);
        let fired = Rc::new(RefCell::new(0u32));

        let sink = Rc::clone(&fired);
        manager
            .register(&[shortcut(1)], move || *sink.borrow_mut() += 1)
            .unwrap();

        manager.dispatch(SIGNATURE ^ 1, 1);
        manager.dispatch(SIGNATURE, 99);
        assert_eq!(*fired.borrow(), 0);
    }

    #[test]
    fn drop_tears_down_once() {
        let backend = FakeBackend::default();
        let state = Rc::clone(&backend.state);
        {
            let mut manager = HotkeyManager::new(backend);
            manager.register(&[shortcut(1)], || {}).unwrap();
        }
        let state = state.borrow();
        assert!(state.registered.is_empty());
        assert_eq!(state.uninstalls, 1);
    }
}
