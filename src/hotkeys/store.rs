//! Shortcut list persistence.
//!
//! The whole ordered list lives under one preference key as JSON. A
//! missing or undecodable value degrades to an empty list (logged, never
//! propagated); first run seeds one default shortcut.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;

use crate::platform::prefs::{keys, PreferenceStore};

use super::{Shortcut, DEFAULT_KEY_CODE, DEFAULT_MODIFIERS};

/// Persistence for the user's shortcut list.
pub struct ShortcutStore;

impl ShortcutStore {
    /// Load the persisted list. Missing or corrupt data yields an empty
    /// list.
    pub fn load<P: PreferenceStore>(store: &P) -> Vec<Shortcut> {
        let Some(raw) = store.get_string(keys::SHORTCUTS) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "failed to decode stored shortcuts, starting empty");
                Vec::new()
            }
        }
    }

    /// Persist the list. Failures are logged; the in-memory list stays
    /// authoritative for the session.
    pub fn save<P: PreferenceStore>(store: &P, shortcuts: &[Shortcut]) {
        let raw = match serde_json::to_string(shortcuts) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "failed to encode shortcuts");
                return;
            }
        };
        if let Err(e) = store.set_string(keys::SHORTCUTS, &raw) {
            warn!(error = %e, "failed to persist shortcuts");
        }
    }

    /// Seed one default shortcut on first run, then return the list.
    pub fn bootstrap_if_missing<P: PreferenceStore>(store: &P) -> Vec<Shortcut> {
        if store.get_string(keys::SHORTCUTS).is_none() {
            let initial = vec![Shortcut {
                id: Self::new_shortcut_id(1),
                registration_id: 1,
                key_code: DEFAULT_KEY_CODE,
                modifiers: DEFAULT_MODIFIERS,
            }];
            Self::save(store, &initial);
        }
        Self::load(store)
    }

    /// Append a shortcut with a freshly allocated registration id and
    /// return the updated list.
    pub fn add<P: PreferenceStore>(store: &P, key_code: u32, modifiers: u32) -> Vec<Shortcut> {
        let mut list = Self::load(store);
        let registration_id = Self::next_registration_id(&list);
        list.push(Shortcut {
            id: Self::new_shortcut_id(registration_id),
            registration_id,
            key_code,
            modifiers,
        });
        Self::save(store, &list);
        list
    }

    /// Remove a shortcut by its opaque id and return the updated list.
    pub fn remove<P: PreferenceStore>(store: &P, id: &str) -> Vec<Shortcut> {
        let mut list = Self::load(store);
        list.retain(|s| s.id != id);
        Self::save(store, &list);
        list
    }

    /// Allocate the next registration id: one past the current maximum,
    /// skipping 0 (reserved) and any id still in use.
    fn next_registration_id(existing: &[Shortcut]) -> u32 {
        let used: Vec<u32> = existing.iter().map(|s| s.registration_id).collect();
        let mut candidate = used.iter().copied().max().unwrap_or(0).wrapping_add(1);
        if candidate == 0 {
            candidate = 1;
        }
        while used.contains(&candidate) {
            candidate = candidate.wrapping_add(1);
            if candidate == 0 {
                candidate = 1;
            }
        }
        candidate
    }

    fn new_shortcut_id(registration_id: u32) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        format!("shortcut-{registration_id}-{nanos}")
    }
}
