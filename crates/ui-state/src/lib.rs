//! Modal-dialog state for the UI runtime.
//!
//! One store holds every dialog flag as an observable map from flag name to
//! [`FlagState`]. Flags are mutually independent: no combination is forbidden
//! and no flag reads another. The store is process-local UI state with a
//! single logical writer (the UI event loop); `Send + Sync` bounds exist so
//! the registry can sit behind an `Arc` like any other shared handle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use dashmap::DashMap;

/// Names of every dialog flag the UI knows about.
pub mod flags {
    pub const MODAL: &str = "modal";
    pub const TRANSACTION_MODAL: &str = "transaction_modal";
    pub const INSERTION_MODAL: &str = "insertion_modal";
    pub const EJECTION_MODAL: &str = "ejection_modal";
    pub const SYSTEM_COLUMN_MODAL: &str = "system_column_modal";
    pub const TRANSACTION_SYSTEM_COLUMN_MODAL: &str = "transaction_system_column_modal";
    pub const ASSET_CLASS_MODAL: &str = "asset_class_modal";
    pub const ADD_USERS_MODAL: &str = "add_users_modal";
    pub const DATA_FORMAT_MODAL: &str = "data_format_modal";
    pub const NUMBER_FORMAT_MODAL: &str = "number_format_modal";
    pub const CURRENCY_FORMAT_MODAL: &str = "currency_format_modal";
    pub const GENERATE_FORMULA_MODAL: &str = "generate_formula_modal";
    pub const ADDITIONAL_RULE_MODAL: &str = "additional_rule_modal";
    pub const RBI_RULES_MODAL: &str = "rbi_rules_modal";
    pub const RULE_MODAL: &str = "rule_modal";
    pub const CUSTOM_RULE_MODAL: &str = "custom_rule_modal";
    pub const PREVIEW_MODAL: &str = "preview_modal";
    pub const DELETE_MODAL: &str = "delete_modal";
    pub const SIDE_BAR: &str = "side_bar";
    pub const BREAK_DOWN_BAR: &str = "break_down_bar";
    pub const BREAKDOWN_TRANSACTION_ID: &str = "breakdown_transaction_id";

    pub const ALL: &[&str] = &[
        MODAL,
        TRANSACTION_MODAL,
        INSERTION_MODAL,
        EJECTION_MODAL,
        SYSTEM_COLUMN_MODAL,
        TRANSACTION_SYSTEM_COLUMN_MODAL,
        ASSET_CLASS_MODAL,
        ADD_USERS_MODAL,
        DATA_FORMAT_MODAL,
        NUMBER_FORMAT_MODAL,
        CURRENCY_FORMAT_MODAL,
        GENERATE_FORMULA_MODAL,
        ADDITIONAL_RULE_MODAL,
        RBI_RULES_MODAL,
        RULE_MODAL,
        CUSTOM_RULE_MODAL,
        PREVIEW_MODAL,
        DELETE_MODAL,
        SIDE_BAR,
        BREAK_DOWN_BAR,
        BREAKDOWN_TRANSACTION_ID,
    ];
}

/// State of one dialog flag. Most flags only ever use `open`; the custom-rule
/// dialog also tracks `is_new_version`, and the breakdown bar tracks the
/// selected `transaction_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagState {
    pub open: bool,
    pub is_new_version: bool,
    pub transaction_id: Option<i64>,
}

impl FlagState {
    pub fn opened() -> Self {
        Self { open: true, ..Self::default() }
    }
}

type Listener = Box<dyn Fn(&str, &FlagState) + Send + Sync>;
type ConfirmDelete = Box<dyn FnOnce(usize) + Send>;

/// Handle returned by [`ModalRegistry::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

pub struct ModalRegistry {
    states: DashMap<String, FlagState>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_subscription: AtomicU64,
    on_confirm_delete: Mutex<Option<ConfirmDelete>>,
}

impl Default for ModalRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModalRegistry {
    /// Build the registry with every known flag closed, except the sidebar
    /// and breakdown bar which start visible.
    pub fn new() -> Self {
        let states = DashMap::new();
        for name in flags::ALL {
            states.insert((*name).to_string(), FlagState::default());
        }
        states.insert(flags::SIDE_BAR.to_string(), FlagState::opened());
        states.insert(flags::BREAK_DOWN_BAR.to_string(), FlagState::opened());
        Self {
            states,
            listeners: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
            on_confirm_delete: Mutex::new(None),
        }
    }

    /// Current state of a flag; unknown names read as closed.
    pub fn get(&self, name: &str) -> FlagState {
        self.states.get(name).map(|s| s.clone()).unwrap_or_default()
    }

    pub fn set(&self, name: &str, state: FlagState) {
        self.states.insert(name.to_string(), state.clone());
        self.notify(name, &state);
    }

    pub fn open(&self, name: &str) {
        self.set_open(name, true);
    }

    pub fn close(&self, name: &str) {
        self.set_open(name, false);
    }

    pub fn toggle(&self, name: &str) {
        let mut state = self.get(name);
        state.open = !state.open;
        self.set(name, state);
    }

    fn set_open(&self, name: &str, open: bool) {
        let mut state = self.get(name);
        state.open = open;
        self.set(name, state);
    }

    /// Record which transaction the breakdown bar should describe.
    pub fn set_transaction_id(&self, id: Option<i64>) {
        let mut state = self.get(flags::BREAKDOWN_TRANSACTION_ID);
        state.transaction_id = id;
        self.set(flags::BREAKDOWN_TRANSACTION_ID, state);
    }

    /// Observe every mutation. Listeners receive the flag name and its new
    /// state. Listeners run under the registry's listener lock and must not
    /// mutate the registry from inside the callback.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&str, &FlagState) + Send + Sync + 'static,
    {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .expect("listener lock poisoned")
            .push((id, Box::new(listener)));
        SubscriptionId(id)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners
            .lock()
            .expect("listener lock poisoned")
            .retain(|(lid, _)| *lid != id.0);
    }

    /// Arm the delete-confirmation dialog with the action to run when the
    /// user confirms. Replaces any previously registered action.
    pub fn set_on_confirm_delete<F>(&self, action: F)
    where
        F: FnOnce(usize) + Send + 'static,
    {
        *self.on_confirm_delete.lock().expect("confirm lock poisoned") = Some(Box::new(action));
    }

    /// Run the registered confirm action exactly once, clear it, and close
    /// the dialog. Returns false when no action was armed.
    pub fn confirm_delete(&self, index: usize) -> bool {
        let action = self.on_confirm_delete.lock().expect("confirm lock poisoned").take();
        self.close(flags::DELETE_MODAL);
        match action {
            Some(action) => {
                action(index);
                true
            }
            None => false,
        }
    }

    fn notify(&self, name: &str, state: &FlagState) {
        let listeners = self.listeners.lock().expect("listener lock poisoned");
        for (_, listener) in listeners.iter() {
            listener(name, state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn flags_start_closed_except_bars() {
        let reg = ModalRegistry::new();
        assert!(!reg.get(flags::DELETE_MODAL).open);
        assert!(!reg.get(flags::CUSTOM_RULE_MODAL).open);
        assert!(reg.get(flags::SIDE_BAR).open);
        assert!(reg.get(flags::BREAK_DOWN_BAR).open);
    }

    #[test]
    fn toggle_flips_and_flags_stay_independent() {
        let reg = ModalRegistry::new();
        reg.toggle(flags::RULE_MODAL);
        assert!(reg.get(flags::RULE_MODAL).open);
        // No other flag moves.
        for name in flags::ALL {
            if *name == flags::RULE_MODAL || *name == flags::SIDE_BAR || *name == flags::BREAK_DOWN_BAR {
                continue;
            }
            assert!(!reg.get(name).open, "{name} should still be closed");
        }
        reg.toggle(flags::RULE_MODAL);
        assert!(!reg.get(flags::RULE_MODAL).open);
    }

    #[test]
    fn custom_rule_modal_carries_new_version() {
        let reg = ModalRegistry::new();
        reg.set(
            flags::CUSTOM_RULE_MODAL,
            FlagState { open: true, is_new_version: true, transaction_id: None },
        );
        let state = reg.get(flags::CUSTOM_RULE_MODAL);
        assert!(state.open);
        assert!(state.is_new_version);
    }

    #[test]
    fn subscribers_observe_mutations_until_unsubscribed() {
        let reg = ModalRegistry::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let sub = reg.subscribe(move |name, state| {
            if name == flags::PREVIEW_MODAL && state.open {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        reg.open(flags::PREVIEW_MODAL);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        reg.unsubscribe(sub);
        reg.close(flags::PREVIEW_MODAL);
        reg.open(flags::PREVIEW_MODAL);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn confirm_delete_runs_once_and_clears() {
        let reg = ModalRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        reg.set_on_confirm_delete(move |index| {
            assert_eq!(index, 3);
            counter.fetch_add(1, Ordering::SeqCst);
        });
        reg.open(flags::DELETE_MODAL);
        assert!(reg.confirm_delete(3));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!reg.get(flags::DELETE_MODAL).open);
        // Second confirmation finds nothing armed.
        assert!(!reg.confirm_delete(3));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn breakdown_transaction_id_round_trips() {
        let reg = ModalRegistry::new();
        assert_eq!(reg.get(flags::BREAKDOWN_TRANSACTION_ID).transaction_id, None);
        reg.set_transaction_id(Some(42));
        assert_eq!(reg.get(flags::BREAKDOWN_TRANSACTION_ID).transaction_id, Some(42));
        reg.set_transaction_id(None);
        assert_eq!(reg.get(flags::BREAKDOWN_TRANSACTION_ID).transaction_id, None);
    }
}
