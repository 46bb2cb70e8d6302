//! The snapshot store.
//!
//! Holds one authoritative `AppState` snapshot. `dispatch` applies the
//! pure reducer, replaces the snapshot, then synchronously notifies every
//! subscriber with the new snapshot. No coalescing, no partial
//! application, no action ever dropped. Snapshots are totally ordered by
//! dispatch sequence and subscribers observe every one of them in order.
//!
//! ## Design
//!
//! The listener set is the application's sole notification hub. It is
//! iterated over a snapshot of the registered listeners, so a listener may
//! unsubscribe (itself or another) while a notification round is in
//! progress. Listeners run on the dispatching thread and must not call
//! `dispatch` themselves; asynchronous work reacts to a snapshot and
//! rejoins through `dispatch` from its own task instead.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::action::Action;
use crate::reducer::reduce;
use crate::state::AppState;

type Listener = Arc<dyn Fn(&Arc<AppState>) + Send + Sync>;

#[derive(Default)]
struct ListenerSet {
    entries: Vec<(u64, Listener)>,
}

/// The single state store.
pub struct Store {
    state: Mutex<Arc<AppState>>,
    listeners: Arc<Mutex<ListenerSet>>,
    next_listener: AtomicU64,
    /// Serializes reduce + swap + notify so no two dispatches interleave
    /// and subscribers see snapshots in dispatch order.
    dispatch_guard: Mutex<()>,
}

impl Store {
    pub fn new(initial: AppState) -> Self {
        Self {
            state: Mutex::new(Arc::new(initial)),
            listeners: Arc::new(Mutex::new(ListenerSet::default())),
            next_listener: AtomicU64::new(1),
            dispatch_guard: Mutex::new(()),
        }
    }

    /// The current snapshot, O(1).
    pub fn get_state(&self) -> Arc<AppState> {
        self.state.lock().expect("state lock poisoned").clone()
    }

    /// Applies `action` through the reducer, replaces the snapshot and
    /// notifies every subscriber with the new snapshot.
    pub fn dispatch(&self, action: Action) {
        let _guard = self.dispatch_guard.lock().expect("dispatch lock poisoned");

        let next = {
            let mut state = self.state.lock().expect("state lock poisoned");
            let next = Arc::new(reduce(&state, &action));
            *state = next.clone();
            next
        };

        // Iterate a snapshot of the listener set, not the live set.
        let listeners: Vec<Listener> = {
            let set = self.listeners.lock().expect("listener lock poisoned");
            set.entries.iter().map(|(_, l)| l.clone()).collect()
        };
        for listener in listeners {
            listener(&next);
        }
    }

    /// Registers a listener called after every dispatch. Dropping the
    /// returned [`Subscription`] (or calling `cancel`) removes it, even
    /// mid-notification.
    pub fn subscribe(
        &self,
        listener: impl Fn(&Arc<AppState>) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .expect("listener lock poisoned")
            .entries
            .push((id, Arc::new(listener)));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }
}

/// Handle to a registered listener; unsubscribes on drop.
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<ListenerSet>>,
}

impl Subscription {
    /// Removes the listener now.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            if let Ok(mut set) = listeners.lock() {
                set.entries.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Diagnostic;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn dispatch_replaces_snapshot_and_notifies() {
        let store = Store::new(AppState::new());
        let seen = Arc::new(AtomicUsize::new(0));
        let seen2 = seen.clone();
        let _sub = store.subscribe(move |state| {
            seen2.store(state.diagnostics.len(), Ordering::SeqCst);
        });

        store.dispatch(Action::PushDiagnostic {
            diagnostic: Diagnostic::info("one"),
        });
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(store.get_state().diagnostics.len(), 1);
    }

    #[test]
    fn every_snapshot_is_observed_in_order() {
        let store = Store::new(AppState::new());
        let counts = Arc::new(Mutex::new(Vec::new()));
        let counts2 = counts.clone();
        let _sub = store.subscribe(move |state| {
            counts2.lock().unwrap().push(state.diagnostics.len());
        });

        for i in 0..5 {
            store.dispatch(Action::PushDiagnostic {
                diagnostic: Diagnostic::info(format!("d{i}")),
            });
        }
        assert_eq!(*counts.lock().unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn dropped_subscription_stops_notifications() {
        let store = Store::new(AppState::new());
        let seen = Arc::new(AtomicUsize::new(0));
        let seen2 = seen.clone();
        let sub = store.subscribe(move |_| {
            seen2.fetch_add(1, Ordering::SeqCst);
        });
        store.dispatch(Action::ClearDiagnostics);
        sub.cancel();
        store.dispatch(Action::ClearDiagnostics);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribing_during_notification_is_safe() {
        let store = Arc::new(Store::new(AppState::new()));
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let slot2 = slot.clone();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired2 = fired.clone();

        let sub = store.subscribe(move |_| {
            fired2.fetch_add(1, Ordering::SeqCst);
            // Remove ourselves while the notification round is running.
            slot2.lock().unwrap().take();
        });
        *slot.lock().unwrap() = Some(sub);

        store.dispatch(Action::ClearDiagnostics);
        store.dispatch(Action::ClearDiagnostics);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn get_state_returns_shared_snapshot() {
        let store = Store::new(AppState::new());
        let a = store.get_state();
        let b = store.get_state();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
