//! Shared UI state with subscribe/notify semantics.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Handle returned by [`Store::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Listener<S> = Rc<dyn Fn(&S)>;

struct StoreInner<S> {
    state: RefCell<S>,
    listeners: RefCell<Vec<(Subscription, Listener<S>)>>,
    next_id: Cell<u64>,
}

/// Single-threaded state container. Clones share the same state.
pub struct Store<S> {
    inner: Rc<StoreInner<S>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &*self.inner.state.borrow())
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

impl<S: Default> Default for Store<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S> Store<S> {
    pub fn new(state: S) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                state: RefCell::new(state),
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    pub fn read<R>(&self, reader: impl FnOnce(&S) -> R) -> R {
        reader(&self.inner.state.borrow())
    }

    pub fn subscribe(&self, listener: impl Fn(&S) + 'static) -> Subscription {
        let id = Subscription(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != subscription);
        listeners.len() != before
    }
}

impl<S: Clone> Store<S> {
    pub fn get(&self) -> S {
        self.inner.state.borrow().clone()
    }

    /// Mutates the state, then notifies subscribers in subscription order.
    ///
    /// Listeners receive a snapshot and may update the store themselves; a
    /// nested update notifies everyone again before the outer loop resumes.
    pub fn update(&self, writer: impl FnOnce(&mut S)) {
        writer(&mut self.inner.state.borrow_mut());
        let snapshot = self.get();
        let listeners: Vec<Listener<S>> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&snapshot);
        }
    }
}

/// Global visibility and submission flags of the narration screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceState {
    pub hidden: bool,
    pub loading: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypewriterState {
    pub delay_ms: u64,
    pub in_progress: bool,
}

impl Default for TypewriterState {
    fn default() -> Self {
        Self {
            delay_ms: crate::config::DEFAULT_TYPEWRITER_DELAY_MS,
            in_progress: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let store = Store::new(InterfaceState::default());
        let other = store.clone();
        other.update(|state| state.hidden = true);
        assert!(store.read(|state| state.hidden));
    }

    #[test]
    fn subscribers_are_notified_in_order() {
        let store = Store::new(0u32);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let first = Rc::clone(&seen);
        store.subscribe(move |value| first.borrow_mut().push(("first", *value)));
        let second = Rc::clone(&seen);
        store.subscribe(move |value| second.borrow_mut().push(("second", *value)));

        store.update(|value| *value = 5);
        assert_eq!(*seen.borrow(), vec![("first", 5), ("second", 5)]);
    }

    #[test]
    fn unsubscribed_listeners_stop_receiving() {
        let store = Store::new(TypewriterState::default());
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let subscription = store.subscribe(move |_| counter.set(counter.get() + 1));

        store.update(|state| state.in_progress = true);
        assert!(store.unsubscribe(subscription));
        store.update(|state| state.in_progress = false);

        assert_eq!(hits.get(), 1);
        assert!(!store.unsubscribe(subscription));
        assert!(!store.get().in_progress);
    }

    #[test]
    fn listeners_can_write_back_to_the_store() {
        let store = Store::new(InterfaceState::default());
        let writer = store.clone();
        store.subscribe(move |state| {
            if state.loading && !state.hidden {
                writer.update(|state| state.hidden = true);
            }
        });

        store.update(|state| state.loading = true);
        assert_eq!(
            store.get(),
            InterfaceState {
                hidden: true,
                loading: true,
            }
        );
    }
}
