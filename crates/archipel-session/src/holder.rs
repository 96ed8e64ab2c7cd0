//! The session holder: the single source of truth for "who is logged in".
//!
//! This is an explicit publish/subscribe channel with a current-value
//! snapshot:
//! - [`SessionHolder::set`] replaces the value and calls every subscriber,
//!   synchronously, in the order they subscribed.
//! - [`SessionHolder::subscribe`] calls the new subscriber once, right away,
//!   with the current value (replay-one), then on every later change.
//!
//! Nothing else is buffered. A subscriber that arrives after three changes
//! sees only the latest value.
//!
//! # Concurrency note
//!
//! The lock is held only to read or swap the value and the subscriber
//! list, never while a callback runs. A callback may therefore read
//! `current()`, subscribe, unsubscribe or `set` without deadlocking.
//!
//! Only one caller delivers at a time. A `set` that arrives while a
//! delivery pass is running (from a callback, or from another thread)
//! just swaps the value in and returns; the running pass then starts
//! over with the newest value. Every subscriber therefore finishes on
//! the value `current()` reports, and consecutive `set`s during one pass
//! collapse into the last one.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use archipel_protocol::{Codec, TokenCodec};

use crate::{Session, SessionState, TokenStore};

type Callback = Arc<dyn Fn(Option<&Session>) + Send + Sync>;

/// Handle returned by [`SessionHolder::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

struct Inner {
    current: Option<Session>,
    subscribers: Vec<(Subscription, Callback)>,
    next_id: u64,
    /// A delivery pass is running.
    dispatching: bool,
    /// `current` changed since the running pass took its snapshot.
    pending: bool,
}

/// Ends the delivery pass if a callback panics, so later `set`s still
/// deliver.
struct DispatchGuard<'a> {
    holder: &'a SessionHolder,
    armed: bool,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut inner = self.holder.lock();
            inner.dispatching = false;
            inner.pending = false;
        }
    }
}

/// Observable current session.
pub struct SessionHolder {
    inner: Mutex<Inner>,
}

impl SessionHolder {
    /// Creates a holder with an initial value and no subscribers.
    pub fn new(initial: Option<Session>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                current: initial,
                subscribers: Vec::new(),
                next_id: 1,
                dispatching: false,
                pending: false,
            }),
        }
    }

    /// Creates a holder seeded from whatever token is already stored.
    ///
    /// A token that doesn't decode leaves the holder empty; it is not
    /// removed from the store.
    pub fn from_store<C: Codec>(store: &TokenStore, codec: &TokenCodec<C>) -> Self {
        let initial = store
            .get()
            .and_then(|token| Session::from_token(&token, codec));

        match &initial {
            Some(session) => {
                tracing::info!(username = %session.username, "restored session from stored token");
            }
            None if store.is_present() => {
                tracing::debug!("stored token does not decode, starting anonymous");
            }
            None => {}
        }

        Self::new(initial)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A snapshot of the current value.
    pub fn current(&self) -> Option<Session> {
        self.lock().current.clone()
    }

    pub fn state(&self) -> SessionState {
        SessionState::of(self.lock().current.as_ref())
    }

    /// Registers `callback` and immediately calls it with the current value.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<&Session>) + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(callback);
        let (id, snapshot) = {
            let mut inner = self.lock();
            let id = Subscription(inner.next_id);
            inner.next_id += 1;
            inner.subscribers.push((id, Arc::clone(&callback)));
            (id, inner.current.clone())
        };

        callback(snapshot.as_ref());
        id
    }

    /// Removes a subscriber. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut inner = self.lock();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|(id, _)| *id != subscription);
        inner.subscribers.len() != before
    }

    /// Replaces the current value and notifies every subscriber.
    ///
    /// Subscribers are notified even when the value didn't change, so a
    /// repeated logout re-emits `None`. Called while another `set` is
    /// delivering, this only records the value; see the module docs.
    pub fn set(&self, session: Option<Session>) {
        {
            let mut inner = self.lock();
            inner.current = session;
            if inner.dispatching {
                inner.pending = true;
                return;
            }
            inner.dispatching = true;
        }

        let mut guard = DispatchGuard {
            holder: self,
            armed: true,
        };
        loop {
            let (snapshot, subscribers) = {
                let mut inner = self.lock();
                inner.pending = false;
                let subscribers: Vec<Callback> = inner
                    .subscribers
                    .iter()
                    .map(|(_, cb)| Arc::clone(cb))
                    .collect();
                (inner.current.clone(), subscribers)
            };

            for callback in subscribers {
                callback(snapshot.as_ref());
            }

            let mut inner = self.lock();
            if !inner.pending {
                inner.dispatching = false;
                guard.armed = false;
                break;
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}

impl Default for SessionHolder {
    fn default() -> Self {
        Self::new(None)
    }
}

impl fmt::Debug for SessionHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("SessionHolder")
            .field("current", &inner.current)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

// =========================================================================
// Tests
// =========================================================================
