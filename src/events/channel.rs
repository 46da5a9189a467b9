//! A single publish/subscribe channel.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Callback registered on a channel.
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Listeners<E> {
    next_id: u64,
    entries: Vec<(u64, Listener<E>)>,
}

/// List of listeners notified synchronously, in registration order.
///
/// The lock is released before listeners run, so a listener may subscribe,
/// cancel or publish again without deadlocking. Listeners added while an
/// event is being delivered first see the next event.
pub struct Channel<E> {
    listeners: Arc<Mutex<Listeners<E>>>,
}

impl<E: 'static> Channel<E> {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Listeners {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register a listener. Cancel the returned handle to unregister it.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = {
            let mut listeners = lock(&self.listeners);
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.entries.push((id, Arc::new(listener)));
            id
        };

        let listeners: Weak<Mutex<Listeners<E>>> = Arc::downgrade(&self.listeners);
        Subscription {
            cancel: Box::new(move || {
                if let Some(listeners) = listeners.upgrade() {
                    lock(&listeners).entries.retain(|(entry, _)| *entry != id);
                }
            }),
        }
    }

    /// Deliver `event` to every listener registered right now.
    pub fn publish(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = lock(&self.listeners)
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.listeners).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: 'static> Default for Channel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Channel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("listeners", &lock(&self.listeners).entries.len())
            .finish()
    }
}

/// Handle returned by [`Channel::subscribe`].
///
/// Dropping the handle keeps the listener registered; only
/// [`cancel`](Self::cancel) removes it.
#[must_use = "dropping a Subscription keeps the listener registered; call cancel() to remove it"]
pub struct Subscription {
    cancel: Box<dyn FnOnce() + Send>,
}

impl Subscription {
    /// Unregister exactly this listener.
    pub fn cancel(self) {
        (self.cancel)()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

fn lock<E>(listeners: &Mutex<Listeners<E>>) -> MutexGuard<'_, Listeners<E>> {
    listeners.lock().unwrap_or_else(PoisonError::into_inner)
}
