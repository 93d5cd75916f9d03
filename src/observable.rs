//! Publish/subscribe value holder used by every property.
//!
//! A [`Signal`] owns one value and a list of subscribers. Setting a value
//! that differs from the current one notifies every subscriber; [`Signal::notify`]
//! notifies unconditionally (used for "always notify" events such as a
//! project having been opened).
//!
//! Signals are cheap handles: cloning a signal shares the underlying value.
//! Subscribers are invoked outside of any internal lock, so a callback may
//! freely read or write other signals (or the same one).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;
type Cleanup = Box<dyn FnOnce() + Send + Sync>;

/// Handle returned by [`Signal::subscribe`], used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Inner<T> {
    value: RwLock<T>,
    subscribers: RwLock<Vec<(SubscriptionId, Callback<T>)>>,
    next_id: AtomicU64,
    /// Run when the last handle goes away; a computed signal removes its
    /// subscriptions on the sources here.
    on_drop: Mutex<Vec<Cleanup>>,
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        let cleanups = std::mem::take(
            self.on_drop
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for cleanup in cleanups {
            cleanup();
        }
    }
}

/// An observable value.
pub struct Signal<T> {
    inner: Arc<Inner<T>>,
}

/// A non-owning reference to a [`Signal`].
pub struct WeakSignal<T> {
    inner: Weak<Inner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Clone for WeakSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> WeakSignal<T> {
    /// Returns the signal if it is still alive.
    pub fn upgrade(&self) -> Option<Signal<T>> {
        self.inner.upgrade().map(|inner| Signal { inner })
    }
}

impl<T> Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                value: RwLock::new(value),
                subscribers: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
                on_drop: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Create a signal whose value is recomputed from `sources` whenever any
    /// of them changes.
    ///
    /// The computed signal only holds weak references to its sources, so it
    /// never keeps them alive. Dropping it unsubscribes from the sources.
    pub fn computed<S, F>(sources: &[Signal<S>], compute: F) -> Self
    where
        S: Clone + PartialEq + Send + Sync + 'static,
        F: Fn(&[S]) -> T + Send + Sync + 'static,
    {
        let values: Vec<S> = sources.iter().map(Signal::get).collect();
        let target = Signal::new(compute(&values));

        let compute = Arc::new(compute);
        let weak_sources: Vec<WeakSignal<S>> = sources.iter().map(Signal::downgrade).collect();
        for source in sources {
            let weak_target = target.downgrade();
            let weak_sources = weak_sources.clone();
            let compute = Arc::clone(&compute);
            let id = source.subscribe(move |_| {
                let Some(target) = weak_target.upgrade() else {
                    return;
                };
                let values: Option<Vec<S>> = weak_sources
                    .iter()
                    .map(|s| s.upgrade().map(|s| s.get()))
                    .collect();
                if let Some(values) = values {
                    target.set(compute(&values));
                }
            });
            let weak_source = source.downgrade();
            target
                .inner
                .on_drop
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(Box::new(move || {
                    if let Some(source) = weak_source.upgrade() {
                        source.unsubscribe(id);
                    }
                }));
        }
        target
    }

    /// Return a clone of the current value.
    pub fn get(&self) -> T {
        self.inner
            .value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the value. Subscribers are notified only when the value
    /// actually changed; the return value says whether it did.
    pub fn set(&self, value: T) -> bool {
        let changed = {
            let mut guard = self
                .inner
                .value
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if *guard == value {
                false
            } else {
                *guard = value;
                true
            }
        };
        if changed {
            self.notify();
        }
        changed
    }

    /// Mutate the value in place and notify subscribers unconditionally.
    pub fn update(&self, mutate: impl FnOnce(&mut T)) {
        {
            let mut guard = self
                .inner
                .value
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            mutate(&mut guard);
        }
        self.notify();
    }

    /// Invoke every subscriber with the current value.
    pub fn notify(&self) {
        let value = self.get();
        let callbacks: Vec<Callback<T>> = self
            .inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for cb in callbacks {
            cb(&value);
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(callback)));
        id
    }

    /// Remove a subscriber. Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        // The callback is dropped after the lock is released; dropping it
        // may drop other signals that unsubscribe from this one.
        let removed = {
            let mut subs = self
                .inner
                .subscribers
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            subs.iter()
                .position(|(sub_id, _)| *sub_id == id)
                .map(|index| subs.remove(index))
        };
        removed.is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn downgrade(&self) -> WeakSignal<T> {
        WeakSignal {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Signal<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.inner.value.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Signal").field("value", &*value).finish()
    }
}
