#![forbid(unsafe_code)]

//! Observable values.
//!
//! # Design
//!
//! A [`Value<T>`] owns its contents in a shared core. The core holds the
//! datum behind an `RwLock`, an equality predicate, a [`CompoundSubject`] for
//! change observers and two lifecycle subjects (`moved`, `destroyed`).
//!
//! A value may be driven by a [`ValueUpdater`]. Such values are read-only to
//! callers: [`set`](Value::set) fails with [`Error::ReadOnly`] and the
//! contents only change when the updater pushes a new result through its
//! [`ValueNotifier`].
//!
//! # Invariants
//!
//! 1. Observers are notified only when the equality predicate reports the new
//!    contents as different from the old.
//! 2. Argument-less observers are notified before observers taking `&T`.
//! 3. Observers always receive the post-change contents.
//! 4. The datum lock is never held while observers run, so observers may
//!    read or write the value they are notified from.
//!
//! # Failure Modes
//!
//! - **Observer panics**: the new contents are already stored; remaining
//!   observers are skipped for that change and the panic propagates out of
//!   `set`.
//! - **Writing a driven value**: `set` returns `Err(Error::ReadOnly)` and
//!   logs a `value.readonly` warning.

use std::fmt;
use std::mem;
use std::sync::{Arc, RwLock, Weak};

use crate::error::{Error, Result};
use crate::logging::{debug, trace, warn};
use crate::subject::{CompoundObserver, CompoundSubject, EnclosedSubject};
use crate::subscription::InfiniteSubscription;
use crate::sync::{read, write};

/// Callback an updater uses to push a fresh result into its value.
pub type ValueNotifier<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Source of contents for a read-only [`Value`].
///
/// The value calls [`set_value_notifier`](Self::set_value_notifier) when it
/// takes ownership of the updater and again whenever it is reassigned, so
/// the updater always reports to the value that currently owns it.
pub trait ValueUpdater<T>: Send + Sync {
    /// Installs the callback used to report new results.
    fn set_value_notifier(&self, notifier: ValueNotifier<T>);

    /// Returns the current result.
    fn get(&self) -> T;
}

type Equality<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

pub(crate) struct ValueCore<T: 'static> {
    datum: RwLock<T>,
    equal: Equality<T>,
    observers: CompoundSubject<T>,
    updater: Option<Box<dyn ValueUpdater<T>>>,
    moved: EnclosedSubject<Value<T>>,
    destroyed: EnclosedSubject<()>,
}

impl<T: Clone + Send + Sync + 'static> ValueCore<T> {
    fn new(initial: T, equal: Equality<T>, updater: Option<Box<dyn ValueUpdater<T>>>) -> Self {
        Self {
            datum: RwLock::new(initial),
            equal,
            observers: CompoundSubject::new(),
            updater,
            moved: EnclosedSubject::new(),
            destroyed: EnclosedSubject::new(),
        }
    }

    /// Stores `new_value` and notifies observers if it differs from the
    /// current contents. Returns whether a change happened.
    pub(crate) fn store(&self, new_value: T) -> bool {
        let snapshot = {
            let mut datum = write(&self.datum);
            if (self.equal)(&datum, &new_value) {
                return false;
            }
            *datum = new_value;
            datum.clone()
        };

        trace!(message = "value.changed");
        self.observers.notify(&snapshot);
        true
    }

    pub(crate) fn get(&self) -> T {
        read(&self.datum).clone()
    }

    pub(crate) fn is_read_only(&self) -> bool {
        self.updater.is_some()
    }
}

/// A container whose changes can be observed.
///
/// Cloning a `Value` takes a snapshot: the clone gets the current contents
/// and equality predicate, but no observers and no updater.
///
/// # Example
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use observable::Value;
///
/// let value = Value::new(5);
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// let _sub = value.subscribe(move |v: &i32| sink.lock().unwrap().push(*v));
///
/// value.set(7).unwrap();
/// value.set(7).unwrap(); // unchanged, not notified
/// assert_eq!(*seen.lock().unwrap(), vec![7]);
/// ```
pub struct Value<T: 'static> {
    core: Arc<ValueCore<T>>,
}

impl<T: Clone + PartialEq + Send + Sync + 'static> Value<T> {
    /// Creates a value compared with `PartialEq`.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self::with_equality(initial, |a: &T, b: &T| a == b)
    }

    /// Creates a read-only value driven by `updater`, compared with
    /// `PartialEq`.
    #[must_use]
    pub fn from_updater(updater: impl ValueUpdater<T> + 'static) -> Self {
        Self::from_updater_with_equality(updater, |a: &T, b: &T| a == b)
    }
}

impl<T: Clone + Send + Sync + 'static> Value<T> {
    /// Creates a value compared with `equal`.
    ///
    /// Observers are notified only when `equal(old, new)` is `false`.
    #[must_use]
    pub fn with_equality(initial: T, equal: impl Fn(&T, &T) -> bool + Send + Sync + 'static) -> Self {
        Self {
            core: Arc::new(ValueCore::new(initial, Arc::new(equal), None)),
        }
    }

    /// Creates a value that notifies on every `set`, even when unchanged.
    #[must_use]
    pub fn always_notify(initial: T) -> Self {
        Self::with_equality(initial, |_: &T, _: &T| false)
    }

    /// Creates a read-only value driven by `updater`, compared with `equal`.
    #[must_use]
    pub fn from_updater_with_equality(
        updater: impl ValueUpdater<T> + 'static,
        equal: impl Fn(&T, &T) -> bool + Send + Sync + 'static,
    ) -> Self {
        let initial = updater.get();
        let value = Self {
            core: Arc::new(ValueCore::new(
                initial,
                Arc::new(equal),
                Some(Box::new(updater)),
            )),
        };
        value.bind_updater();
        value
    }

    /// Returns a copy of the contents.
    #[must_use]
    pub fn get(&self) -> T {
        self.core.get()
    }

    /// Calls `f` with a reference to the contents.
    ///
    /// The contents are read-locked for the duration of `f`; setting this
    /// value from inside `f` deadlocks.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&read(&self.core.datum))
    }

    /// Replaces the contents, notifying observers if they changed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] if this value is driven by an updater.
    pub fn set(&self, new_value: T) -> Result<()> {
        if self.core.is_read_only() {
            warn!(message = "value.readonly");
            return Err(Error::ReadOnly);
        }
        self.core.store(new_value);
        Ok(())
    }

    /// Attaches `observer` for change notifications.
    ///
    /// `observer` may take no arguments (`Fn()`) or the new contents
    /// (`Fn(&T)`).
    pub fn subscribe<M>(&self, observer: impl CompoundObserver<T, M>) -> InfiniteSubscription {
        self.core.observers.subscribe(observer)
    }

    /// Calls `observer` with the current contents, then attaches it.
    pub fn subscribe_and_call<M>(&self, observer: impl CompoundObserver<T, M>) -> InfiniteSubscription {
        let current = self.get();
        self.core.observers.subscribe_and_call(observer, &current)
    }

    /// Returns `true` if this value is driven by an updater.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.core.is_read_only()
    }

    /// Subject notified with the destination whenever this value's contents
    /// are moved into another value by [`assign_from`](Self::assign_from).
    #[must_use]
    pub fn moved(&self) -> &EnclosedSubject<Value<T>> {
        &self.core.moved
    }

    /// Subject notified when these contents are destroyed.
    #[must_use]
    pub fn destroyed(&self) -> &EnclosedSubject<()> {
        &self.core.destroyed
    }

    /// Moves `source`'s contents, observers and updater into `self`.
    ///
    /// `self`'s previous contents are destroyed first, firing their
    /// `destroyed` subject. Then the `moved` subject of the transferred
    /// contents fires with `self`, so anything tracking `source` can
    /// re-target. `source`'s `destroyed` never fires for the transferred
    /// contents.
    pub fn assign_from(&mut self, mut source: Value<T>) {
        mem::swap(&mut self.core, &mut source.core);
        drop(source);
        self.bind_updater();
        debug!(message = "value.moved");
        self.core.moved.notify(self);
    }

    pub(crate) fn downgrade(&self) -> WeakValue<T> {
        WeakValue(Arc::downgrade(&self.core))
    }

    pub(crate) fn core(&self) -> &Arc<ValueCore<T>> {
        &self.core
    }

    fn bind_updater(&self) {
        if let Some(updater) = &self.core.updater {
            updater.set_value_notifier(notifier_for(&self.core));
        }
    }
}

fn notifier_for<T: Clone + Send + Sync + 'static>(core: &Arc<ValueCore<T>>) -> ValueNotifier<T> {
    let core = Arc::downgrade(core);
    Arc::new(move |new_value: T| {
        if let Some(core) = core.upgrade() {
            core.store(new_value);
        }
    })
}

impl<T: Clone + Send + Sync + 'static> Clone for Value<T> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::new(ValueCore::new(
                self.get(),
                Arc::clone(&self.core.equal),
                None,
            )),
        }
    }
}

impl<T: Clone + PartialEq + Default + Send + Sync + 'static> Default for Value<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: 'static> Drop for Value<T> {
    fn drop(&mut self) {
        self.core.destroyed.notify(&());
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("value", &*read(&self.core.datum))
            .field("read_only", &self.core.updater.is_some())
            .finish()
    }
}

/// Non-owning link to a value's contents.
pub(crate) struct WeakValue<T: 'static>(Weak<ValueCore<T>>);

impl<T: Clone + Send + Sync + 'static> WeakValue<T> {
    pub(crate) fn get(&self) -> Option<T> {
        self.0.upgrade().map(|core| core.get())
    }
}
