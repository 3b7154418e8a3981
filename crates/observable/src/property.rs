#![forbid(unsafe_code)]

//! Read-only views with a separate write capability.
//!
//! [`Property::new`] returns a `(Property<T>, PropertySetter<T>)` pair. The
//! property can be read, observed and used in expressions; only the setter
//! can change it. Hand the property out and keep the setter.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::{Error, Result};
use crate::logging::warn;
use crate::subject::{CompoundObserver, EnclosedSubject};
use crate::subscription::InfiniteSubscription;
use crate::value::{Value, ValueCore};

/// Observable value that cannot be written through this handle.
pub struct Property<T: 'static> {
    value: Value<T>,
}

/// Write capability for a [`Property`].
///
/// Writing after the property has been dropped does nothing.
pub struct PropertySetter<T: 'static> {
    core: Weak<ValueCore<T>>,
}

impl<T: Clone + PartialEq + Send + Sync + 'static> Property<T> {
    /// Creates a property compared with `PartialEq`.
    #[must_use]
    pub fn new(initial: T) -> (Self, PropertySetter<T>) {
        Self::wrap(Value::new(initial))
    }
}

impl<T: Clone + Send + Sync + 'static> Property<T> {
    /// Creates a property compared with `equal`.
    #[must_use]
    pub fn with_equality(
        initial: T,
        equal: impl Fn(&T, &T) -> bool + Send + Sync + 'static,
    ) -> (Self, PropertySetter<T>) {
        Self::wrap(Value::with_equality(initial, equal))
    }

    /// Wraps an existing value, taking it over.
    #[must_use]
    pub fn wrap(value: Value<T>) -> (Self, PropertySetter<T>) {
        let setter = PropertySetter {
            core: Arc::downgrade(value.core()),
        };
        (Self { value }, setter)
    }

    /// Returns a copy of the contents.
    #[must_use]
    pub fn get(&self) -> T {
        self.value.get()
    }

    /// Calls `f` with a reference to the contents.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.value.with(f)
    }

    /// Attaches `observer` for change notifications.
    pub fn subscribe<M>(&self, observer: impl CompoundObserver<T, M>) -> InfiniteSubscription {
        self.value.subscribe(observer)
    }

    /// Calls `observer` with the current contents, then attaches it.
    pub fn subscribe_and_call<M>(&self, observer: impl CompoundObserver<T, M>) -> InfiniteSubscription {
        self.value.subscribe_and_call(observer)
    }

    /// See [`Value::moved`].
    #[must_use]
    pub fn moved(&self) -> &EnclosedSubject<Value<T>> {
        self.value.moved()
    }

    /// See [`Value::destroyed`].
    #[must_use]
    pub fn destroyed(&self) -> &EnclosedSubject<()> {
        self.value.destroyed()
    }

    pub(crate) fn value(&self) -> &Value<T> {
        &self.value
    }
}

impl<T: Clone + Send + Sync + 'static> PropertySetter<T> {
    /// Replaces the property's contents, notifying observers if they changed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadOnly`] if the wrapped value is driven by an
    /// updater.
    pub fn set(&self, new_value: T) -> Result<()> {
        let Some(core) = self.core.upgrade() else {
            return Ok(());
        };
        if core.is_read_only() {
            warn!(message = "value.readonly");
            return Err(Error::ReadOnly);
        }
        core.store(new_value);
        Ok(())
    }

    /// Returns `true` while the property still exists.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.core.strong_count() > 0
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Property").field(&self.value).finish()
    }
}

impl<T: 'static> fmt::Debug for PropertySetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySetter")
            .field("attached", &(self.core.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn setter_drives_property() {
        let (property, setter) = Property::new(1);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = property.subscribe(move |v: &i32| sink.lock().unwrap().push(*v));
        setter.set(2).unwrap();
        setter.set(2).unwrap();
        assert_eq!(property.get(), 2);
        assert_eq!(*seen.lock().unwrap(), vec![2]);
    }

    #[test]
    fn setter_after_drop_is_noop() {
        let (property, setter) = Property::new(String::from("a"));
        assert!(setter.is_attached());
        drop(property);
        assert!(!setter.is_attached());
        assert_eq!(setter.set(String::from("b")), Ok(()));
    }

    #[test]
    fn with_equality_is_honoured() {
        let (property, setter) = Property::with_equality(1.0_f64, |a: &f64, b: &f64| {
            (a - b).abs() < 0.5
        });
        setter.set(1.2).unwrap();
        assert_eq!(property.get(), 1.0);
        setter.set(2.0).unwrap();
        assert_eq!(property.get(), 2.0);
    }
}
