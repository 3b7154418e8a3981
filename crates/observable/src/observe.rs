#![forbid(unsafe_code)]

//! Turning expressions into observable values.
//!
//! [`observe`] returns a read-only [`Value`] that follows an expression as
//! soon as any of its inputs change. [`observe_with`] ties the value to an
//! [`Updater`] instead; it only changes when
//! [`Updater::update_all`] runs.
//!
//! ```
//! use observable::{Updater, Value, convert, observe, observe_with};
//!
//! let a = Value::new(5);
//! let b = Value::new(7);
//! let avg = observe(convert::<f64, _>(&a + &b) / 2.0);
//! assert_eq!(avg.get(), 6.0);
//!
//! a.set(3).unwrap();
//! assert_eq!(avg.get(), 5.0);
//!
//! let updater = Updater::new();
//! let lagging = observe_with(&updater, &a);
//! a.set(10).unwrap();
//! assert_eq!(lagging.get(), 3);
//! updater.update_all();
//! assert_eq!(lagging.get(), 10);
//! ```

use crate::expr::evaluator::{Evaluator, Expression};
use crate::expr::lift::Observable;
use crate::value::Value;

/// Drives values created with [`observe_with`].
///
/// Clones share the same set of values.
#[derive(Debug, Clone, Default)]
pub struct Updater {
    evaluator: Evaluator,
}

impl Updater {
    /// Creates an updater with nothing to update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-evaluates every value tied to this updater.
    pub fn update_all(&self) {
        self.evaluator.eval_all();
    }

    /// Number of values tied to this updater.
    #[must_use]
    pub fn len(&self) -> usize {
        self.evaluator.len()
    }

    /// Returns `true` if no value is tied to this updater.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.evaluator.is_empty()
    }
}

/// Creates a read-only value that follows `source` immediately.
///
/// `source` must be observable: a value, a property or an expression node.
#[must_use]
pub fn observe<T>(source: impl Observable<T>) -> Value<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    Value::from_updater(Expression::immediate(source.into_node()))
}

/// Creates a read-only value that follows `source` whenever `updater` runs.
#[must_use]
pub fn observe_with<T>(updater: &Updater, source: impl Observable<T>) -> Value<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    Value::from_updater(Expression::new(source.into_node(), &updater.evaluator))
}
