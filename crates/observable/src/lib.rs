#![forbid(unsafe_code)]

//! Observable values, subjects and lazily evaluated expressions.
//!
//! # Overview
//!
//! - [`Subject`]: broadcasts notifications to registered callbacks.
//! - [`Value`]: a container that notifies its observers when it changes.
//! - [`Property`]: a value that can only be written through its
//!   [`PropertySetter`].
//! - [`Node`]: an expression over values, re-evaluated lazily.
//! - [`observe`] / [`observe_with`]: turn an expression into a read-only
//!   value that follows it, immediately or on [`Updater::update_all`].
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use observable::{Value, observe};
//!
//! let width = Value::new(3);
//! let height = Value::new(4);
//! let area = observe(&width * &height);
//!
//! let log = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&log);
//! let _sub = area.subscribe(move |a: &i32| sink.lock().unwrap().push(*a));
//!
//! width.set(5).unwrap();
//! assert_eq!(area.get(), 20);
//! assert_eq!(*log.lock().unwrap(), vec![20]);
//! ```
//!
//! # Concurrency
//!
//! Every type here is `Send + Sync`. Subjects and values may be subscribed,
//! notified and set from several threads at once; observers run on the
//! thread that triggered the notification. Expression trees are meant to be
//! built and evaluated from one thread at a time.
//!
//! # Feature flags
//!
//! - `tracing`: emit structured `tracing` events for registry collection,
//!   subscriptions, value changes and evaluator passes.

pub mod error;
pub mod expr;
mod logging;
pub mod observe;
pub mod property;
pub mod registry;
pub mod subject;
pub mod subscription;
mod sync;
pub mod value;

pub use error::{Error, Result};
pub use expr::math;
pub use expr::{
    Const, Evaluator, Expression, ExpressionEvaluator, ExpressionId, ImmediateEvaluator, IntoNode,
    Node, Observable, PrimitiveCast, Registration, and, cast, clamp, construct, convert, eq, ge,
    gt, le, lift_n, lift1, lift2, lift3, lt, max, max_of, mean, min, min_of, ne, or, pos, select,
    zip, zip3,
};
pub use observe::{Updater, observe, observe_with};
pub use property::{Property, PropertySetter};
pub use registry::{ObserverId, ObserverRegistry};
pub use subject::{Bare, CompoundObserver, CompoundSubject, EnclosedSubject, Notifier, Subject, WithArgs};
pub use subscription::{InfiniteSubscription, SharedSubscription, UniqueSubscription};
pub use value::{Value, ValueNotifier, ValueUpdater};
