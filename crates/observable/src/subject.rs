#![forbid(unsafe_code)]

//! Subjects: typed broadcast points for observer callbacks.
//!
//! A [`Subject<A>`] stores callbacks of type `Fn(&A)` and calls each of them
//! on [`notify`](Subject::notify). Use `Subject<()>` for argument-less
//! notifications and a tuple for several arguments.
//!
//! [`CompoundSubject<A>`] accepts both `Fn()` and `Fn(&A)` observers and
//! routes each to the matching inner subject, so a value's observers may
//! either ignore or inspect the new contents.
//!
//! [`EnclosedSubject<A>`] hides `notify` from its public surface. Whoever
//! creates it either keeps it inside this crate or receives the paired
//! [`Notifier<A>`].
//!
//! # Invariants
//!
//! 1. A subscription made during `notify` does not receive that notification.
//! 2. An observer unsubscribed during `notify` is not called afterwards
//!    within the same pass, unless it was already running.
//! 3. Observer panics propagate to the caller of `notify`; observers not yet
//!    reached are skipped for that pass.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::logging::trace;
use crate::registry::ObserverRegistry;
use crate::subscription::InfiniteSubscription;

type Observer<A> = Arc<dyn Fn(&A) + Send + Sync>;
type Observers<A> = ObserverRegistry<Observer<A>>;

/// Broadcasts `&A` to every subscribed observer.
///
/// Subjects are neither `Clone` nor `Copy`. Subscription handles hold only a
/// weak link, so they may outlive the subject.
pub struct Subject<A: ?Sized + 'static> {
    observers: Arc<Observers<A>>,
}

impl<A: ?Sized + 'static> Subject<A> {
    /// Creates a subject with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            observers: Arc::new(ObserverRegistry::new()),
        }
    }

    /// Attaches `observer` until the returned handle is unsubscribed.
    pub fn subscribe(&self, observer: impl Fn(&A) + Send + Sync + 'static) -> InfiniteSubscription {
        let id = self.observers.insert(Arc::new(observer));
        trace!(message = "subject.subscribe", id = id.raw());

        let observers = Arc::downgrade(&self.observers);
        InfiniteSubscription::new(move || {
            if let Some(observers) = observers.upgrade() {
                if observers.remove(id) {
                    trace!(message = "subject.unsubscribe", id = id.raw());
                }
            }
        })
    }

    /// Calls `observer` with `args` and then attaches it.
    ///
    /// If the call panics the observer is not attached.
    pub fn subscribe_and_call(
        &self,
        observer: impl Fn(&A) + Send + Sync + 'static,
        args: &A,
    ) -> InfiniteSubscription {
        observer(args);
        self.subscribe(observer)
    }

    /// Calls every attached observer with `args`.
    pub fn notify(&self, args: &A) {
        self.observers.apply(|observer| observer(args));
    }

    /// Returns `true` if no observer is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    fn downgrade(&self) -> Weak<Observers<A>> {
        Arc::downgrade(&self.observers)
    }
}

impl<A: ?Sized + 'static> Default for Subject<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ?Sized + 'static> fmt::Debug for Subject<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subject")
            .field("observers", &self.observers.len())
            .finish()
    }
}

// ─── Compound subject ────────────────────────────────────────────────────────

/// Routing marker for observers that take no arguments.
#[derive(Debug, Clone, Copy)]
pub enum Bare {}

/// Routing marker for observers that take `&A`.
#[derive(Debug, Clone, Copy)]
pub enum WithArgs {}

/// An observer accepted by [`CompoundSubject<A>`].
///
/// Implemented for `Fn()` (marker [`Bare`]) and `Fn(&A)` (marker
/// [`WithArgs`]); the marker is inferred from the closure's arity.
pub trait CompoundObserver<A: ?Sized + 'static, Marker>: Send + Sync + 'static {
    /// Attaches `self` to the inner subject matching its signature.
    fn attach(self, subject: &CompoundSubject<A>) -> InfiniteSubscription;

    /// Calls `self` the way a notification with `args` would.
    fn call_with(&self, args: &A);
}

impl<A, F> CompoundObserver<A, Bare> for F
where
    A: ?Sized + 'static,
    F: Fn() + Send + Sync + 'static,
{
    fn attach(self, subject: &CompoundSubject<A>) -> InfiniteSubscription {
        subject.bare.subscribe(move |_: &()| self())
    }

    fn call_with(&self, _args: &A) {
        self();
    }
}

impl<A, F> CompoundObserver<A, WithArgs> for F
where
    A: ?Sized + 'static,
    F: Fn(&A) + Send + Sync + 'static,
{
    fn attach(self, subject: &CompoundSubject<A>) -> InfiniteSubscription {
        subject.with_args.subscribe(self)
    }

    fn call_with(&self, args: &A) {
        self(args);
    }
}

/// Subject with two observer signatures: `Fn()` and `Fn(&A)`.
pub struct CompoundSubject<A: ?Sized + 'static> {
    bare: Subject<()>,
    with_args: Subject<A>,
}

impl<A: ?Sized + 'static> CompoundSubject<A> {
    /// Creates a compound subject with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bare: Subject::new(),
            with_args: Subject::new(),
        }
    }

    /// Attaches `observer` to the inner subject matching its signature.
    pub fn subscribe<M>(&self, observer: impl CompoundObserver<A, M>) -> InfiniteSubscription {
        observer.attach(self)
    }

    /// Calls `observer` as if notified with `args`, then attaches it.
    pub fn subscribe_and_call<M>(
        &self,
        observer: impl CompoundObserver<A, M>,
        args: &A,
    ) -> InfiniteSubscription {
        observer.call_with(args);
        observer.attach(self)
    }

    /// Notifies argument-less observers, then observers taking `&A`.
    pub fn notify(&self, args: &A) {
        self.bare.notify(&());
        self.with_args.notify(args);
    }

    /// Notifies only the argument-less observers.
    pub fn notify_bare(&self) {
        self.bare.notify(&());
    }

    /// Returns `true` if neither signature has observers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bare.is_empty() && self.with_args.is_empty()
    }
}

impl<A: ?Sized + 'static> Default for CompoundSubject<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ?Sized + 'static> fmt::Debug for CompoundSubject<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompoundSubject")
            .field("bare", &self.bare)
            .field("with_args", &self.with_args)
            .finish()
    }
}

// ─── Enclosed subject ────────────────────────────────────────────────────────

/// Subject whose `notify` is reserved for its owner.
///
/// Outside this crate the only way to notify is through the [`Notifier`]
/// returned by [`EnclosedSubject::with_notifier`].
pub struct EnclosedSubject<A: ?Sized + 'static> {
    subject: Subject<A>,
}

impl<A: ?Sized + 'static> EnclosedSubject<A> {
    pub(crate) fn new() -> Self {
        Self {
            subject: Subject::new(),
        }
    }

    /// Creates an enclosed subject together with the capability to notify it.
    #[must_use]
    pub fn with_notifier() -> (Self, Notifier<A>) {
        let enclosed = Self::new();
        let notifier = Notifier {
            observers: enclosed.subject.downgrade(),
        };
        (enclosed, notifier)
    }

    /// Attaches `observer` until the returned handle is unsubscribed.
    pub fn subscribe(&self, observer: impl Fn(&A) + Send + Sync + 'static) -> InfiniteSubscription {
        self.subject.subscribe(observer)
    }

    /// Calls `observer` with `args` and then attaches it.
    pub fn subscribe_and_call(
        &self,
        observer: impl Fn(&A) + Send + Sync + 'static,
        args: &A,
    ) -> InfiniteSubscription {
        self.subject.subscribe_and_call(observer, args)
    }

    /// Returns `true` if no observer is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subject.is_empty()
    }

    pub(crate) fn notify(&self, args: &A) {
        self.subject.notify(args);
    }
}

impl<A: ?Sized + 'static> fmt::Debug for EnclosedSubject<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EnclosedSubject").field(&self.subject).finish()
    }
}

/// Capability to notify an [`EnclosedSubject`].
///
/// Notifying after the subject has been dropped does nothing.
pub struct Notifier<A: ?Sized + 'static> {
    observers: Weak<Observers<A>>,
}

impl<A: ?Sized + 'static> Notifier<A> {
    /// Calls every observer attached to the paired subject.
    pub fn notify(&self, args: &A) {
        if let Some(observers) = self.observers.upgrade() {
            observers.apply(|observer| observer(args));
        }
    }
}

impl<A: ?Sized + 'static> fmt::Debug for Notifier<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("attached", &(self.observers.strong_count() > 0))
            .finish()
    }
}
