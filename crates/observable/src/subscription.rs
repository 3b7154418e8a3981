#![forbid(unsafe_code)]

//! Subscription handles.
//!
//! Every `subscribe` call returns an [`InfiniteSubscription`]: the observer
//! stays attached until `unsubscribe` is called, even if the handle is
//! dropped. Wrap it in a [`UniqueSubscription`] to detach on drop, or in a
//! [`SharedSubscription`] to detach when the last clone goes away.
//!
//! All handles are safe to use after the subject they point at has been
//! destroyed; unsubscribing then does nothing.

use std::fmt;
use std::sync::Arc;

type Unsubscribe = Box<dyn FnOnce() + Send + Sync>;

/// Handle that keeps an observer attached until told otherwise.
///
/// Dropping the handle does **not** unsubscribe.
#[must_use = "dropping the handle leaves the observer attached with no way to detach it"]
#[derive(Default)]
pub struct InfiniteSubscription {
    unsubscribe: Option<Unsubscribe>,
}

impl InfiniteSubscription {
    /// Creates a handle that runs `unsubscribe` the first time
    /// [`unsubscribe`](Self::unsubscribe) is called.
    pub fn new(unsubscribe: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Detaches the observer. Later calls do nothing.
    pub fn unsubscribe(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }

    /// Moves the detach capability out, leaving this handle inert.
    ///
    /// `handle.release().unsubscribe()` has the same effect as
    /// `handle.unsubscribe()`.
    pub fn release(&mut self) -> InfiniteSubscription {
        Self {
            unsubscribe: self.unsubscribe.take(),
        }
    }

    /// Returns `true` while this handle can still detach its observer.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.unsubscribe.is_some()
    }
}

impl fmt::Debug for InfiniteSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfiniteSubscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Handle that detaches its observer when dropped.
#[must_use = "dropping the handle detaches the observer immediately"]
#[derive(Debug, Default)]
pub struct UniqueSubscription(InfiniteSubscription);

impl UniqueSubscription {
    /// Detaches the observer now. Later calls and the eventual drop do
    /// nothing.
    pub fn unsubscribe(&mut self) {
        self.0.unsubscribe();
    }

    /// Gives up ownership of the observer without detaching it.
    pub fn release(&mut self) -> InfiniteSubscription {
        self.0.release()
    }

    /// Returns `true` until the observer is detached or released.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.0.is_active()
    }
}

impl From<InfiniteSubscription> for UniqueSubscription {
    fn from(subscription: InfiniteSubscription) -> Self {
        Self(subscription)
    }
}

impl Drop for UniqueSubscription {
    fn drop(&mut self) {
        self.0.unsubscribe();
    }
}

/// Reference-counted handle; the observer is detached when the last clone
/// is dropped or unsubscribed.
#[must_use = "dropping the last handle detaches the observer"]
#[derive(Debug, Clone, Default)]
pub struct SharedSubscription {
    share: Option<Arc<UniqueSubscription>>,
}

impl SharedSubscription {
    /// Gives up this clone's share. The observer is detached only once every
    /// share is gone.
    pub fn unsubscribe(&mut self) {
        self.share = None;
    }

    /// Returns `true` while this clone still holds a share.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.share.is_some()
    }
}

impl From<UniqueSubscription> for SharedSubscription {
    fn from(subscription: UniqueSubscription) -> Self {
        Self {
            share: Some(Arc::new(subscription)),
        }
    }
}

impl From<InfiniteSubscription> for SharedSubscription {
    fn from(subscription: InfiniteSubscription) -> Self {
        UniqueSubscription::from(subscription).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting() -> (Arc<AtomicUsize>, InfiniteSubscription) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let sub = InfiniteSubscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (calls, sub)
    }

    #[test]
    fn infinite_unsubscribe_runs_once() {
        let (calls, mut sub) = counting();
        sub.unsubscribe();
        sub.unsubscribe();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!sub.is_active());
    }

    #[test]
    fn infinite_drop_does_not_unsubscribe() {
        let (calls, sub) = counting();
        drop(sub);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn release_transfers_capability() {
        let (calls, mut sub) = counting();
        let mut released = sub.release();
        sub.unsubscribe();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        released.unsubscribe();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn default_handle_is_inert() {
        let mut sub = InfiniteSubscription::default();
        assert!(!sub.is_active());
        sub.unsubscribe();
    }

    #[test]
    fn unique_unsubscribes_on_drop() {
        let (calls, sub) = counting();
        let unique = UniqueSubscription::from(sub);
        assert!(unique.is_active());
        drop(unique);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unique_explicit_unsubscribe_then_drop_runs_once() {
        let (calls, sub) = counting();
        let mut unique = UniqueSubscription::from(sub);
        unique.unsubscribe();
        drop(unique);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unique_release_keeps_observer() {
        let (calls, sub) = counting();
        let mut unique = UniqueSubscription::from(sub);
        let released = unique.release();
        drop(unique);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        drop(released);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn shared_detaches_with_last_share() {
        let (calls, sub) = counting();
        let first = SharedSubscription::from(sub);
        let second = first.clone();
        drop(first);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        drop(second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn shared_unsubscribe_only_drops_own_share() {
        let (calls, sub) = counting();
        let mut first = SharedSubscription::from(sub);
        let mut second = first.clone();
        first.unsubscribe();
        assert!(!first.is_active());
        assert!(second.is_active());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        second.unsubscribe();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
