#![forbid(unsafe_code)]

//! Lock-free observer registry.
//!
//! # Design
//!
//! [`ObserverRegistry<E>`] is a singly linked list of entries published
//! through [`ArcSwapOption`] links. New entries are pushed at the head with a
//! compare-and-swap loop. Removal only marks an entry's tombstone flag; the
//! entry is unlinked later by a garbage-collection pass that runs opportunistically
//! after `insert` and `remove`.
//!
//! Two sequentially consistent atomics interlock traversal and collection:
//!
//! - `block_gc` counts in-flight operations (`insert`, `remove`, `apply`,
//!   `is_empty`). While it is non-zero no collection pass starts, and a pass
//!   already in progress stops at its next step.
//! - `gc_active` marks a running pass. Operations wait for it to finish before
//!   touching the list, so at most one pass runs at a time and no operation
//!   observes a half-unlinked chain.
//!
//! # Invariants
//!
//! 1. Ids are assigned from a monotonically increasing counter and are never
//!    zero.
//! 2. `remove(id)` returns `true` at most once per id.
//! 3. `apply` visits exactly the entries that were live when it started and
//!    were not removed before being reached. Entries inserted during the pass
//!    are not visited.
//! 4. Callbacks run by `apply` may call `insert` and `remove` on the same
//!    registry.
//!
//! # Failure Modes
//!
//! - **Callback panics**: the panic propagates out of `apply`. The in-flight
//!   counter is restored during unwinding, so the registry stays usable.
//! - **Collection starved**: under constant traffic tombstones accumulate.
//!   They are skipped by traversal and reclaimed once the registry goes quiet
//!   or is dropped.

use std::fmt;
use std::hint;
use std::num::NonZeroU64;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use arc_swap::ArcSwapOption;

use crate::logging::trace;

/// Identifier of an element stored in an [`ObserverRegistry`].
///
/// Ids are unique per registry and never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(NonZeroU64);

impl ObserverId {
    /// Returns the raw id value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type Link<E> = ArcSwapOption<Entry<E>>;

struct Entry<E> {
    id: ObserverId,
    element: E,
    deleted: AtomicBool,
    next: Link<E>,
}

impl<E> Entry<E> {
    fn is_live(&self) -> bool {
        !self.deleted.load(Ordering::Acquire)
    }
}

fn same_entry<E>(a: &Option<Arc<Entry<E>>>, b: &Option<Arc<Entry<E>>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Thread-safe, insertion-ordered collection of observer callbacks.
///
/// Iteration order is most recently inserted first.
pub struct ObserverRegistry<E> {
    head: Link<E>,
    last_id: AtomicU64,
    tombstones: AtomicUsize,
    block_gc: AtomicUsize,
    gc_active: AtomicBool,
}

/// Keeps garbage collection off while an operation walks the list.
struct GcBlocker<'a> {
    block_gc: &'a AtomicUsize,
}

impl<'a> GcBlocker<'a> {
    fn new<E>(registry: &'a ObserverRegistry<E>) -> Self {
        registry.block_gc.fetch_add(1, Ordering::SeqCst);
        while registry.gc_active.load(Ordering::SeqCst) {
            hint::spin_loop();
        }
        Self {
            block_gc: &registry.block_gc,
        }
    }
}

impl Drop for GcBlocker<'_> {
    fn drop(&mut self) {
        self.block_gc.fetch_sub(1, Ordering::AcqRel);
    }
}

impl<E> ObserverRegistry<E> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            head: ArcSwapOption::empty(),
            last_id: AtomicU64::new(0),
            tombstones: AtomicUsize::new(0),
            block_gc: AtomicUsize::new(0),
            gc_active: AtomicBool::new(false),
        }
    }

    /// Stores `element` and returns its freshly assigned id.
    pub fn insert(&self, element: E) -> ObserverId {
        let previous = self.last_id.fetch_add(1, Ordering::Relaxed);
        let id = ObserverId(NonZeroU64::MIN.saturating_add(previous));
        let entry = Arc::new(Entry {
            id,
            element,
            deleted: AtomicBool::new(false),
            next: ArcSwapOption::empty(),
        });

        {
            let _blocker = GcBlocker::new(self);
            self.head.rcu(|head| {
                entry.next.store(head.clone());
                Some(Arc::clone(&entry))
            });
        }

        self.collect_garbage();
        id
    }

    /// Tombstones the element with `id`.
    ///
    /// Returns `true` if this call removed a live element, `false` if the id
    /// was unknown or already removed.
    pub fn remove(&self, id: ObserverId) -> bool {
        let removed = {
            let _blocker = GcBlocker::new(self);
            let mut cursor = self.head.load_full();
            let mut removed = false;
            while let Some(entry) = cursor {
                if entry.id == id {
                    removed = !entry.deleted.swap(true, Ordering::AcqRel);
                    if removed {
                        self.tombstones.fetch_add(1, Ordering::AcqRel);
                    }
                    break;
                }
                cursor = entry.next.load_full();
            }
            removed
        };

        self.collect_garbage();
        removed
    }

    /// Calls `f` on every live element.
    pub fn apply(&self, mut f: impl FnMut(&E)) {
        let _blocker = GcBlocker::new(self);
        let mut cursor = self.head.load_full();
        while let Some(entry) = cursor {
            if entry.is_live() {
                f(&entry.element);
            }
            cursor = entry.next.load_full();
        }
    }

    /// Returns `true` if no live element is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live elements.
    #[must_use]
    pub fn len(&self) -> usize {
        let _blocker = GcBlocker::new(self);
        let mut count = 0;
        let mut cursor = self.head.load_full();
        while let Some(entry) = cursor {
            if entry.is_live() {
                count += 1;
            }
            cursor = entry.next.load_full();
        }
        count
    }

    fn gc_blocked(&self) -> bool {
        self.block_gc.load(Ordering::SeqCst) > 0
    }

    /// Unlinks tombstoned entries.
    ///
    /// Unlinked entries are dropped after `gc_active` is cleared: dropping an
    /// element may run arbitrary code that re-enters this registry.
    fn collect_garbage(&self) {
        if self.tombstones.load(Ordering::Acquire) == 0
            || self.gc_blocked()
            || self.gc_active.swap(true, Ordering::SeqCst)
        {
            return;
        }
        if self.gc_blocked() {
            self.gc_active.store(false, Ordering::Release);
            return;
        }

        let mut reclaimed = Vec::new();

        // Tombstones at the head race with `insert`, so they are swapped out.
        while !self.gc_blocked() {
            let head = self.head.load_full();
            let Some(first) = head.as_ref().filter(|entry| !entry.is_live()) else {
                break;
            };
            let next = first.next.load_full();
            let previous = self.head.compare_and_swap(&head, next);
            if !same_entry(&previous, &head) {
                break;
            }
            reclaimed.extend(head);
        }

        // Interior links are only rewritten here.
        let mut pred = self.head.load_full();
        while let Some(entry) = pred {
            if self.gc_blocked() {
                break;
            }
            match entry.next.load_full() {
                Some(next) if !next.is_live() => {
                    entry.next.store(next.next.load_full());
                    reclaimed.push(next);
                    pred = Some(entry);
                }
                other => pred = other,
            }
        }

        self.tombstones.fetch_sub(reclaimed.len(), Ordering::AcqRel);
        self.gc_active.store(false, Ordering::Release);

        if !reclaimed.is_empty() {
            trace!(message = "registry.gc", reclaimed = reclaimed.len());
        }
        drop(reclaimed);
    }
}

impl<E> Default for ObserverRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for ObserverRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("len", &self.len())
            .field("last_id", &self.last_id.load(Ordering::Relaxed))
            .finish()
    }
}

impl<E> Drop for ObserverRegistry<E> {
    fn drop(&mut self) {
        // Unlink iteratively so long chains don't recurse through `Arc` drops.
        let mut cursor = self.head.swap(None);
        while let Some(entry) = cursor {
            cursor = entry.next.swap(None);
        }
    }
}
