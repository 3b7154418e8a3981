#![forbid(unsafe_code)]

//! Lazily evaluated expression nodes.
//!
//! # Design
//!
//! A [`Node<T>`] caches a result and a dirty flag in shared storage. Nodes
//! come in three kinds:
//!
//! - **Constant**: a fixed result, never dirty.
//! - **Value reference**: mirrors a [`Value<T>`]. The node follows the value
//!   through [`Value::assign_from`] and freezes at its last evaluated result
//!   once the value is destroyed.
//! - **Computed**: applies an operation to the results of its child nodes.
//!
//! When an input changes, the node is marked dirty and its `changed` subject
//! fires. Nothing is recomputed until [`eval`](Node::eval) is called.
//!
//! # Invariants
//!
//! 1. After `eval()`, `get()` equals the operation applied to the children's
//!    current results.
//! 2. A node notifies its observers only on the clean → dirty transition, so
//!    repeated input changes between two evaluations produce one
//!    notification.
//! 3. `version()` increments by exactly 1 per recomputation.
//! 4. Cloning a `Node` yields a handle to the **same** node.
//!
//! # Failure Modes
//!
//! - **Operation panics**: the cached result stays at the last successful
//!   evaluation and the dirty flag stays set, so the next `eval()` retries.
//! - **Source value destroyed**: the node keeps its last evaluated result,
//!   even if the value changed after that evaluation, and never becomes
//!   dirty again.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::logging::debug;
use crate::subject::Subject;
use crate::subscription::{InfiniteSubscription, UniqueSubscription};
use crate::sync::lock;
use crate::value::Value;

/// Recomputes a node's result; `None` keeps the cached result.
type Compute<T> = Box<dyn FnMut() -> Option<T> + Send>;

struct NodeShared<T: 'static> {
    result: Mutex<T>,
    dirty: AtomicBool,
    version: AtomicU64,
    /// `None` for constants and for frozen value references.
    compute: Mutex<Option<Compute<T>>>,
    /// Subscriptions on children and source values, detached on drop.
    inputs: Mutex<Vec<UniqueSubscription>>,
    changed: Subject<()>,
}

impl<T: 'static> NodeShared<T> {
    fn invalidate(&self) {
        if !self.dirty.swap(true, Ordering::AcqRel) {
            self.changed.notify(&());
        }
    }

    fn freeze(&self) {
        *lock(&self.compute) = None;
        self.dirty.store(false, Ordering::Release);
        let inputs = std::mem::take(&mut *lock(&self.inputs));
        drop(inputs);
        debug!(message = "node.frozen");
    }
}

/// Puts the dirty flag back if a recomputation unwinds.
struct RedirtyOnUnwind<'a>(&'a AtomicBool);

impl Drop for RedirtyOnUnwind<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.store(true, Ordering::Release);
        }
    }
}

/// A node in an expression tree.
///
/// Cloning a `Node` creates a new handle to the **same** node.
pub struct Node<T: 'static> {
    shared: Arc<NodeShared<T>>,
}

impl<T: 'static> Clone for Node<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("result", &*lock(&self.shared.result))
            .field("dirty", &self.shared.dirty.load(Ordering::Acquire))
            .field("version", &self.shared.version.load(Ordering::Acquire))
            .finish()
    }
}

impl<T: Clone + Send + Sync + Default + 'static> Default for Node<T> {
    fn default() -> Self {
        Self::constant(T::default())
    }
}

impl<T: Clone + Send + Sync + 'static> Node<T> {
    fn from_parts(result: T, compute: Option<Compute<T>>) -> Self {
        Self {
            shared: Arc::new(NodeShared {
                result: Mutex::new(result),
                dirty: AtomicBool::new(false),
                version: AtomicU64::new(0),
                compute: Mutex::new(compute),
                inputs: Mutex::new(Vec::new()),
                changed: Subject::new(),
            }),
        }
    }

    /// Creates a node whose result never changes.
    #[must_use]
    pub fn constant(value: T) -> Self {
        Self::from_parts(value, None)
    }

    /// Creates a node that mirrors `value`.
    ///
    /// The node starts clean with the value's current contents.
    #[must_use]
    pub fn from_value(value: &Value<T>) -> Self {
        let source = Arc::new(Mutex::new(value.downgrade()));
        let reader = Arc::clone(&source);
        let node = Self::from_parts(
            value.get(),
            Some(Box::new(move || lock(&reader).get())),
        );

        let on_change = value.subscribe(node.invalidator());

        let on_move = value.moved().subscribe(move |target: &Value<T>| {
            *lock(&source) = target.downgrade();
        });

        let weak = node.downgrade();
        let on_destroy = value.destroyed().subscribe(move |_: &()| {
            if let Some(shared) = weak.upgrade() {
                shared.freeze();
            }
        });

        node.hold([on_change, on_move, on_destroy]);
        node
    }

    /// Creates a node computing `op(a)`.
    pub fn unary<A>(mut op: impl FnMut(A) -> T + Send + 'static, a: Node<A>) -> Self
    where
        A: Clone + Send + Sync + 'static,
    {
        let child = a.clone();
        let node = Self::derived(move || op(child.evaluated()));
        node.watch(&a);
        node
    }

    /// Creates a node computing `op(a, b)`.
    pub fn binary<A, B>(mut op: impl FnMut(A, B) -> T + Send + 'static, a: Node<A>, b: Node<B>) -> Self
    where
        A: Clone + Send + Sync + 'static,
        B: Clone + Send + Sync + 'static,
    {
        let (first, second) = (a.clone(), b.clone());
        let node = Self::derived(move || op(first.evaluated(), second.evaluated()));
        node.watch(&a);
        node.watch(&b);
        node
    }

    /// Creates a node computing `op(a, b, c)`.
    pub fn ternary<A, B, C>(
        mut op: impl FnMut(A, B, C) -> T + Send + 'static,
        a: Node<A>,
        b: Node<B>,
        c: Node<C>,
    ) -> Self
    where
        A: Clone + Send + Sync + 'static,
        B: Clone + Send + Sync + 'static,
        C: Clone + Send + Sync + 'static,
    {
        let (first, second, third) = (a.clone(), b.clone(), c.clone());
        let node = Self::derived(move || {
            op(first.evaluated(), second.evaluated(), third.evaluated())
        });
        node.watch(&a);
        node.watch(&b);
        node.watch(&c);
        node
    }

    /// Creates a node computing `op(&[results of inputs])`.
    ///
    /// Each input is evaluated exactly once per recomputation, in order.
    pub fn nary<A>(mut op: impl FnMut(&[A]) -> T + Send + 'static, inputs: Vec<Node<A>>) -> Self
    where
        A: Clone + Send + Sync + 'static,
    {
        let children = inputs.clone();
        let node = Self::derived(move || {
            let args: Vec<A> = children.iter().map(Node::evaluated).collect();
            op(&args)
        });
        for input in &inputs {
            node.watch(input);
        }
        node
    }

    /// Runs `compute` once for the initial result and keeps it for later
    /// recomputation.
    fn derived(mut compute: impl FnMut() -> T + Send + 'static) -> Self {
        let initial = compute();
        Self::from_parts(initial, Some(Box::new(move || Some(compute()))))
    }

    /// Recomputes the result if the node is dirty.
    pub fn eval(&self) {
        let shared = &self.shared;
        if !shared.dirty.load(Ordering::Acquire) {
            return;
        }

        let mut compute = lock(&shared.compute);
        // Cleared before computing so that an input changing mid-computation
        // marks the node dirty again and notifies.
        if !shared.dirty.swap(false, Ordering::AcqRel) {
            return;
        }
        let Some(compute) = compute.as_mut() else {
            return;
        };
        let _unwind = RedirtyOnUnwind(&shared.dirty);
        if let Some(result) = compute() {
            *lock(&shared.result) = result;
            shared.version.fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Returns a copy of the cached result without evaluating.
    #[must_use]
    pub fn get(&self) -> T {
        lock(&self.shared.result).clone()
    }

    /// Calls `f` with the cached result without evaluating.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&lock(&self.shared.result))
    }

    fn evaluated(&self) -> T {
        self.eval();
        self.get()
    }
}

impl<T: Send + Sync + 'static> Node<T> {
    /// Attaches `observer`; it is called when the node becomes dirty.
    pub fn subscribe(&self, observer: impl Fn() + Send + Sync + 'static) -> InfiniteSubscription {
        self.shared.changed.subscribe(move |_: &()| observer())
    }

    /// Returns `true` if an input changed since the last evaluation.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.shared.dirty.load(Ordering::Acquire)
    }

    /// Marks the node dirty and notifies observers if it was clean.
    pub fn invalidate(&self) {
        self.shared.invalidate();
    }

    /// Number of recomputations so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.shared.version.load(Ordering::Acquire)
    }

    fn downgrade(&self) -> Weak<NodeShared<T>> {
        Arc::downgrade(&self.shared)
    }

    fn invalidator(&self) -> impl Fn() + Send + Sync + 'static {
        let weak = self.downgrade();
        move || {
            if let Some(shared) = weak.upgrade() {
                shared.invalidate();
            }
        }
    }

    /// Invalidates this node whenever `input` becomes dirty.
    fn watch<U: Send + Sync + 'static>(&self, input: &Node<U>) {
        let subscription = input.subscribe(self.invalidator());
        self.hold([subscription]);
    }

    fn hold<const N: usize>(&self, subscriptions: [InfiniteSubscription; N]) {
        lock(&self.shared.inputs).extend(subscriptions.into_iter().map(UniqueSubscription::from));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn constant_is_clean() {
        let node = Node::constant(5);
        assert!(!node.is_dirty());
        node.eval();
        assert_eq!(node.get(), 5);
        assert_eq!(node.version(), 0);
    }

    #[test]
    fn default_node_holds_default() {
        let node = Node::<String>::default();
        assert_eq!(node.get(), "");
    }

    #[test]
    fn value_node_tracks_value() {
        let value = Value::new(5);
        let node = Node::from_value(&value);
        assert_eq!(node.get(), 5);
        assert!(!node.is_dirty());

        value.set(7).unwrap();
        assert!(node.is_dirty());
        assert_eq!(node.get(), 5);
        node.eval();
        assert_eq!(node.get(), 7);
        assert!(!node.is_dirty());
    }

    #[test]
    fn value_node_freezes_when_value_destroyed() {
        let value = Value::new(5);
        let node = Node::from_value(&value);
        value.set(7).unwrap();
        drop(value);
        assert!(!node.is_dirty());
        assert_eq!(node.get(), 5);
        node.invalidate();
        node.eval();
        assert!(!node.is_dirty());
        assert_eq!(node.get(), 5);
    }

    #[test]
    fn value_node_follows_move() {
        let source = Value::new(1);
        let node = Node::from_value(&source);
        let mut destination = Value::new(0);
        destination.assign_from(source);

        destination.set(9).unwrap();
        assert!(node.is_dirty());
        node.eval();
        assert_eq!(node.get(), 9);
    }

    #[test]
    fn binary_is_lazy() {
        let a = Value::new(1);
        let b = Value::new(2);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let sum = Node::binary(
            move |x: i32, y: i32| {
                counter.fetch_add(1, Ordering::SeqCst);
                x + y
            },
            Node::from_value(&a),
            Node::from_value(&b),
        );
        assert_eq!(sum.get(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        a.set(10).unwrap();
        b.set(20).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        sum.eval();
        assert_eq!(sum.get(), 30);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(sum.version(), 1);
    }

    #[test]
    fn notifies_once_per_dirty_cycle() {
        let a = Value::new(1);
        let node = Node::unary(|x: i32| x * 2, Node::from_value(&a));
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notified);
        let _sub = node.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        a.set(2).unwrap();
        a.set(3).unwrap();
        assert_eq!(notified.load(Ordering::SeqCst), 1);

        node.eval();
        assert_eq!(node.get(), 6);
        a.set(4).unwrap();
        assert_eq!(notified.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn ternary_combines_three_children() {
        let flag = Value::new(true);
        let node = Node::ternary(
            |c: bool, t: i32, f: i32| if c { t } else { f },
            Node::from_value(&flag),
            Node::constant(1),
            Node::constant(2),
        );
        assert_eq!(node.get(), 1);
        flag.set(false).unwrap();
        node.eval();
        assert_eq!(node.get(), 2);
    }

    #[test]
    fn nary_sums_children() {
        let values: Vec<_> = (1..=4).map(Value::new).collect();
        let node = Node::nary(
            |xs: &[i32]| xs.iter().sum::<i32>(),
            values.iter().map(Node::from_value).collect(),
        );
        assert_eq!(node.get(), 10);
        values[2].set(30).unwrap();
        node.eval();
        assert_eq!(node.get(), 37);
    }

    #[test]
    fn diamond_dependency() {
        let a = Value::new(1);
        let leaf = Node::from_value(&a);
        let left = Node::unary(|x: i32| x + 1, leaf.clone());
        let right = Node::unary(|x: i32| x * 10, leaf);
        let top = Node::binary(|l: i32, r: i32| l + r, left, right);
        assert_eq!(top.get(), 12);
        a.set(2).unwrap();
        top.eval();
        assert_eq!(top.get(), 23);
    }

    #[test]
    fn clone_shares_state() {
        let a = Value::new(1);
        let node = Node::unary(|x: i32| x, Node::from_value(&a));
        let other = node.clone();
        a.set(5).unwrap();
        other.eval();
        assert_eq!(node.get(), 5);
        assert!(!node.is_dirty());
    }

    #[test]
    fn invalidate_forces_recompute() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let node = Node::unary(
            move |x: i32| {
                counter.fetch_add(1, Ordering::SeqCst);
                x
            },
            Node::constant(3),
        );
        node.invalidate();
        node.eval();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(node.version(), 1);
    }

    #[test]
    fn panicking_op_keeps_node_dirty() {
        let a = Value::new(1);
        let node = Node::unary(
            |x: i32| {
                assert!(x < 100, "too large");
                x
            },
            Node::from_value(&a),
        );
        a.set(500).unwrap();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| node.eval()));
        assert!(result.is_err());
        assert!(node.is_dirty());
        assert_eq!(node.get(), 1);

        a.set(2).unwrap();
        node.eval();
        assert_eq!(node.get(), 2);
    }

    #[test]
    fn dropped_node_detaches_from_value() {
        let a = Value::new(1);
        let node = Node::from_value(&a);
        drop(node);
        // Both the bare observer and lifecycle observers are gone.
        a.set(2).unwrap();
        assert!(a.destroyed().is_empty());
        assert!(a.moved().is_empty());
    }

    #[test]
    fn debug_format() {
        let node = Node::constant(42);
        let debug = format!("{node:?}");
        assert!(debug.contains("42"));
        assert!(debug.contains("dirty: false"));
    }
}
