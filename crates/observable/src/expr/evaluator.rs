#![forbid(unsafe_code)]

//! Expressions and the evaluators that drive them.
//!
//! # Design
//!
//! An [`Expression<T>`] owns the root [`Node<T>`] of an expression tree and
//! acts as the [`ValueUpdater`] of the value it feeds. Evaluating the
//! expression evaluates the root and reports the result through the value
//! notifier.
//!
//! When to evaluate is decided by the evaluator the expression registers with:
//!
//! - [`ImmediateEvaluator`]: the expression re-evaluates as soon as its root
//!   becomes dirty.
//! - [`Evaluator`]: the expression re-evaluates only when
//!   [`Evaluator::eval_all`] is called.
//!
//! # Invariants
//!
//! 1. An expression is registered with its evaluator from construction until
//!    drop.
//! 2. `eval_all` evaluates the expressions registered when it starts, in
//!    registration order. Expressions dropped during the pass are skipped.
//! 3. The evaluator's queue lock is never held while expressions run.
//! 4. An expression's root is clean when the expression is constructed, so
//!    its first input change always reaches the evaluator.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::expr::node::Node;
use crate::logging::debug;
use crate::subscription::UniqueSubscription;
use crate::sync::lock;
use crate::value::{ValueNotifier, ValueUpdater};

// ─── Expression ids ──────────────────────────────────────────────────────────

static NEXT_EXPRESSION_ID: AtomicU64 = AtomicU64::new(1);

fn next_expression_id() -> ExpressionId {
    ExpressionId(NEXT_EXPRESSION_ID.fetch_add(1, Ordering::Relaxed))
}

/// Identifier of an expression registered with an [`Evaluator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpressionId(u64);

impl ExpressionId {
    /// Returns the raw id value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

// ─── Evaluators ──────────────────────────────────────────────────────────────

type EvalFn = Arc<dyn Fn() + Send + Sync>;
type Queue = Mutex<Vec<(ExpressionId, EvalFn)>>;

/// Decides when registered expressions are evaluated.
pub trait ExpressionEvaluator {
    /// Registers `eval`; it stays registered until the returned handle is
    /// dropped.
    fn register(&self, eval: EvalFn) -> Registration;

    /// Returns `true` if expressions should evaluate as soon as they become
    /// dirty instead of waiting to be run by the evaluator.
    fn is_immediate(&self) -> bool {
        false
    }
}

/// Evaluator that runs its expressions on demand.
///
/// Clones share the same set of registered expressions.
#[derive(Clone, Default)]
pub struct Evaluator {
    queue: Arc<Queue>,
}

impl Evaluator {
    /// Creates an evaluator with no registered expressions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `eval` and returns its id.
    pub fn insert(&self, eval: impl Fn() + Send + Sync + 'static) -> ExpressionId {
        self.push(Arc::new(eval))
    }

    /// Deregisters the expression with `id`. Returns `false` if it was not
    /// registered.
    pub fn remove(&self, id: ExpressionId) -> bool {
        remove_from(&self.queue, id)
    }

    /// Evaluates every registered expression.
    pub fn eval_all(&self) {
        let pending: Vec<EvalFn> = lock(&self.queue)
            .iter()
            .map(|(_, eval)| Arc::clone(eval))
            .collect();
        debug!(message = "evaluator.eval_all", expressions = pending.len());
        for eval in pending {
            eval();
        }
    }

    /// Number of registered expressions.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.queue).len()
    }

    /// Returns `true` if no expression is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.queue).is_empty()
    }

    fn push(&self, eval: EvalFn) -> ExpressionId {
        let id = next_expression_id();
        lock(&self.queue).push((id, eval));
        id
    }
}

fn remove_from(queue: &Queue, id: ExpressionId) -> bool {
    let mut queue = lock(queue);
    let before = queue.len();
    queue.retain(|(registered, _)| *registered != id);
    queue.len() != before
}

impl ExpressionEvaluator for Evaluator {
    fn register(&self, eval: EvalFn) -> Registration {
        let id = self.push(eval);
        Registration {
            link: Some((Arc::downgrade(&self.queue), id)),
        }
    }
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("expressions", &self.len())
            .finish()
    }
}

/// Evaluator for expressions that update as soon as an input changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateEvaluator;

impl ImmediateEvaluator {
    /// Does nothing: immediate expressions are always up to date.
    pub fn eval_all(&self) {}
}

impl ExpressionEvaluator for ImmediateEvaluator {
    fn register(&self, _eval: EvalFn) -> Registration {
        Registration { link: None }
    }

    fn is_immediate(&self) -> bool {
        true
    }
}

/// Keeps an expression registered with its evaluator; deregisters on drop.
#[must_use = "dropping the registration deregisters the expression"]
pub struct Registration {
    link: Option<(Weak<Queue>, ExpressionId)>,
}

impl Registration {
    /// The id assigned by the evaluator, or `None` for immediate evaluation.
    #[must_use]
    pub fn id(&self) -> Option<ExpressionId> {
        self.link.as_ref().map(|(_, id)| *id)
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some((queue, id)) = self.link.take() {
            if let Some(queue) = queue.upgrade() {
                remove_from(&queue, id);
            }
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration").field("id", &self.id()).finish()
    }
}

// ─── Expression ──────────────────────────────────────────────────────────────

struct ExpressionShared<T: 'static> {
    root: Node<T>,
    notifier: Mutex<Option<ValueNotifier<T>>>,
}

impl<T: Clone + Send + Sync + 'static> ExpressionShared<T> {
    fn eval(&self) {
        self.root.eval();
        let notifier = lock(&self.notifier).clone();
        if let Some(notify) = notifier {
            notify(self.root.get());
        }
    }
}

/// Root of an expression tree, registered with an evaluator.
pub struct Expression<T: 'static> {
    shared: Arc<ExpressionShared<T>>,
    registration: Registration,
    _root_subscription: Option<UniqueSubscription>,
}

impl<T: Clone + Send + Sync + 'static> Expression<T> {
    /// Wraps `root` and registers it with `evaluator`.
    ///
    /// `root` is evaluated first. A root that is already dirty would never
    /// notify again, since nodes only notify on the clean → dirty transition.
    pub fn new(root: Node<T>, evaluator: &impl ExpressionEvaluator) -> Self {
        root.eval();
        let shared = Arc::new(ExpressionShared {
            root,
            notifier: Mutex::new(None),
        });

        let registration = evaluator.register(Arc::new(eval_through(Arc::downgrade(&shared))));
        let root_subscription = evaluator.is_immediate().then(|| {
            let eval = eval_through(Arc::downgrade(&shared));
            UniqueSubscription::from(shared.root.subscribe(eval))
        });

        Self {
            shared,
            registration,
            _root_subscription: root_subscription,
        }
    }

    /// Wraps `root` for immediate evaluation.
    pub fn immediate(root: Node<T>) -> Self {
        Self::new(root, &ImmediateEvaluator)
    }

    /// Evaluates the root and reports the result to the value notifier.
    pub fn eval(&self) {
        self.shared.eval();
    }

    /// Returns the root's cached result.
    #[must_use]
    pub fn get(&self) -> T {
        self.shared.root.get()
    }

    /// The root node of this expression.
    #[must_use]
    pub fn root(&self) -> &Node<T> {
        &self.shared.root
    }

    /// The id assigned by the evaluator, or `None` for immediate evaluation.
    #[must_use]
    pub fn id(&self) -> Option<ExpressionId> {
        self.registration.id()
    }
}

fn eval_through<T: Clone + Send + Sync + 'static>(
    shared: Weak<ExpressionShared<T>>,
) -> impl Fn() + Send + Sync + 'static {
    move || {
        if let Some(shared) = shared.upgrade() {
            shared.eval();
        }
    }
}

impl<T: Clone + Send + Sync + 'static> ValueUpdater<T> for Expression<T> {
    fn set_value_notifier(&self, notifier: ValueNotifier<T>) {
        *lock(&self.shared.notifier) = Some(notifier);
    }

    fn get(&self) -> T {
        self.shared.root.get()
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Expression<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expression")
            .field("root", &self.shared.root)
            .field("id", &self.registration.id())
            .finish()
    }
}
