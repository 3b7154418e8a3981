#![forbid(unsafe_code)]

//! Conversion of operands into expression nodes, and lifting of plain
//! functions over them.
//!
//! Any operand that implements [`IntoNode<T>`] can appear in an expression:
//!
//! | Operand                        | Becomes                 |
//! |--------------------------------|-------------------------|
//! | `&Value<T>`, `&Property<T>`    | value-reference node    |
//! | `Node<T>`, `&Node<T>`          | the node itself         |
//! | primitives, `String`, `Const`  | constant node           |
//!
//! Only the first two rows are [`Observable`]: an expression passed to
//! `observe` must contain at least one of them at its root.

use crate::expr::node::Node;
use crate::property::Property;
use crate::value::Value;

/// Operand convertible into a [`Node<T>`].
pub trait IntoNode<T> {
    /// Performs the conversion.
    fn into_node(self) -> Node<T>;
}

/// An operand that is itself observable: a value, property or expression.
pub trait Observable<T>: IntoNode<T> {}

/// Wraps an arbitrary value so it can be used as a constant operand.
///
/// Primitives and `String` convert on their own; use `Const` for other
/// types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Const<T>(pub T);

impl<T: Clone + Send + Sync + 'static> IntoNode<T> for Const<T> {
    fn into_node(self) -> Node<T> {
        Node::constant(self.0)
    }
}

impl<T: Clone + Send + Sync + 'static> IntoNode<T> for &Value<T> {
    fn into_node(self) -> Node<T> {
        Node::from_value(self)
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> for &Value<T> {}

impl<T: Clone + Send + Sync + 'static> IntoNode<T> for &Property<T> {
    fn into_node(self) -> Node<T> {
        Node::from_value(self.value())
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> for &Property<T> {}

impl<T: 'static> IntoNode<T> for Node<T> {
    fn into_node(self) -> Node<T> {
        self
    }
}

impl<T: 'static> Observable<T> for Node<T> {}

impl<T: 'static> IntoNode<T> for &Node<T> {
    fn into_node(self) -> Node<T> {
        self.clone()
    }
}

impl<T: 'static> Observable<T> for &Node<T> {}

macro_rules! constant_operands {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoNode<$ty> for $ty {
                fn into_node(self) -> Node<$ty> {
                    Node::constant(self)
                }
            }
        )*
    };
}

constant_operands!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char, String,
    &'static str,
);

/// Lifts a unary function over one operand.
pub fn lift1<A, T>(op: impl FnMut(A) -> T + Send + 'static, a: impl IntoNode<A>) -> Node<T>
where
    A: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    Node::unary(op, a.into_node())
}

/// Lifts a binary function over two operands.
///
/// ```
/// use observable::{Value, lift2};
///
/// let x = Value::new(3);
/// let y = Value::new(4);
/// let hyp = lift2(|a: i32, b: i32| ((a * a + b * b) as f64).sqrt(), &x, &y);
/// assert_eq!(hyp.get(), 5.0);
/// ```
pub fn lift2<A, B, T>(
    op: impl FnMut(A, B) -> T + Send + 'static,
    a: impl IntoNode<A>,
    b: impl IntoNode<B>,
) -> Node<T>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    Node::binary(op, a.into_node(), b.into_node())
}

/// Lifts a ternary function over three operands.
pub fn lift3<A, B, C, T>(
    op: impl FnMut(A, B, C) -> T + Send + 'static,
    a: impl IntoNode<A>,
    b: impl IntoNode<B>,
    c: impl IntoNode<C>,
) -> Node<T>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    Node::ternary(op, a.into_node(), b.into_node(), c.into_node())
}

/// Lifts a function over any number of operands of one type.
pub fn lift_n<A, T, I>(op: impl FnMut(&[A]) -> T + Send + 'static, inputs: I) -> Node<T>
where
    A: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    I: IntoIterator,
    I::Item: IntoNode<A>,
{
    Node::nary(op, inputs.into_iter().map(IntoNode::into_node).collect())
}

/// Builds a `U` from the results of two operands via `From<(A, B)>`.
pub fn construct<U, A, B>(a: impl IntoNode<A>, b: impl IntoNode<B>) -> Node<U>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
    U: From<(A, B)> + Clone + Send + Sync + 'static,
{
    lift2(|a: A, b: B| U::from((a, b)), a, b)
}
