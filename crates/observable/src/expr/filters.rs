#![forbid(unsafe_code)]

//! Ready-made expression filters.

use crate::expr::lift::{IntoNode, lift1, lift2, lift3, lift_n};
use crate::expr::node::Node;

/// Picks `when_true` or `when_false` depending on `condition`.
///
/// Both branches stay subscribed; a change in the inactive branch still
/// marks the node dirty.
pub fn select<T>(
    condition: impl IntoNode<bool>,
    when_true: impl IntoNode<T>,
    when_false: impl IntoNode<T>,
) -> Node<T>
where
    T: Clone + Send + Sync + 'static,
{
    lift3(
        |condition: bool, when_true: T, when_false: T| {
            if condition { when_true } else { when_false }
        },
        condition,
        when_true,
        when_false,
    )
}

/// The smaller of two operands. Ties pick `a`.
pub fn min<T>(a: impl IntoNode<T>, b: impl IntoNode<T>) -> Node<T>
where
    T: PartialOrd + Clone + Send + Sync + 'static,
{
    lift2(|a: T, b: T| if b < a { b } else { a }, a, b)
}

/// The larger of two operands. Ties pick `a`.
pub fn max<T>(a: impl IntoNode<T>, b: impl IntoNode<T>) -> Node<T>
where
    T: PartialOrd + Clone + Send + Sync + 'static,
{
    lift2(|a: T, b: T| if b > a { b } else { a }, a, b)
}

fn pick<T: PartialOrd + Clone>(items: &[T], better: impl Fn(&T, &T) -> bool) -> Option<T> {
    let (first, rest) = items.split_first()?;
    let chosen = rest
        .iter()
        .fold(first, |best, item| if better(item, best) { item } else { best });
    Some(chosen.clone())
}

/// The smallest of any number of operands, or `None` if there are none.
pub fn min_of<T, I>(inputs: I) -> Node<Option<T>>
where
    T: PartialOrd + Clone + Send + Sync + 'static,
    I: IntoIterator,
    I::Item: IntoNode<T>,
{
    lift_n(|items: &[T]| pick(items, |a, b| a < b), inputs)
}

/// The largest of any number of operands, or `None` if there are none.
pub fn max_of<T, I>(inputs: I) -> Node<Option<T>>
where
    T: PartialOrd + Clone + Send + Sync + 'static,
    I: IntoIterator,
    I::Item: IntoNode<T>,
{
    lift_n(|items: &[T]| pick(items, |a, b| a > b), inputs)
}

/// Arithmetic mean of any number of operands; `NaN` if there are none.
pub fn mean<T, I>(inputs: I) -> Node<f64>
where
    T: Into<f64> + Clone + Send + Sync + 'static,
    I: IntoIterator,
    I::Item: IntoNode<T>,
{
    lift_n(
        |items: &[T]| {
            let sum: f64 = items.iter().map(|item| Into::<f64>::into(item.clone())).sum();
            sum / items.len() as f64
        },
        inputs,
    )
}

/// Restricts `value` to the `[low, high]` range.
pub fn clamp<T>(value: impl IntoNode<T>, low: impl IntoNode<T>, high: impl IntoNode<T>) -> Node<T>
where
    T: PartialOrd + Clone + Send + Sync + 'static,
{
    lift3(
        |value: T, low: T, high: T| {
            if value < low {
                low
            } else if value > high {
                high
            } else {
                value
            }
        },
        value,
        low,
        high,
    )
}

/// Pairs the results of two operands.
pub fn zip<A, B>(a: impl IntoNode<A>, b: impl IntoNode<B>) -> Node<(A, B)>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
{
    lift2(|a: A, b: B| (a, b), a, b)
}

/// Groups the results of three operands.
pub fn zip3<A, B, C>(a: impl IntoNode<A>, b: impl IntoNode<B>, c: impl IntoNode<C>) -> Node<(A, B, C)>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    lift3(|a: A, b: B, c: C| (a, b, c), a, b, c)
}

/// Converts the operand's result with `Into`.
///
/// ```
/// use observable::{Value, convert};
///
/// let count = Value::new(3_i32);
/// let as_float = convert::<f64, _>(&count);
/// assert_eq!(as_float.get(), 3.0);
/// ```
pub fn convert<U, A>(a: impl IntoNode<A>) -> Node<U>
where
    A: Into<U> + Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    lift1(|a: A| -> U { a.into() }, a)
}

/// Numeric conversion with `as` semantics: truncating, saturating for
/// float-to-int, wrapping for int-to-int.
pub trait PrimitiveCast<U> {
    /// Casts `self` to `U`.
    fn cast(self) -> U;
}

macro_rules! primitive_casts {
    ($($from:ty),* $(,)?) => {
        $(
            primitive_casts!(@to $from => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);
        )*
    };
    (@to $from:ty => $($to:ty),*) => {
        $(
            impl PrimitiveCast<$to> for $from {
                #[allow(clippy::cast_lossless, clippy::unnecessary_cast)]
                fn cast(self) -> $to {
                    self as $to
                }
            }
        )*
    };
}

primitive_casts!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

/// Casts the operand's result with `as`.
pub fn cast<U, A>(a: impl IntoNode<A>) -> Node<U>
where
    A: PrimitiveCast<U> + Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
{
    lift1(|a: A| PrimitiveCast::<U>::cast(a), a)
}
