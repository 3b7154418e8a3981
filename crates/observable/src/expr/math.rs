#![forbid(unsafe_code)]

//! Math functions lifted over expression operands.
//!
//! Floating-point functions are available for `f32` and `f64` through
//! [`Real`]; [`abs`] also covers signed integers through [`Abs`].

use std::ops::{Div, Rem};

use crate::expr::lift::{IntoNode, lift1, lift2};
use crate::expr::node::Node;

/// Floating-point operations used by the math filters.
#[allow(missing_docs)]
pub trait Real: Copy + Send + Sync + 'static {
    fn exp(self) -> Self;
    fn exp2(self) -> Self;
    fn ln(self) -> Self;
    fn log10(self) -> Self;
    fn log2(self) -> Self;
    fn powf(self, exponent: Self) -> Self;
    fn sqrt(self) -> Self;
    fn cbrt(self) -> Self;
    fn hypot(self, other: Self) -> Self;
    fn sin(self) -> Self;
    fn cos(self) -> Self;
    fn tan(self) -> Self;
    fn asin(self) -> Self;
    fn acos(self) -> Self;
    fn atan(self) -> Self;
    fn atan2(self, other: Self) -> Self;
    fn ceil(self) -> Self;
    fn floor(self) -> Self;
    fn trunc(self) -> Self;
    fn round(self) -> Self;
}

macro_rules! impl_real {
    ($($ty:ty),*) => {
        $(
            impl Real for $ty {
                fn exp(self) -> Self { <$ty>::exp(self) }
                fn exp2(self) -> Self { <$ty>::exp2(self) }
                fn ln(self) -> Self { <$ty>::ln(self) }
                fn log10(self) -> Self { <$ty>::log10(self) }
                fn log2(self) -> Self { <$ty>::log2(self) }
                fn powf(self, exponent: Self) -> Self { <$ty>::powf(self, exponent) }
                fn sqrt(self) -> Self { <$ty>::sqrt(self) }
                fn cbrt(self) -> Self { <$ty>::cbrt(self) }
                fn hypot(self, other: Self) -> Self { <$ty>::hypot(self, other) }
                fn sin(self) -> Self { <$ty>::sin(self) }
                fn cos(self) -> Self { <$ty>::cos(self) }
                fn tan(self) -> Self { <$ty>::tan(self) }
                fn asin(self) -> Self { <$ty>::asin(self) }
                fn acos(self) -> Self { <$ty>::acos(self) }
                fn atan(self) -> Self { <$ty>::atan(self) }
                fn atan2(self, other: Self) -> Self { <$ty>::atan2(self, other) }
                fn ceil(self) -> Self { <$ty>::ceil(self) }
                fn floor(self) -> Self { <$ty>::floor(self) }
                fn trunc(self) -> Self { <$ty>::trunc(self) }
                fn round(self) -> Self { <$ty>::round(self) }
            }
        )*
    };
}

impl_real!(f32, f64);

/// Absolute value.
pub trait Abs: Copy + Send + Sync + 'static {
    /// Returns the magnitude of `self`.
    fn abs(self) -> Self;
}

macro_rules! impl_abs {
    ($($ty:ty),*) => {
        $(
            impl Abs for $ty {
                fn abs(self) -> Self { <$ty>::abs(self) }
            }
        )*
    };
}

impl_abs!(i8, i16, i32, i64, i128, isize, f32, f64);

macro_rules! real_unary {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $name<T: Real>(x: impl IntoNode<T>) -> Node<T> {
                lift1(T::$name, x)
            }
        )*
    };
}

real_unary!(
    /// `e^x`.
    exp,
    /// `2^x`.
    exp2,
    /// Base-10 logarithm.
    log10,
    /// Base-2 logarithm.
    log2,
    /// Square root.
    sqrt,
    /// Cube root.
    cbrt,
    /// Sine (radians).
    sin,
    /// Cosine (radians).
    cos,
    /// Tangent (radians).
    tan,
    /// Arcsine.
    asin,
    /// Arccosine.
    acos,
    /// Arctangent.
    atan,
    /// Rounds towards positive infinity.
    ceil,
    /// Rounds towards negative infinity.
    floor,
    /// Rounds towards zero.
    trunc,
    /// Rounds half away from zero.
    round,
);

/// Natural logarithm.
pub fn log<T: Real>(x: impl IntoNode<T>) -> Node<T> {
    lift1(T::ln, x)
}

/// `base^exponent`.
pub fn pow<T: Real>(base: impl IntoNode<T>, exponent: impl IntoNode<T>) -> Node<T> {
    lift2(T::powf, base, exponent)
}

/// `sqrt(x² + y²)` without intermediate overflow.
pub fn hypot<T: Real>(x: impl IntoNode<T>, y: impl IntoNode<T>) -> Node<T> {
    lift2(T::hypot, x, y)
}

/// Four-quadrant arctangent of `y / x`.
pub fn atan2<T: Real>(y: impl IntoNode<T>, x: impl IntoNode<T>) -> Node<T> {
    lift2(T::atan2, y, x)
}

/// Absolute value.
pub fn abs<T: Abs>(x: impl IntoNode<T>) -> Node<T> {
    lift1(T::abs, x)
}

/// Integer quotient and remainder as a `(quotient, remainder)` pair.
///
/// Division by zero panics during evaluation, like the `/` operator.
pub fn div<T>(numerator: impl IntoNode<T>, denominator: impl IntoNode<T>) -> Node<(T, T)>
where
    T: Div<Output = T> + Rem<Output = T> + Copy + Send + Sync + 'static,
{
    lift2(|n: T, d: T| (n / d, n % d), numerator, denominator)
}
