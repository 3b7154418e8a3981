#![forbid(unsafe_code)]

//! Operator overloads that build expression nodes.
//!
//! Arithmetic, bitwise and shift operators from `std::ops` are implemented
//! for `&Value<T>`, `Node<T>` and `&Node<T>` on the left, with any
//! [`IntoNode<T>`] operand on the right. Primitive left-hand operands are
//! supported too, so `2_i32 * &value` works as well as `&value * 2`. A
//! literal on the left needs its type suffix.
//!
//! Comparison and logical operators cannot be overloaded to return a node in
//! Rust; they are provided as functions ([`eq`], [`lt`], [`and`], ...).
//!
//! ```
//! use observable::Value;
//!
//! let a = Value::new(5);
//! let b = Value::new(7);
//! let sum = &a + &b;
//! assert_eq!(sum.get(), 12);
//!
//! a.set(1).unwrap();
//! sum.eval();
//! assert_eq!(sum.get(), 8);
//! ```

use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Rem, Shl, Shr, Sub};

use crate::expr::lift::{IntoNode, lift1, lift2};
use crate::expr::node::Node;
use crate::value::Value;

macro_rules! binary_operator {
    ($Trait:ident, $method:ident, $op:tt) => {
        binary_operator!(@lhs $Trait, $method, $op, &'a Value<T>);
        binary_operator!(@lhs $Trait, $method, $op, Node<T>);
        binary_operator!(@lhs $Trait, $method, $op, &'a Node<T>);
    };
    (@lhs $Trait:ident, $method:ident, $op:tt, $Lhs:ty) => {
        impl<'a, T, R> $Trait<R> for $Lhs
        where
            T: $Trait + Clone + Send + Sync + 'static,
            <T as $Trait>::Output: Clone + Send + Sync + 'static,
            R: IntoNode<T>,
        {
            type Output = Node<<T as $Trait>::Output>;

            fn $method(self, rhs: R) -> Self::Output {
                lift2(|a: T, b: T| a $op b, self, rhs)
            }
        }
    };
}

binary_operator!(Add, add, +);
binary_operator!(Sub, sub, -);
binary_operator!(Mul, mul, *);
binary_operator!(Div, div, /);
binary_operator!(Rem, rem, %);
binary_operator!(BitAnd, bitand, &);
binary_operator!(BitOr, bitor, |);
binary_operator!(BitXor, bitxor, ^);
binary_operator!(Shl, shl, <<);
binary_operator!(Shr, shr, >>);

macro_rules! unary_operator {
    ($Trait:ident, $method:ident, $op:tt) => {
        unary_operator!(@lhs $Trait, $method, $op, &'a Value<T>);
        unary_operator!(@lhs $Trait, $method, $op, Node<T>);
        unary_operator!(@lhs $Trait, $method, $op, &'a Node<T>);
    };
    (@lhs $Trait:ident, $method:ident, $op:tt, $Operand:ty) => {
        impl<'a, T> $Trait for $Operand
        where
            T: $Trait + Clone + Send + Sync + 'static,
            <T as $Trait>::Output: Clone + Send + Sync + 'static,
        {
            type Output = Node<<T as $Trait>::Output>;

            fn $method(self) -> Self::Output {
                lift1(|a: T| $op a, self)
            }
        }
    };
}

unary_operator!(Neg, neg, -);
unary_operator!(Not, not, !);

// Primitive on the left: `2_i32 * &value`.
macro_rules! primitive_lhs {
    ($($ty:ty),* $(,)?) => {
        $(
            primitive_lhs!(@ops $ty: Add add +, Sub sub -, Mul mul *, Div div /, Rem rem %);
        )*
    };
    (@ops $ty:ty: $($Trait:ident $method:ident $op:tt),*) => {
        $(
            impl<'a> $Trait<&'a Value<$ty>> for $ty {
                type Output = Node<$ty>;

                fn $method(self, rhs: &'a Value<$ty>) -> Node<$ty> {
                    lift2(|a: $ty, b: $ty| a $op b, self, rhs)
                }
            }

            impl $Trait<Node<$ty>> for $ty {
                type Output = Node<$ty>;

                fn $method(self, rhs: Node<$ty>) -> Node<$ty> {
                    lift2(|a: $ty, b: $ty| a $op b, self, rhs)
                }
            }

            impl<'a> $Trait<&'a Node<$ty>> for $ty {
                type Output = Node<$ty>;

                fn $method(self, rhs: &'a Node<$ty>) -> Node<$ty> {
                    lift2(|a: $ty, b: $ty| a $op b, self, rhs)
                }
            }
        )*
    };
}

primitive_lhs!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

// ─── Comparison and logic ────────────────────────────────────────────────────

/// `a == b`.
pub fn eq<T>(a: impl IntoNode<T>, b: impl IntoNode<T>) -> Node<bool>
where
    T: PartialEq + Clone + Send + Sync + 'static,
{
    lift2(|a: T, b: T| a == b, a, b)
}

/// `a != b`.
pub fn ne<T>(a: impl IntoNode<T>, b: impl IntoNode<T>) -> Node<bool>
where
    T: PartialEq + Clone + Send + Sync + 'static,
{
    lift2(|a: T, b: T| a != b, a, b)
}

/// `a < b`.
pub fn lt<T>(a: impl IntoNode<T>, b: impl IntoNode<T>) -> Node<bool>
where
    T: PartialOrd + Clone + Send + Sync + 'static,
{
    lift2(|a: T, b: T| a < b, a, b)
}

/// `a <= b`.
pub fn le<T>(a: impl IntoNode<T>, b: impl IntoNode<T>) -> Node<bool>
where
    T: PartialOrd + Clone + Send + Sync + 'static,
{
    lift2(|a: T, b: T| a <= b, a, b)
}

/// `a > b`.
pub fn gt<T>(a: impl IntoNode<T>, b: impl IntoNode<T>) -> Node<bool>
where
    T: PartialOrd + Clone + Send + Sync + 'static,
{
    lift2(|a: T, b: T| a > b, a, b)
}

/// `a >= b`.
pub fn ge<T>(a: impl IntoNode<T>, b: impl IntoNode<T>) -> Node<bool>
where
    T: PartialOrd + Clone + Send + Sync + 'static,
{
    lift2(|a: T, b: T| a >= b, a, b)
}

/// Logical `a && b`. Both operands are always evaluated.
pub fn and(a: impl IntoNode<bool>, b: impl IntoNode<bool>) -> Node<bool> {
    lift2(|a: bool, b: bool| a && b, a, b)
}

/// Logical `a || b`. Both operands are always evaluated.
pub fn or(a: impl IntoNode<bool>, b: impl IntoNode<bool>) -> Node<bool> {
    lift2(|a: bool, b: bool| a || b, a, b)
}

/// Unary plus: a node with the operand's result.
pub fn pos<T>(a: impl IntoNode<T>) -> Node<T>
where
    T: Clone + Send + Sync + 'static,
{
    lift1(|a: T| a, a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_plus_value() {
        let a = Value::new(5);
        let b = Value::new(7);
        let sum = &a + &b;
        assert_eq!(sum.get(), 12);
        b.set(1).unwrap();
        sum.eval();
        assert_eq!(sum.get(), 6);
    }

    #[test]
    fn constants_on_either_side() {
        let a = Value::new(3_i32);
        let left = &a * 2;
        let right = 10_i32 - &a;
        a.set(4).unwrap();
        left.eval();
        right.eval();
        assert_eq!(left.get(), 8);
        assert_eq!(right.get(), 6);
    }

    #[test]
    fn nested_expression() {
        let a = Value::new(2);
        let b = Value::new(3);
        let expr = (&a + &b) * (&a - 1) % 7;
        assert_eq!(expr.get(), 5);
        a.set(4).unwrap();
        expr.eval();
        assert_eq!(expr.get(), (4 + 3) * (4 - 1) % 7);
    }

    #[test]
    fn node_reference_operands() {
        let a = Value::new(6);
        let doubled = &a * 2;
        let total = &doubled + &doubled;
        a.set(1).unwrap();
        total.eval();
        assert_eq!(total.get(), 4);
    }

    #[test]
    fn bitwise_and_shift() {
        let a = Value::new(0b1100_u8);
        let masked = &a & 0b0100;
        let shifted = &a << 1;
        let flipped = &a ^ 0xFF;
        assert_eq!(masked.get(), 0b0100);
        assert_eq!(shifted.get(), 0b1_1000);
        assert_eq!(flipped.get(), 0b1111_0011);
    }

    #[test]
    fn unary_operators() {
        let a = Value::new(4);
        let negated = -&a;
        let flag = Value::new(false);
        let inverted = !&flag;
        assert_eq!(negated.get(), -4);
        assert!(inverted.get());
        flag.set(true).unwrap();
        inverted.eval();
        assert!(!inverted.get());
    }

    #[test]
    fn comparisons() {
        let a = Value::new(3);
        let less = lt(&a, 5);
        let equal = eq(&a, 3);
        let not_equal = ne(&a, 3);
        let at_least = ge(&a, 3);
        assert!(less.get() && equal.get() && at_least.get());
        assert!(!not_equal.get());
        a.set(9).unwrap();
        for node in [&less, &equal, &not_equal, &at_least] {
            node.eval();
        }
        assert!(!less.get() && !equal.get() && at_least.get());
        assert!(not_equal.get());
        assert!(gt(&a, 8).get());
        assert!(le(&a, 9).get());
    }

    #[test]
    fn logical_operators() {
        let a = Value::new(true);
        let b = Value::new(false);
        let both = and(&a, &b);
        let either = or(&a, &b);
        assert!(!both.get());
        assert!(either.get());
        b.set(true).unwrap();
        both.eval();
        assert!(both.get());
    }

    #[test]
    fn pos_is_identity() {
        let a = Value::new(-2);
        let node = pos(&a);
        a.set(5).unwrap();
        node.eval();
        assert_eq!(node.get(), 5);
    }

    #[test]
    fn float_division() {
        let a = Value::new(9.0_f64);
        let half = &a / 2.0;
        assert_eq!(half.get(), 4.5);
        let inverse = 1.0_f64 / &a;
        a.set(4.0).unwrap();
        inverse.eval();
        assert_eq!(inverse.get(), 0.25);
    }
}
