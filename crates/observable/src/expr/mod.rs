#![forbid(unsafe_code)]

//! Expression trees over observable values.
//!
//! Expressions are built from [`Node`]s, either directly or through operator
//! overloads, the `lift*` functions and the filters in this module. A tree
//! is lazy: inputs only mark nodes dirty, and results are recomputed when
//! the tree is evaluated, usually by an [`Expression`] registered with an
//! evaluator.
//!
//! # Architecture
//!
//! - [`node`]: the node type with its dirty tracking.
//! - [`lift`]: operand conversion ([`IntoNode`]) and function lifting.
//! - [`operators`]: `std::ops` overloads and comparison functions.
//! - [`filters`]: select, min/max, mean, clamp, zip, conversions.
//! - [`math`]: floating-point and integer math functions.
//! - [`evaluator`]: [`Expression`], [`Evaluator`] and [`ImmediateEvaluator`].

pub mod evaluator;
pub mod filters;
pub mod lift;
pub mod math;
pub mod node;
pub mod operators;

pub use evaluator::{
    Evaluator, Expression, ExpressionEvaluator, ExpressionId, ImmediateEvaluator, Registration,
};
pub use filters::{
    PrimitiveCast, cast, clamp, convert, max, max_of, mean, min, min_of, select, zip, zip3,
};
pub use lift::{Const, IntoNode, Observable, construct, lift_n, lift1, lift2, lift3};
pub use node::Node;
pub use operators::{and, eq, ge, gt, le, lt, ne, or, pos};
