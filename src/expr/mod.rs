//! Query expression trees
//!
//! The input side of the compiler. An application builds these trees through
//! its own query builder (method chaining over filters, projections, sorts
//! and aggregation stages); the compiler only reads them.
//!
//! # Shape
//!
//! - Closed node set: binary, unary, member reference, constant, call,
//!   lambda and record construction
//! - Stage chains are left-nested calls: the first argument of every stage
//!   call is the stage it was chained onto
//! - Trees decode from tagged JSON (`{"kind": "binary", ...}`)

mod node;

pub use node::{stringify, BinaryOp, Expr, UnaryOp};
