//! redquery - A strict, deterministic compiler from query expression trees
//! to secondary-index search and aggregation commands

pub mod cli;
pub mod compiler;
pub mod expr;
pub mod observability;
pub mod schema;
