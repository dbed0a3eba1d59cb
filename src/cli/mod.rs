//! CLI module for redquery
//!
//! Provides command-line interface for:
//! - search: compile a search chain to a query descriptor
//! - aggregate: compile an aggregation chain to a pipeline descriptor
//! - explain: human-readable summary of either compile

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, Mode};
pub use commands::{
    aggregate, aggregate_response, explain, explain_text, run, run_command, search,
    search_response, Config,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{decode_expr, parse_request, read_request, write_error, write_response, write_text};
