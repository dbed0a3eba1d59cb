//! CLI argument definitions using clap
//!
//! Commands:
//! - redquery search
//! - redquery aggregate
//! - redquery explain --mode <search|aggregate>

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// redquery - compile query expression trees to search engine commands
#[derive(Parser, Debug)]
#[command(name = "redquery")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = "./redquery.json")]
    pub config: PathBuf,

    /// Path to the index schema file
    #[arg(long, global = true, default_value = "./schema.json")]
    pub schema: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a search chain read from stdin
    Search,

    /// Compile an aggregation chain read from stdin
    Aggregate,

    /// Print the explain output of a compile
    Explain {
        /// Which compiler to run
        #[arg(long, value_enum, default_value_t = Mode::Search)]
        mode: Mode,
    },
}

/// Compiler selection for `explain`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Search,
    Aggregate,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
