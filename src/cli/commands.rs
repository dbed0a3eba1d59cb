//! CLI command implementations
//!
//! Every command follows the same sequence:
//!
//! 1. Load configuration (optional file) and apply the log level
//! 2. Load the index schema
//! 3. Read one expression tree from stdin
//! 4. Compile and write the response to stdout
//!
//! A compile rejection is written as an error response and returned as an
//! error so the process exits non-zero. `explain` reports rejections as
//! explain text instead and succeeds.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::compiler::{CompilerConfig, Explain, PipelineCompiler, QueryAssembler};
use crate::expr::Expr;
use crate::observability::{CompileMetrics, Logger, Severity};
use crate::schema::{IndexSchema, SchemaLoader};

use super::args::{Cli, Command, Mode};
use super::errors::{CliError, CliResult};
use super::io::{decode_expr, read_request, write_error, write_response, write_text};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Compiler defaults (optional)
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Minimum log severity (optional, default "warn")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compiler: CompilerConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file; a missing file means defaults
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        self.compiler.validate().map_err(CliError::config_error)?;
        self.severity()?;
        Ok(())
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> CliResult<Severity> {
        self.log_level.parse().map_err(CliError::config_error)
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cli: Cli) -> CliResult<()> {
    let config = Config::load(&cli.config)?;
    Logger::set_min_severity(config.severity()?);

    let schema = SchemaLoader::load_file(&cli.schema)?;
    let metrics = CompileMetrics::new();

    let result = match cli.command {
        Command::Search => search(&schema, &config, &metrics),
        Command::Aggregate => aggregate(&schema, &config, &metrics),
        Command::Explain { mode } => explain(&schema, &config, mode),
    };

    let snapshot = metrics.snapshot();
    Logger::info(
        "CLI_COMPILE_METRICS",
        &[
            ("aggregations_compiled", &snapshot.aggregations_compiled.to_string()),
            ("compile_failures", &snapshot.compile_failures.to_string()),
            ("queries_compiled", &snapshot.queries_compiled.to_string()),
            ("stages_skipped", &snapshot.stages_skipped.to_string()),
        ],
    );

    result
}

/// Compile a search chain from stdin
pub fn search(schema: &IndexSchema, config: &Config, metrics: &CompileMetrics) -> CliResult<()> {
    let expr = decode_expr(read_request()?)?;
    respond(search_response(&expr, schema, config, metrics))
}

/// Compile an aggregation chain from stdin
pub fn aggregate(schema: &IndexSchema, config: &Config, metrics: &CompileMetrics) -> CliResult<()> {
    let expr = decode_expr(read_request()?)?;
    respond(aggregate_response(&expr, schema, config, metrics))
}

/// Explain a compile from stdin
pub fn explain(schema: &IndexSchema, config: &Config, mode: Mode) -> CliResult<()> {
    let expr = decode_expr(read_request()?)?;
    write_text(&explain_text(&expr, schema, config, mode)?)
}

fn respond(result: CliResult<Value>) -> CliResult<()> {
    match result {
        Ok(data) => write_response(data),
        Err(err) => {
            write_error(err.code_str(), err.message())?;
            Err(err)
        }
    }
}

/// Response data of a search compile: descriptor and engine arguments
pub fn search_response(
    expr: &Expr,
    schema: &IndexSchema,
    config: &Config,
    metrics: &CompileMetrics,
) -> CliResult<Value> {
    let descriptor = QueryAssembler::new(schema)
        .with_config(config.compiler)
        .with_metrics(metrics)
        .compile(expr)?;

    Ok(json!({
        "descriptor": serde_json::to_value(&descriptor)?,
        "args": descriptor.to_args(),
    }))
}

/// Response data of an aggregation compile: descriptor and engine arguments
pub fn aggregate_response(
    expr: &Expr,
    schema: &IndexSchema,
    config: &Config,
    metrics: &CompileMetrics,
) -> CliResult<Value> {
    let descriptor = PipelineCompiler::new(schema)
        .with_config(config.compiler)
        .with_metrics(metrics)
        .compile(expr)?;

    Ok(json!({
        "descriptor": serde_json::to_value(&descriptor)?,
        "args": descriptor.to_args(),
    }))
}

/// Explain text of a compile, accepted or rejected
pub fn explain_text(
    expr: &Expr,
    schema: &IndexSchema,
    config: &Config,
    mode: Mode,
) -> CliResult<String> {
    let explain = match mode {
        Mode::Search => match QueryAssembler::new(schema)
            .with_config(config.compiler)
            .compile(expr)
        {
            Ok(descriptor) => Explain::from_query(&descriptor),
            Err(err) => Explain::from_error(&err),
        },
        Mode::Aggregate => match PipelineCompiler::new(schema)
            .with_config(config.compiler)
            .compile(expr)
        {
            Ok(descriptor) => Explain::from_aggregation(&descriptor),
            Err(err) => Explain::from_error(&err),
        },
    };

    Ok(explain.to_string())
}
