//! CLI support for vsql
//!
//! The subcommands of the `vsql` binary as library functions, so they can
//! be driven without a process.

mod check;
mod compile;
mod types;

pub use check::{execute_check, CheckOptions, CheckResult};
pub use compile::{execute_compile, CompileOptions, ExprEntry, OrderEntry, QueryDescription};
pub use types::types_overview;

use std::io;

use crate::error::VsqlError;
use crate::schema::Schema;

/// Errors that can occur during CLI operations
#[derive(Debug)]
pub enum CliError {
    /// Compiling or validating failed
    Vsql(VsqlError),
    /// JSON parsing error
    Json(serde_json::Error),
    /// IO error
    Io(io::Error),
    /// No input provided
    NoInput,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Vsql(e) => write!(f, "{}", e),
            CliError::Json(e) => write!(f, "Invalid JSON: {}", e),
            CliError::Io(e) => write!(f, "IO error: {}", e),
            CliError::NoInput => write!(f, "No input provided. Pass a file or pipe JSON to stdin."),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Vsql(e) => Some(e),
            CliError::Json(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::NoInput => None,
        }
    }
}

impl From<VsqlError> for CliError {
    fn from(e: VsqlError) -> Self {
        CliError::Vsql(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

/// The schema definition `schema`, or an empty one without it.
fn load_schema(schema: Option<&str>) -> Result<Schema, CliError> {
    match schema {
        Some(json) => Ok(Schema::from_json(json)?),
        None => Ok(Schema::default()),
    }
}
