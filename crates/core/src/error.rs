// Central Error Type for probe execution

use thiserror::Error;

use crate::domain::PlatformKind;
use crate::port::command_runner::RunnerError;
use crate::port::management_query::QueryError;
use crate::port::state_store::StateError;

/// Probe-level error taxonomy.
///
/// A single-probe call surfaces the first applicable variant; batch dispatch
/// captures these per entry and never fails wholesale. Rate-limited probes
/// return a sentinel result, not an error.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("unknown probe: {0}")]
    UnknownProbe(String),

    #[error("probe '{probe}' has no strategy for platform {platform}")]
    UnsupportedPlatform {
        probe: String,
        platform: PlatformKind,
    },

    #[error("command execution failed: {0}")]
    Command(#[from] RunnerError),

    #[error("command '{program}' exited with status {code}")]
    CommandExit { program: String, code: i32 },

    #[error("management query failed: {0}")]
    Query(#[from] QueryError),

    #[error("parse failure: {0}")]
    Parse(String),

    #[error("state store error: {0}")]
    State(#[from] StateError),

    #[error("invalid probe arguments: {0}")]
    InvalidArgs(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using ProbeError
pub type Result<T> = std::result::Result<T, ProbeError>;
