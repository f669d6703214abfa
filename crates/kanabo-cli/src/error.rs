//! Top-level CLI error type: wraps I/O, loader, and `kanabo-path` errors the
//! same way the core crate wraps its own layers, each behind `thiserror`.

use std::path::PathBuf;

use kanabo_path::{EvalError, ParseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: invalid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}: invalid YAML: {message}", path.display())]
    Yaml { path: PathBuf, message: String },

    #[error("{}: mapping key must be a scalar", path.display())]
    NonScalarMappingKey { path: PathBuf },

    #[error("{}: duplicate key '{key}'", path.display())]
    DuplicateKey { path: PathBuf, key: String },

    #[error("{0}")]
    Parse(String),

    #[error("{}", format_eval_error(.0))]
    Eval(#[from] EvalError),

    #[error("unsupported output format '{0}' (only bash and json are implemented)")]
    UnsupportedOutputFormat(String),
}

/// Renders an [`EvalError`] as `"evaluator aborted at step N: ..."` when the
/// failure carries a step index, or `"evaluator aborted: ..."` for the
/// document/path preconditions that fail before any step runs.
fn format_eval_error(err: &EvalError) -> String {
    match err.step() {
        Some(step) => format!("evaluator aborted at step {step}: {err}"),
        None => format!("evaluator aborted: {err}"),
    }
}

impl From<Vec<ParseError>> for CliError {
    fn from(errors: Vec<ParseError>) -> Self {
        let joined = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        CliError::Parse(joined)
    }
}
