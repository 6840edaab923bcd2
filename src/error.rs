//! Compile-time and build-time errors.
//!
//! Per-request analysis has no error type: a rule that does not apply is a
//! `WalkResult::Fail`, never an `Err`. Everything below is detected once, while
//! a ruleset is compiled or an analyzer is built.

use std::path::PathBuf;
use thiserror::Error;

/// A ruleset that cannot be turned into a registry.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("matcher `{matcher}`: unknown lookup table `{name}`")]
    UnknownLookup { matcher: String, name: String },

    #[error("matcher `{matcher}`: unknown lookup set `{name}`")]
    UnknownSet { matcher: String, name: String },

    #[error("matcher `{matcher}`: invalid range [{start}-{end}] (1-based, end must not precede start)")]
    InvalidRange { matcher: String, start: usize, end: String },

    #[error("matcher `{matcher}`: `{step}` needs a count of at least 1")]
    InvalidCount { matcher: String, step: &'static str },

    #[error("matcher `{matcher}`: empty step chain")]
    EmptyChain { matcher: String },

    #[error("matcher `{matcher}`: extraction without a field name")]
    EmptyFieldName { matcher: String },

    #[error("matcher `{matcher}`: no extractions")]
    NoExtractions { matcher: String },

    #[error("malformed ruleset definition: {0}")]
    Definition(String),

    #[error("cannot read ruleset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<serde_yaml::Error> for CompileError {
    fn from(err: serde_yaml::Error) -> Self {
        CompileError::Definition(err.to_string())
    }
}

impl From<serde_json::Error> for CompileError {
    fn from(err: serde_json::Error) -> Self {
        CompileError::Definition(err.to_string())
    }
}

/// An analyzer that cannot be built from a registry and options.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("unknown field `{field}`; available fields: {}", available.join(", "))]
    UnknownField { field: String, available: Vec<String> },

    #[error(transparent)]
    Compile(#[from] CompileError),
}
