use thiserror::Error;

use weft_core::{NumberKind, SchemaError};

/// Runtime failures while sampling. Each carries the path of the node that
/// failed; per-node state touched by the failed pass is rolled back.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SamplingError {
    #[error("{path}: value {value} overflows {kind}")]
    Overflow {
        path: String,
        value: String,
        kind: NumberKind,
    },
    #[error("{path}: invalid array length: {message}")]
    InvalidLength { path: String, message: String },
    #[error("{path}: reference to '{target}' has no value to copy")]
    EmptyReference { path: String, target: String },
    #[error("{path}: no unique value after {attempts} attempts")]
    UniqueExhausted { path: String, attempts: u32 },
    #[error("{path}: timestamp out of range")]
    TimestampOverflow { path: String },
    #[error("{path}: cannot render timestamp with format '{format}'")]
    Format { path: String, format: String },
    #[error("{path}: expected a string to transform, got {found}")]
    NotAString { path: String, found: String },
    #[error("{path}: invalid slice '{slice}': {message}")]
    InvalidSlice {
        path: String,
        slice: String,
        message: String,
    },
    #[error("no rows produced after {passes} consecutive passes")]
    NoProgress { passes: u32 },
}

/// Failures reported by output sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("sink rejected rows of '{collection}': {message}")]
    Rejected { collection: String, message: String },
}

/// Errors emitted by the generation engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("load error: {0}")]
    Load(#[from] weft_core::Error),
    #[error("sampling error: {0}")]
    Sampling(#[from] SamplingError),
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
    #[error("unknown collection '{0}'")]
    UnknownCollection(String),
    #[error("invalid options: {0}")]
    InvalidOptions(String),
}
