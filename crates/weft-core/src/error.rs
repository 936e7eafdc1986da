use std::path::PathBuf;

use thiserror::Error;

/// Compile-time errors raised while parsing or compiling content trees.
///
/// Every variant carries the dotted path of the offending node so the error
/// can be traced back to a location in the input documents.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("{path}: unknown content type '{kind}'")]
    UnknownType { path: String, kind: String },
    #[error("{path}: missing required field '{field}'")]
    MissingField { path: String, field: String },
    #[error("{path}: unexpected field '{field}'")]
    UnexpectedField { path: String, field: String },
    #[error("{path}: {message}")]
    Invalid { path: String, message: String },
    #[error("{path}: invalid pattern: {message}")]
    Pattern { path: String, message: String },
    #[error("{path}: unknown faker generator '{name}'")]
    UnknownFaker { path: String, name: String },
    #[error("{path}: unresolved reference '{target}'")]
    UnresolvedReference { path: String, target: String },
    #[error("cyclic reference: {}", .cycle.join(" -> "))]
    CyclicReference { cycle: Vec<String> },
}

impl SchemaError {
    pub fn invalid(path: &str, message: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub fn missing(path: &str, field: &str) -> Self {
        Self::MissingField {
            path: path.to_string(),
            field: field.to_string(),
        }
    }

    pub fn is_cyclic(&self) -> bool {
        matches!(self, Self::CyclicReference { .. })
    }
}

/// Errors raised while loading namespaces from disk.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error in {collection}: {source}")]
    Json {
        collection: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Convenience alias for results returned by weft crates.
pub type Result<T> = std::result::Result<T, Error>;
