//! Error types for caffeinate-core operations.
//!
//! Storage read/parse failures are deliberately NOT represented here: the
//! coordination protocol treats malformed or absent shared-store values as
//! "value absent" and keeps going. Errors are reserved for conditions the
//! operator must fix (bad configuration) or that a caller may want to
//! surface (store persistence failures the file store already logged).

use std::path::PathBuf;

/// All errors that can occur in caffeinate-core operations.
#[derive(Debug, thiserror::Error)]
pub enum CaffeinateError {
    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    #[error("Configuration read failed: {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid pattern in configuration: {field}: {details}")]
    ConfigPattern { field: String, details: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Convenience type alias for Results using CaffeinateError.
pub type Result<T> = std::result::Result<T, CaffeinateError>;
