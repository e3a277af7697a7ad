//! Error types for the outer layers: project files and catalog ingestion.
//!
//! The sizing engine itself never fails. Unparseable inputs and catalog
//! misses surface as absent values or explicit "not found" results on the
//! consumer, so these types only cover I/O and data-format problems.

use std::io;

use thiserror::Error;

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field} — {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"panel.demand_factor"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub(crate) fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure while loading the reference catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog file could not be opened or read.
    #[error("cannot read catalog \"{path}\": {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    /// Row could not be decoded as CSV.
    #[error("catalog CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// Row decoded but carries an unusable value.
    #[error("catalog row {line}: {message}")]
    Invalid { line: usize, message: String },
}

/// Top-level error for the command-line tool.
#[derive(Debug, Error)]
pub enum SizerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),
}

/// Convenience alias for results carrying a [`SizerError`].
pub type SizerResult<T> = Result<T, SizerError>;
