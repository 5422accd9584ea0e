//! Catalog errors.

use thiserror::Error;

/// Catalog error types.
///
/// A missing source directory is not an error (it means zero jobs); these
/// cover sources that exist but cannot be used.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Source path exists but cannot be read.
    #[error("Job source unreadable: {path}: {message}")]
    Unreadable { path: String, message: String },

    /// A manifest file exists but does not parse.
    #[error("Bad job manifest {path}: {message}")]
    BadManifest { path: String, message: String },

    /// A manifest references a handler absent from the registry.
    #[error("Job '{job}' references unknown handler '{handler}'")]
    UnknownHandler { job: String, handler: String },

    /// A job entry carries an empty name.
    #[error("Job name must not be empty (source key: {0})")]
    EmptyName(String),
}
