//! Error taxonomy for resolution and catalog retrieval.
//!
//! "A stage produced zero hits" is not an error; it drives the staged
//! matcher's fallback and ends in [`crate::model::types::Resolution::NotFound`].
//! Everything here propagates to the caller.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("query is empty")]
    EmptyQuery,

    #[error("catalog has no modules to search")]
    EmptyCatalog,

    /// The boolean stage could not parse the query.
    #[error("query too short or unparseable: {0}")]
    MalformedQuery(String),

    #[error("failed to build search index: {0}")]
    IndexBuild(String),

    #[error("resolution cancelled")]
    Cancelled,
}

impl From<tantivy::TantivyError> for ResolveError {
    fn from(e: tantivy::TantivyError) -> Self {
        ResolveError::IndexBuild(e.to_string())
    }
}

impl From<std::io::Error> for ResolveError {
    fn from(e: std::io::Error) -> Self {
        ResolveError::IndexBuild(e.to_string())
    }
}

/// Catalog provider failures. Never coerced into "not found".
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("catalog request to {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },

    #[error("catalog request to {url} failed: {reason}")]
    Failed { url: String, reason: String },

    #[error("could not decode catalog from {source_name}: {reason}")]
    Decode { source_name: String, reason: String },

    #[error("could not read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
