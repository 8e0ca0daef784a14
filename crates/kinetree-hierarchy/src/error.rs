//! Error types for hierarchy export.

use thiserror::Error;

/// Errors that can occur while building or exporting a segment hierarchy.
///
/// Every variant carries the offending identifier(s), rendered with the
/// key's `Display` implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Two segments share the same identifier.
    #[error("duplicate segment identifier '{id}'")]
    DuplicateIdentifier { id: String },

    /// Parent references form a cycle. `path` lists the identifiers on the
    /// cycle, starting and ending with the same identifier.
    #[error("cycle detected in parent references: {}", path.join(" -> "))]
    CycleDetected { path: Vec<String> },

    /// A segment references a parent that is not in the list.
    #[error("segment '{id}' references unknown parent '{parent}'")]
    OrphanParent { id: String, parent: String },

    /// XML parsing or encoding error.
    #[error("XML error: {0}")]
    Xml(String),

    /// I/O error while writing output.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Result type for hierarchy operations.
pub type Result<T> = std::result::Result<T, Error>;
