//! Error types for URDF export.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when loading a model specification or writing URDF.
#[derive(Debug, Error)]
pub enum UrdfError {
    /// Failed to read or write a file.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The YAML specification could not be parsed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// The segment hierarchy is invalid.
    #[error("hierarchy error: {0}")]
    Hierarchy(#[from] kinetree_hierarchy::Error),

    /// A segment uses a joint type URDF does not support.
    #[error("segment '{segment}' has unsupported joint type '{joint_type}'")]
    UnsupportedJointType { segment: String, joint_type: String },

    /// A body has an unknown geometry type or a malformed size.
    #[error("invalid geometry on '{body}': {reason}")]
    InvalidGeometry { body: String, reason: String },

    /// The output sink failed while writing URDF.
    #[error("write error: {0}")]
    Write(#[from] std::io::Error),

    /// XML encoding error.
    #[error("XML error: {0}")]
    Xml(String),
}

/// Result type for URDF operations.
pub type Result<T> = std::result::Result<T, UrdfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_segment() {
        let e = UrdfError::UnsupportedJointType {
            segment: "wrist".into(),
            joint_type: "ball".into(),
        };
        assert_eq!(e.to_string(), "segment 'wrist' has unsupported joint type 'ball'");

        let e = UrdfError::from(kinetree_hierarchy::Error::DuplicateIdentifier { id: "link1".into() });
        assert_eq!(e.to_string(), "hierarchy error: duplicate segment identifier 'link1'");
    }

    #[test]
    fn test_io_error_includes_path() {
        let e = UrdfError::Io {
            path: PathBuf::from("/tmp/golfer.yaml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let msg = e.to_string();
        assert!(msg.contains("/tmp/golfer.yaml"));
        assert!(msg.contains("not found"));
    }
}
