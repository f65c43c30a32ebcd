//! Error types for batch signature checking.
//!
//! Per-file failures are reported through these variants but swallowed by
//! the scanner; only manifest, configuration and checker failures reach the
//! top of a run.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for batch_sigcheck operations.
#[derive(Debug, Error)]
pub enum BatchSigCheckError {
    /// The layout manifest could not be opened or read
    #[error("Failed to read manifest {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No directory entry matched a manifest path segment
    #[error("No entry matching '{segment}' in {parent}")]
    SegmentNotFound { parent: PathBuf, segment: String },

    /// Manifest path tried to step outside the root
    #[error("Refusing to resolve traversal segment '{0}'")]
    TraversalSegment(String),

    /// I/O failure on a single file
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Invalid configuration file or pattern
    #[error("Configuration error: {0}")]
    Config(String),

    /// The checker executable could not be started
    #[error("Failed to run {program}: {source}")]
    CheckerSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The checker ran but produced nothing to parse
    #[error("Checker produced no output")]
    EmptyOutput,

    /// Checker output does not have the expected column layout
    #[error("Unexpected checker column layout: {0}")]
    ColumnLayout(String),

    /// A staged row carried a hash that was never staged
    #[error("Checker reported unknown hash {hash} for {reference}")]
    UnknownHash { hash: String, reference: String },
}

impl BatchSigCheckError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures that belong to the checker stage rather than setup.
    pub fn is_checker_failure(&self) -> bool {
        matches!(
            self,
            Self::CheckerSpawn { .. }
                | Self::EmptyOutput
                | Self::ColumnLayout(_)
                | Self::UnknownHash { .. }
        )
    }
}

/// Result type alias for batch_sigcheck operations
pub type Result<T> = std::result::Result<T, BatchSigCheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checker_failure_classification() {
        assert!(BatchSigCheckError::EmptyOutput.is_checker_failure());
        assert!(BatchSigCheckError::ColumnLayout("short row".into()).is_checker_failure());
        assert!(!BatchSigCheckError::Config("bad".into()).is_checker_failure());
        assert!(!BatchSigCheckError::ManifestRead {
            path: PathBuf::from("Layout.ini"),
            source: io::Error::from(io::ErrorKind::NotFound),
        }
        .is_checker_failure());
    }

    #[test]
    fn test_error_messages() {
        let err = BatchSigCheckError::SegmentNotFound {
            parent: PathBuf::from("/mnt/image"),
            segment: "Windows".into(),
        };
        assert_eq!(err.to_string(), "No entry matching 'Windows' in /mnt/image");
    }
}
