//! Error types for apidoc operations.
//!
//! These are the fatal errors: any of them aborts the whole batch run. Recoverable
//! problems are recorded as [`Diagnostic`](crate::Diagnostic)s instead.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for apidoc operations.
pub type Result<T> = std::result::Result<T, ApidocError>;

/// Fatal errors raised while extracting API schemas.
#[derive(Error, Debug)]
pub enum ApidocError {
    /// I/O error reading or writing a file
    #[error("Failed to access {path}: {source}")]
    Io {
        /// Path of the file involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Source text does not match any recognized grammar production
    #[error("Parse error in {file} at line {line}, column {column}: {message}")]
    Parse {
        /// File being parsed
        file: PathBuf,
        /// 1-indexed line
        line: usize,
        /// 1-indexed column
        column: usize,
        /// What went wrong
        message: String,
    },

    /// Grammar construct that is intentionally not supported
    #[error("Unsupported PHP feature in {file} at line {line}, column {column}: {feature}")]
    UnsupportedFeature {
        /// File being parsed
        file: PathBuf,
        /// 1-indexed line
        line: usize,
        /// 1-indexed column
        column: usize,
        /// Name of the construct
        feature: String,
    },

    /// Delegation chain loops back onto itself
    #[error("Cyclic delegation: {chain}")]
    CyclicDelegation {
        /// Rendered chain, e.g. `a::x() -> b::y() -> a::x()`
        chain: String,
    },

    /// Delegation chain is longer than the configured limit
    #[error("Delegation deeper than {limit}: {chain}")]
    DelegationTooDeep {
        /// Configured maximum depth
        limit: usize,
        /// Rendered chain, including the call that exceeded the limit
        chain: String,
    },

    /// The same static method is defined more than once in one file
    #[error("Found {count} definitions of {name}() inside {file}")]
    DuplicateDefinition {
        /// File containing the definitions
        file: PathBuf,
        /// Method name
        name: String,
        /// Number of definitions found
        count: usize,
    },

    /// Generated script does not contain the declaration to replace
    #[error("No `{marker}` declaration found in {path}")]
    MissingDeclaration {
        /// Script file
        path: PathBuf,
        /// Line prefix that was searched for
        marker: String,
    },

    /// Invalid extractor configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON serialization or deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApidocError {
    /// Create an Io error from a path and io::Error
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a Parse error
    pub fn parse(
        file: impl Into<PathBuf>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            column,
            message: message.into(),
        }
    }

    /// Create an UnsupportedFeature error
    pub fn unsupported(
        file: impl Into<PathBuf>,
        line: usize,
        column: usize,
        feature: impl Into<String>,
    ) -> Self {
        Self::UnsupportedFeature {
            file: file.into(),
            line,
            column,
            feature: feature.into(),
        }
    }

    /// Create an InvalidConfig error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Whether this error came from the grammar rather than the environment.
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. }
                | Self::UnsupportedFeature { .. }
                | Self::CyclicDelegation { .. }
                | Self::DelegationTooDeep { .. }
        )
    }
}
