//! Typed errors for filter and level configuration.
//!
//! All of these are raised at the point of misuse. They indicate
//! programming or configuration mistakes, never runtime conditions of the
//! logging itself: emission does not fail.

use thiserror::Error;

/// Error type for logtree configuration operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogError {
    /// Bad level schema, unsupported configuration key or value
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Namespace is empty, has an empty segment or contains whitespace
    #[error("Invalid namespace '{namespace}': {reason}")]
    InvalidNamespace { namespace: String, reason: String },

    /// Attempt to unset the root filter
    #[error("The 'root' filter cannot be unset, it must always resolve to a level")]
    RootUnset,

    /// Level name or rank not present in the active schema
    #[error("Unknown log level: {level}")]
    UnknownLevel { level: String },
}

impl LogError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid namespace error.
    pub fn namespace(namespace: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNamespace {
            namespace: namespace.into(),
            reason: reason.into(),
        }
    }

    /// Create an unknown level error.
    pub fn unknown_level(level: impl ToString) -> Self {
        Self::UnknownLevel {
            level: level.to_string(),
        }
    }
}

/// Result alias for logtree operations.
pub type Result<T> = std::result::Result<T, LogError>;
