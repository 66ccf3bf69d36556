//! Error types for the Shapeshift core library
//!
//! This module defines the error handling system for Shapeshift,
//! using thiserror for ergonomic error definitions and anyhow for opaque
//! failures raised by user-supplied resolvers.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for Shapeshift operations
#[derive(Error, Debug)]
pub enum Error {
    /// Plan or projection compilation failed before any data was touched
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        /// `Source -> Dest` pair being compiled, when known
        pair: Option<String>,
    },

    /// A named type was referenced but never registered
    #[error("Unknown type: {name}")]
    UnknownType { name: String },

    /// A value could not be converted to the requested type
    #[error("Conversion failed: cannot convert {value} ({from}) to {to}")]
    Conversion {
        from: String,
        to: String,
        value: String,
    },

    /// Text could not be parsed into the requested scalar
    #[error("Format error: '{input}' is not a valid {target}")]
    Format { input: String, target: String },

    /// Instance-level member access failed
    #[error("Member error: {class}.{member} - {message}")]
    Member {
        class: String,
        member: String,
        message: String,
    },

    /// The in-memory evaluator met an ill-formed expression
    #[error("Evaluation error: {message}")]
    Evaluation { message: String },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of errors, matching the phase they are raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Raised while compiling a plan or projection
    Configuration,
    /// Raised while moving data
    Conversion,
    /// Everything else
    Other,
}

impl Error {
    /// Build a configuration error for a type pair
    pub fn configuration(message: impl Into<String>, pair: Option<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            pair,
        }
    }

    /// Build a conversion error from a value description
    pub fn conversion(
        from: impl Into<String>,
        to: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Error::Conversion {
            from: from.into(),
            to: to.into(),
            value: value.into(),
        }
    }

    /// Build a format error for unparsable text
    pub fn format(input: impl Into<String>, target: impl Into<String>) -> Self {
        Error::Format {
            input: input.into(),
            target: target.into(),
        }
    }

    /// Build a member access error
    pub fn member(
        class: impl Into<String>,
        member: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Member {
            class: class.into(),
            member: member.into(),
            message: message.into(),
        }
    }

    /// Build an evaluation error
    pub fn evaluation(message: impl Into<String>) -> Self {
        Error::Evaluation {
            message: message.into(),
        }
    }

    /// Phase this error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Configuration { .. } | Error::UnknownType { .. } => ErrorCategory::Configuration,
            Error::Conversion { .. } | Error::Format { .. } => ErrorCategory::Conversion,
            _ => ErrorCategory::Other,
        }
    }

    pub fn is_configuration(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    pub fn is_conversion(&self) -> bool {
        self.category() == ErrorCategory::Conversion
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Conversion => write!(f, "conversion"),
            ErrorCategory::Other => write!(f, "other"),
        }
    }
}

// Conversion implementations
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::configuration("no zero-argument constructor", Some("A -> B".to_string()));
        assert_eq!(
            err.to_string(),
            "Configuration error: no zero-argument constructor"
        );

        let err = Error::format("not-a-guid", "uuid");
        assert_eq!(err.to_string(), "Format error: 'not-a-guid' is not a valid uuid");
    }

    #[test]
    fn test_error_category() {
        assert!(Error::UnknownType { name: "X".to_string() }.is_configuration());
        assert!(Error::conversion("string", "i32", "abc").is_conversion());
        assert!(Error::format("abc", "uuid").is_conversion());
        assert_eq!(Error::evaluation("bad").category(), ErrorCategory::Other);
    }

    #[test]
    fn test_from_anyhow() {
        let err: Error = anyhow::anyhow!("resolver exploded").into();
        assert!(matches!(err, Error::Internal { .. }));
        assert!(err.to_string().contains("resolver exploded"));
    }
}
