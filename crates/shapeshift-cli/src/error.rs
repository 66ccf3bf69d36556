//! Error types and handling for the CLI
//!
//! Core mapping failures, file problems and model-file mistakes each get
//! their own exit code so scripts can tell them apart.

use colored::Colorize;
use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from shapeshift-core
    #[error("{0}")]
    Core(#[from] shapeshift_core::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid file format
    #[error("Invalid file format for {}: expected {} format", path.display(), expected)]
    InvalidFormat { path: PathBuf, expected: String },

    /// Model file is well-formed but describes something unusable
    #[error("Schema error: {0}")]
    Schema(String),

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create a schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(e) if e.is_configuration() => 2,
            Self::Core(_) => 3,
            Self::FileNotFound { .. } => 4,
            Self::InvalidFormat { .. } => 5,
            Self::Schema(_) => 6,
            Self::InvalidArgs(_) => 7,
            Self::Json(_) => 8,
            Self::Yaml(_) => 9,
        }
    }

    /// Check if this error should show help text
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    let prefix = if use_color {
        "Error:".red().bold().to_string()
    } else {
        "Error:".to_string()
    };

    let mut message = format!("{} {}", prefix, error);

    let hint = match error {
        Error::FileNotFound { .. } => Some("check that the path exists and is readable"),
        Error::Core(e) if e.is_configuration() => {
            Some("the model file or pair configuration cannot produce a mapping")
        }
        Error::Schema(_) => Some("see `classes`, `enums` and `pairs` in the model file"),
        _ => None,
    };
    if let Some(hint) = hint {
        let label = if use_color {
            "hint:".cyan().to_string()
        } else {
            "hint:".to_string()
        };
        message.push_str(&format!("\n  {} {}", label, hint));
    }

    message
}
