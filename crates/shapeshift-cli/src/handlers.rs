//! Command handlers for CLI subcommands
//!
//! # Module Organization
//!
//! - [`map`] - adapt one JSON instance
//! - [`plan`] - inspect a compiled plan
//! - [`project`] - inspect and apply a projection

mod map;
mod plan;
mod project;

pub use map::handle_map;
pub use plan::handle_plan;
pub use project::handle_project;

use crate::error::{Error, Result};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Read a JSON document from a file, or from stdin for `None` and `-`
pub(crate) fn read_json_input(input: Option<&Path>) -> Result<serde_json::Value> {
    match input {
        Some(path) if path != Path::new("-") => {
            if !path.exists() {
                return Err(Error::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            let content = std::fs::read_to_string(path)?;
            debug!("Read input {} ({} bytes)", path.display(), content.len());
            serde_json::from_str(&content).map_err(|e| {
                debug!("JSON parse error: {}", e);
                Error::InvalidFormat {
                    path: path.to_path_buf(),
                    expected: "JSON".to_string(),
                }
            })
        }
        _ => {
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content)?;
            debug!("Read {} bytes from stdin", content.len());
            Ok(serde_json::from_str(&content)?)
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_json_input_from_file() {
        let file = test_support::json_file(&serde_json::json!({"a": 1}));
        let value = read_json_input(Some(file.path())).unwrap();
        assert_eq!(value, serde_json::json!({"a": 1}));
    }

    #[test]
    fn test_read_json_input_errors() {
        let missing = read_json_input(Some(Path::new("/no/such/input.json"))).unwrap_err();
        assert!(matches!(missing, Error::FileNotFound { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"{not json").unwrap();
        let invalid = read_json_input(Some(file.path())).unwrap_err();
        assert!(matches!(invalid, Error::InvalidFormat { .. }));
    }
}
