//! Error Types
//!
//! Failures that stop a run before or during its execution. Validation
//! problems are not errors in this sense: they are collected as
//! [`Finding`](crate::validation::Finding)s and reported together.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Failure to turn a file on disk into a workflow definition.
///
/// Raised before any validation pass or simulation starts, so there is
/// never a partial result alongside it.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read workflow file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A condition that ends a dry run early.
///
/// Faults are fatal to the current run only and are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimulationFault {
    #[error("Step '{step}': dependency '{dependency}' not satisfied")]
    DependencyNotSatisfied { step: String, dependency: String },

    #[error("Critical pre-condition '{condition}' failed: {message}")]
    CriticalCondition { condition: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_display() {
        let err = LoadError::NotFound(PathBuf::from("missing.json"));
        assert_eq!(err.to_string(), "File not found: missing.json");
    }

    #[test]
    fn test_parse_error_keeps_source() {
        let source = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = LoadError::Parse {
            path: PathBuf::from("bad.json"),
            source,
        };

        assert!(err.to_string().starts_with("Invalid JSON in 'bad.json'"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_fault_display() {
        let fault = SimulationFault::DependencyNotSatisfied {
            step: "ship".to_string(),
            dependency: "pack".to_string(),
        };
        assert!(fault.to_string().contains("'pack' not satisfied"));

        let fault = SimulationFault::CriticalCondition {
            condition: "check_auth".to_string(),
            message: "Token expired".to_string(),
        };
        assert!(fault.to_string().contains("check_auth"));
        assert!(fault.to_string().contains("Token expired"));
    }
}
