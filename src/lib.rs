//! Flowguard - Workflow Definition Validator
//!
//! Static checks and side-effect-free dry runs for declarative API
//! workflows described as JSON documents.
//!
//! # Architecture
//!
//! The library is organized into these modules:
//!
//! - [`workflow`]: Typed views over workflow documents and file loading
//! - [`validation`]: Static checks producing an ordered list of findings
//! - [`simulation`]: Dry-run state machine with synthesized outputs
//! - [`template`]: `{{steps.X.outputs.Y}}` and `{{inputs.Z}}` references
//! - [`report`]: Terminal and JSON rendering of results
//! - [`error`]: Load errors and simulation faults
//!
//! # Example
//!
//! ```rust,no_run
//! use flowguard::{load_workflow, Simulator, Validator};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let workflow = load_workflow("create_order.json")?;
//!
//!     // Static checks
//!     let report = Validator::strict().validate(&workflow);
//!     for finding in report.findings() {
//!         println!("[{}] {}", finding.severity, finding);
//!     }
//!
//!     // Dry run
//!     let outcome = Simulator::new().run(&workflow);
//!     println!("Dry run {}: {:?}", outcome.trace_id, outcome.status);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod report;
pub mod simulation;
pub mod template;
pub mod validation;
pub mod workflow;

// Re-export commonly used types
pub use error::{LoadError, SimulationFault};
pub use simulation::{simulate, SimulationOutcome, SimulationStatus, Simulator};
pub use validation::{validate_workflow, Finding, Severity, ValidationReport, Validator, ValidatorConfig};
pub use workflow::model::{Step, WorkflowDefinition};
pub use workflow::parser::load_workflow;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "Flowguard";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_app_name() {
        assert_eq!(APP_NAME, "Flowguard");
    }

    #[test]
    fn test_module_exports() {
        let workflow = WorkflowDefinition::from_json_str(
            r#"{ "steps": [{ "id": "a", "operation": "query" }] }"#,
        )
        .unwrap();

        assert!(!validate_workflow(&workflow).passed());
        assert!(simulate(&workflow).succeeded());
    }

    #[test]
    fn test_version_format() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert!(parts.len() >= 2, "Version should have at least major.minor");
        for part in parts {
            assert!(part.parse::<u32>().is_ok(), "Version components should be numeric");
        }
    }
}
