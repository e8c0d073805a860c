//! Workflow Validation
//!
//! Static analysis of a workflow definition. Each check reads the document
//! through the [`crate::workflow`] views and appends [`Finding`]s; the
//! [`Validator`] runs them in a fixed order and wraps the result in a
//! [`ValidationReport`].
//!
//! # Checks
//!
//! 1. Structure - required and unknown top-level keys
//! 2. Metadata - required fields, name and version formats
//! 3. Inputs - parameter declarations
//! 4. Security - the declared security configuration
//! 5. Steps - per-step fields
//! 6. Dependencies - `depends_on` references and cycles
//! 7. Data flow - step-output template references
//! 8. Security audit - hardcoded credentials, PII logging
//! 9. Best practices - advisory only
//!
//! No check stops the others from running.

pub mod data_flow;
pub mod dependencies;
pub mod findings;
pub mod practices;
pub mod security;
pub mod steps;
pub mod structure;

use log::{debug, info};

use crate::workflow::WorkflowDefinition;

pub use findings::{Check, Finding, Severity, ValidationReport};

/// Signature shared by every validation check.
type CheckFn = fn(&WorkflowDefinition, &mut Vec<Finding>);

/// All checks, in the order they run.
const CHECKS: &[(Check, CheckFn)] = &[
    (Check::Structure, structure::check_structure),
    (Check::Metadata, structure::check_metadata),
    (Check::Inputs, structure::check_inputs),
    (Check::Security, security::check_security),
    (Check::Steps, steps::check_steps),
    (Check::Dependencies, dependencies::check_dependencies),
    (Check::DataFlow, data_flow::check_data_flow),
    (Check::SecurityAudit, security::audit_security),
    (Check::BestPractices, practices::check_best_practices),
];

/// Validator settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatorConfig {
    /// Treat warnings as failures
    pub strict: bool,
}

/// Runs every check over a workflow definition.
///
/// # Example
///
/// ```
/// use flowguard::validation::{Validator, ValidatorConfig};
/// use flowguard::workflow::WorkflowDefinition;
///
/// let workflow = WorkflowDefinition::from_json_str(r#"{ "steps": [] }"#).unwrap();
/// let report = Validator::new(ValidatorConfig::default()).validate(&workflow);
///
/// assert!(!report.passed());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Creates a validator that fails on warnings.
    pub fn strict() -> Self {
        Self::new(ValidatorConfig { strict: true })
    }

    /// Validates the workflow and returns all findings.
    ///
    /// Validation never fails as a call; problems are findings.
    pub fn validate(&self, workflow: &WorkflowDefinition) -> ValidationReport {
        info!(
            "Validating workflow with {} steps (strict: {})",
            workflow.steps().len(),
            self.config.strict
        );

        let mut findings = Vec::new();

        for (check, run) in CHECKS {
            let before = findings.len();
            run(workflow, &mut findings);

            debug!("Check '{}' produced {} findings", check, findings.len() - before);
            for finding in &findings[before..] {
                debug!("  [{}] {}", finding.severity, finding);
            }
        }

        let report = ValidationReport::new(findings, self.config.strict);

        info!(
            "Validation finished: {} errors, {} warnings, {} info",
            report.count(Severity::Error),
            report.count(Severity::Warning),
            report.count(Severity::Info)
        );

        report
    }
}

/// Validates a workflow in non-strict mode.
pub fn validate_workflow(workflow: &WorkflowDefinition) -> ValidationReport {
    Validator::default().validate(workflow)
}
