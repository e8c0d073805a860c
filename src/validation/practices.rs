//! Best-Practice Checks
//!
//! Advisory only. Nothing here produces an error.

use super::findings::{Check, Finding};
use crate::workflow::WorkflowDefinition;

/// Checks documentation, observability, conditions and execution support.
pub fn check_best_practices(workflow: &WorkflowDefinition, findings: &mut Vec<Finding>) {
    if !workflow.has_section("documentation") {
        findings.push(Finding::warning(Check::BestPractices, "No documentation section found"));
    } else if !workflow.documentation().has_semantic_gaps() {
        findings.push(
            Finding::info(
                Check::BestPractices,
                "Consider documenting semantic gaps (UI term -> API field)",
            )
            .at("documentation.semantic_gaps"),
        );
    }

    if !workflow.has_section("observability") {
        findings.push(Finding::warning(
            Check::BestPractices,
            "No observability configuration found",
        ));
    }

    if !workflow.has_section("validation") {
        findings.push(Finding::warning(
            Check::BestPractices,
            "No validation rules (pre/post conditions) defined",
        ));
    }

    let execution = workflow.execution_config();

    if !execution.dry_run_supported() {
        findings.push(
            Finding::info(Check::BestPractices, "Workflow does not support dry-run mode")
                .at("execution_config.dry_run_supported"),
        );
    }

    if !execution.rollback_supported() {
        findings.push(
            Finding::info(
                Check::BestPractices,
                "Workflow does not support rollback on failure",
            )
            .at("execution_config.rollback_supported"),
        );
    }
}
