//! Step Checks
//!
//! Per-step field validation: ids, operations, endpoints, and the optional
//! configuration blocks every production step should carry.

use std::collections::HashSet;

use super::findings::{Check, Finding};
use super::structure::SNAKE_CASE;
use crate::workflow::model::display_value;
use crate::workflow::{Operation, WorkflowDefinition};

/// Validates each step's fields.
///
/// A step without a string `id` gets one error and no further checks.
pub fn check_steps(workflow: &WorkflowDefinition, findings: &mut Vec<Finding>) {
    let steps = workflow.steps();

    if steps.is_empty() {
        findings.push(Finding::error(Check::Steps, "Workflow must have at least one step").at("steps"));
        return;
    }

    let mut seen_ids: HashSet<&str> = HashSet::new();

    for step in &steps {
        let position = format!("steps[{}]", step.index());

        let Some(id) = step.id() else {
            let message = match step.get("id") {
                Some(raw) => format!(
                    "Step {} has non-string 'id' field: {}",
                    step.number(),
                    display_value(raw)
                ),
                None => format!("Step {} missing 'id' field", step.number()),
            };
            findings.push(Finding::error(Check::Steps, message).at(position));
            continue;
        };

        let location = format!("steps.{}", id);

        if !seen_ids.insert(id) {
            findings.push(
                Finding::error(Check::Steps, format!("Duplicate step ID: '{}'", id)).at(position),
            );
        }

        if !SNAKE_CASE.is_match(id) {
            findings.push(
                Finding::error(
                    Check::Steps,
                    format!("Step ID '{}' must be snake_case starting with a letter", id),
                )
                .at(location.clone()),
            );
        }

        for field in ["operation", "api_endpoint"] {
            if !step.has(field) {
                findings.push(
                    Finding::error(Check::Steps, format!("Step '{}' missing '{}' field", id, field))
                        .at(location.clone()),
                );
            }
        }

        if let Some(raw) = step.get("operation") {
            if step.operation().is_none() {
                findings.push(
                    Finding::error(
                        Check::Steps,
                        format!("Step '{}' has invalid operation: {}", id, display_value(raw)),
                    )
                    .at(location.clone()),
                );
            }
        }

        if step.depends_on_malformed() {
            findings.push(
                Finding::error(
                    Check::Steps,
                    format!("Step '{}' has non-list 'depends_on' field", id),
                )
                .at(format!("{}.depends_on", location)),
            );
        }

        if !step.has("error_handling") {
            findings.push(
                Finding::warning(
                    Check::Steps,
                    format!("Step '{}' has no error_handling configuration", id),
                )
                .at(location.clone()),
            );
        }

        if step.operation() == Some(Operation::Mutation) && !step.has("outputs") {
            findings.push(
                Finding::warning(
                    Check::Steps,
                    format!(
                        "Mutation step '{}' should declare 'outputs' for downstream dependencies",
                        id
                    ),
                )
                .at(location.clone()),
            );
        }

        if !step.has("telemetry") {
            findings.push(
                Finding::info(Check::Steps, format!("Step '{}' has no telemetry configuration", id))
                    .at(location),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::findings::Severity;
    use serde_json::{json, Value};

    fn run(doc: Value) -> Vec<Finding> {
        let mut findings = Vec::new();
        check_steps(&WorkflowDefinition::from_value(doc), &mut findings);
        findings
    }

    fn complete_step(id: &str) -> Value {
        json!({
            "id": id,
            "operation": "query",
            "api_endpoint": "GET /orders",
            "error_handling": { "on_failure": "abort" },
            "telemetry": { "span": id }
        })
    }

    #[test]
    fn test_non_list_depends_on_is_error() {
        let mut step = complete_step("ship");
        step["depends_on"] = json!("pack");

        let findings = run(json!({ "steps": [complete_step("pack"), step] }));

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[0].message, "Step 'ship' has non-list 'depends_on' field");
        assert_eq!(findings[0].location.as_deref(), Some("steps.ship.depends_on"));
    }

    #[test]
    fn test_empty_steps() {
        let findings = run(json!({ "steps": [] }));

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "Workflow must have at least one step");
    }

    #[test]
    fn test_complete_step_is_clean() {
        assert!(run(json!({ "steps": [complete_step("fetch_orders")] })).is_empty());
    }

    #[test]
    fn test_missing_id_skips_step() {
        let findings = run(json!({ "steps": [{ "operation": "bogus" }] }));

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "Step 1 missing 'id' field");
        assert_eq!(findings[0].location.as_deref(), Some("steps[0]"));
    }

    #[test]
    fn test_duplicate_ids_reported_per_repeat() {
        let findings = run(json!({ "steps": [
            complete_step("checkout"),
            complete_step("checkout"),
        ]}));
        let duplicates = findings
            .iter()
            .filter(|f| f.message == "Duplicate step ID: 'checkout'")
            .count();
        assert_eq!(duplicates, 1);

        let findings = run(json!({ "steps": [
            complete_step("checkout"),
            complete_step("checkout"),
            complete_step("checkout"),
        ]}));
        let duplicates = findings
            .iter()
            .filter(|f| f.message.starts_with("Duplicate step ID"))
            .count();
        assert_eq!(duplicates, 2);
    }

    #[test]
    fn test_id_format() {
        let findings = run(json!({ "steps": [complete_step("FetchOrders")] }));
        assert!(findings
            .iter()
            .any(|f| f.message == "Step ID 'FetchOrders' must be snake_case starting with a letter"));
    }

    #[test]
    fn test_missing_operation_is_not_also_invalid() {
        let findings = run(json!({ "steps": [{ "id": "fetch" }] }));
        let errors: Vec<_> = findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .map(|f| f.message.as_str())
            .collect();

        assert_eq!(
            errors,
            vec![
                "Step 'fetch' missing 'operation' field",
                "Step 'fetch' missing 'api_endpoint' field",
            ]
        );
    }

    #[test]
    fn test_invalid_operation() {
        let mut step = complete_step("fetch");
        step["operation"] = json!("delete");

        let findings = run(json!({ "steps": [step] }));
        assert!(findings
            .iter()
            .any(|f| f.message == "Step 'fetch' has invalid operation: delete"));
    }

    #[test]
    fn test_mutation_without_outputs_warns() {
        let mut step = complete_step("create_order");
        step["operation"] = json!("mutation");

        let findings = run(json!({ "steps": [step] }));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert!(findings[0].message.starts_with("Mutation step 'create_order'"));
    }

    #[test]
    fn test_missing_optional_blocks() {
        let findings = run(json!({ "steps": [
            { "id": "fetch", "operation": "query", "api_endpoint": "GET /x" }
        ]}));

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[1].severity, Severity::Info);
    }
}
