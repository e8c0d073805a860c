//! Data-Flow Checks
//!
//! Walks the steps in declared order, tracking which outputs have been
//! declared so far. A `{{steps.X.outputs.Y}}` reference must point at a step
//! already seen in that walk, and `Y` should be one of its declared outputs.
//!
//! Visibility follows list order, not `depends_on`: referencing a step that
//! is declared further down the list is an error even when the dependency
//! graph is valid.

use std::collections::{HashMap, HashSet};

use super::findings::{Check, Finding};
use crate::template::output_refs;
use crate::workflow::{Step, WorkflowDefinition};

/// Validates step-output references in every step's inputs.
pub fn check_data_flow(workflow: &WorkflowDefinition, findings: &mut Vec<Finding>) {
    let steps = workflow.steps();

    let declared_anywhere: HashSet<&str> = steps
        .iter()
        .filter(|step| step.declares_outputs())
        .filter_map(Step::id)
        .collect();

    let mut available: HashMap<&str, HashSet<&str>> = HashMap::new();

    for step in &steps {
        let step_id = step.id().unwrap_or("unknown");
        let location = format!("steps.{}.inputs", step.label());

        for reference in output_refs(step.inputs()) {
            let target = reference.step.as_str();

            match available.get(target) {
                None if declared_anywhere.contains(target) => findings.push(
                    Finding::error(
                        Check::DataFlow,
                        format!(
                            "Step '{}' references output from step '{}' before it is declared",
                            step_id, target
                        ),
                    )
                    .at(location.clone()),
                ),
                None => findings.push(
                    Finding::error(
                        Check::DataFlow,
                        format!(
                            "Step '{}' references output from unknown step '{}'",
                            step_id, target
                        ),
                    )
                    .at(location.clone()),
                ),
                Some(fields) if !fields.contains(reference.field.as_str()) => findings.push(
                    Finding::warning(
                        Check::DataFlow,
                        format!(
                            "Step '{}' references '{}' which is not declared in step '{}' outputs",
                            step_id, reference.field, target
                        ),
                    )
                    .at(location.clone()),
                ),
                Some(_) => {}
            }
        }

        if let Some(id) = step.id() {
            if step.declares_outputs() {
                available.insert(id, step.output_names().into_iter().collect());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::findings::Severity;
    use serde_json::{json, Value};

    fn run(steps: Value) -> Vec<Finding> {
        let mut findings = Vec::new();
        check_data_flow(
            &WorkflowDefinition::from_value(json!({ "steps": steps })),
            &mut findings,
        );
        findings
    }

    #[test]
    fn test_resolved_reference_is_clean() {
        let findings = run(json!([
            { "id": "find", "outputs": { "order_id": "$.id" } },
            { "id": "ship", "inputs": { "order": "{{steps.find.outputs.order_id}}" } }
        ]));

        assert!(findings.is_empty());
    }

    #[test]
    fn test_unknown_step_is_error() {
        let findings = run(json!([
            { "id": "ship", "inputs": { "order": "{{steps.ghost.outputs.x}}" } }
        ]));

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(
            findings[0].message,
            "Step 'ship' references output from unknown step 'ghost'"
        );
    }

    #[test]
    fn test_undeclared_field_is_warning() {
        let findings = run(json!([
            { "id": "find", "outputs": { "order_id": "$.id" } },
            { "id": "ship", "inputs": { "total": "{{steps.find.outputs.total}}" } }
        ]));

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert!(findings[0].message.contains("'total'"));
    }

    #[test]
    fn test_forward_reference_is_error() {
        let findings = run(json!([
            { "id": "ship", "inputs": { "order": "{{steps.find.outputs.order_id}}" } },
            { "id": "find", "outputs": { "order_id": "$.id" } }
        ]));

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
        assert!(findings[0].message.contains("before it is declared"));
    }

    #[test]
    fn test_step_without_outputs_block_is_unknown() {
        let findings = run(json!([
            { "id": "find" },
            { "id": "ship", "inputs": ["{{steps.find.outputs.order_id}}"] }
        ]));

        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("unknown step 'find'"));
    }

    #[test]
    fn test_workflow_input_references_are_ignored() {
        let findings = run(json!([
            { "id": "find", "inputs": { "email": "{{inputs.email}}" } }
        ]));

        assert!(findings.is_empty());
    }
}
