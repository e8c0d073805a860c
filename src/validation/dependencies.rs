//! Dependency Graph Checks
//!
//! Every `depends_on` entry must be the id of a step in the same workflow;
//! numbers, nulls and other non-string entries never are. The
//! dependency relation must be acyclic. Cycles are reported as a single
//! workflow-wide error without naming the steps involved.

use std::collections::{HashMap, HashSet};

use log::debug;

use super::findings::{Check, Finding};
use crate::workflow::model::display_value;
use crate::workflow::{Step, WorkflowDefinition};

/// Validates dependency references and checks for cycles.
pub fn check_dependencies(workflow: &WorkflowDefinition, findings: &mut Vec<Finding>) {
    let steps = workflow.steps();
    let step_ids: HashSet<&str> = steps.iter().filter_map(Step::id).collect();

    for step in &steps {
        for entry in step.depends_on_raw() {
            let known = entry.as_str().map(|id| step_ids.contains(id)).unwrap_or(false);

            if !known {
                findings.push(
                    Finding::error(
                        Check::Dependencies,
                        format!(
                            "Step '{}' depends on unknown step '{}'",
                            step.id().unwrap_or("unknown"),
                            display_value(entry)
                        ),
                    )
                    .at(format!("steps.{}.depends_on", step.label())),
                );
            }
        }
    }

    if has_circular_dependency(&steps) {
        findings.push(Finding::error(
            Check::Dependencies,
            "Circular dependency detected in workflow steps",
        ));
    }
}

/// Detects cycles in the `depends_on` graph.
///
/// Depth-first search with an explicit stack, marking nodes as either on
/// the active path or fully explored. Reaching a node that is still on the
/// active path means a cycle. Edges to unknown steps lead nowhere.
pub fn has_circular_dependency(steps: &[Step<'_>]) -> bool {
    let mut graph: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for step in steps {
        if let Some(id) = step.id() {
            if graph.insert(id, step.depends_on()).is_none() {
                order.push(id);
            }
        }
    }

    let mut on_path: HashSet<&str> = HashSet::new();
    let mut explored: HashSet<&str> = HashSet::new();

    for &start in &order {
        if explored.contains(start) {
            continue;
        }

        let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
        on_path.insert(start);

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let neighbors = graph.get(node).map(Vec::as_slice).unwrap_or(&[]);

            match neighbors.get(frame.1) {
                Some(&neighbor) => {
                    frame.1 += 1;

                    if on_path.contains(neighbor) {
                        debug!("Cycle closes at '{}' via '{}'", neighbor, node);
                        return true;
                    }

                    if !explored.contains(neighbor) {
                        on_path.insert(neighbor);
                        stack.push((neighbor, 0));
                    }
                }
                None => {
                    on_path.remove(node);
                    explored.insert(node);
                    stack.pop();
                }
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn workflow(steps: Value) -> WorkflowDefinition {
        WorkflowDefinition::from_value(json!({ "steps": steps }))
    }

    fn run(steps: Value) -> Vec<Finding> {
        let mut findings = Vec::new();
        check_dependencies(&workflow(steps), &mut findings);
        findings
    }

    #[test]
    fn test_valid_chain() {
        let findings = run(json!([
            { "id": "a" },
            { "id": "b", "depends_on": ["a"] },
            { "id": "c", "depends_on": ["a", "b"] }
        ]));

        assert!(findings.is_empty());
    }

    #[test]
    fn test_unknown_dependency_per_occurrence() {
        let findings = run(json!([
            { "id": "a", "depends_on": ["ghost"] },
            { "id": "b", "depends_on": ["ghost", "phantom"] }
        ]));

        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].message, "Step 'a' depends on unknown step 'ghost'");
        assert_eq!(findings[2].message, "Step 'b' depends on unknown step 'phantom'");
    }

    #[test]
    fn test_non_string_dependency_per_occurrence() {
        let findings = run(json!([
            { "id": "a" },
            { "id": "b", "depends_on": [7, null, "a", { "id": "a" }] }
        ]));

        let messages: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Step 'b' depends on unknown step '7'",
                "Step 'b' depends on unknown step 'null'",
                "Step 'b' depends on unknown step '{\"id\":\"a\"}'",
            ]
        );
    }

    #[test]
    fn test_bare_string_dependency_is_resolved() {
        let findings = run(json!([
            { "id": "a" },
            { "id": "b", "depends_on": "ghost" }
        ]));

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "Step 'b' depends on unknown step 'ghost'");
    }

    #[test]
    fn test_two_step_cycle() {
        let findings = run(json!([
            { "id": "a", "depends_on": ["b"] },
            { "id": "b", "depends_on": ["a"] }
        ]));

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "Circular dependency detected in workflow steps");
    }

    #[test]
    fn test_self_dependency_is_cycle() {
        let wf = workflow(json!([{ "id": "loop", "depends_on": ["loop"] }]));
        assert!(has_circular_dependency(&wf.steps()));
    }

    #[test]
    fn test_longer_cycle_reported_once() {
        let findings = run(json!([
            { "id": "a", "depends_on": ["c"] },
            { "id": "b", "depends_on": ["a"] },
            { "id": "c", "depends_on": ["b"] },
            { "id": "d", "depends_on": ["d"] }
        ]));

        let cycles = findings
            .iter()
            .filter(|f| f.message.starts_with("Circular"))
            .count();
        assert_eq!(cycles, 1);
    }

    #[test]
    fn test_diamond_is_not_cycle() {
        let wf = workflow(json!([
            { "id": "root" },
            { "id": "left", "depends_on": ["root"] },
            { "id": "right", "depends_on": ["root"] },
            { "id": "join", "depends_on": ["left", "right"] }
        ]));

        assert!(!has_circular_dependency(&wf.steps()));
    }

    #[test]
    fn test_forward_reference_is_valid_graph() {
        let findings = run(json!([
            { "id": "ship", "depends_on": ["pack"] },
            { "id": "pack" }
        ]));

        assert!(findings.is_empty());
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let steps: Vec<Value> = (0..10_000)
            .map(|i| {
                if i == 0 {
                    json!({ "id": "s0" })
                } else {
                    json!({ "id": format!("s{}", i), "depends_on": [format!("s{}", i - 1)] })
                }
            })
            .collect();

        let wf = workflow(Value::Array(steps));
        assert!(!has_circular_dependency(&wf.steps()));
    }
}
