//! Structural Checks
//!
//! Top-level layout, the `metadata` section, and workflow input
//! declarations.

use log::debug;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde_json::Value;

use super::findings::{Check, Finding};
use crate::workflow::model::{display_value, KNOWN_SECTIONS, REQUIRED_SECTIONS};
use crate::workflow::WorkflowDefinition;

/// Lowercase identifier starting with a letter.
pub static SNAKE_CASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid regex"));

/// Three dot-separated numbers.
pub static SEMVER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("valid regex"));

const REQUIRED_METADATA: &[&str] = &["workflow_name", "workflow_id", "platform", "schema_version"];

/// Returns true if `value` is a string matching `pattern`.
fn matches(pattern: &Regex, value: &Value) -> bool {
    value.as_str().map(|s| pattern.is_match(s)).unwrap_or(false)
}

/// Checks required and unknown top-level keys.
pub fn check_structure(workflow: &WorkflowDefinition, findings: &mut Vec<Finding>) {
    for key in REQUIRED_SECTIONS {
        if !workflow.has_section(key) {
            findings.push(
                Finding::error(Check::Structure, format!("Missing required key: '{}'", key))
                    .at(*key),
            );
        }
    }

    let unknown: Vec<String> = workflow
        .section_names()
        .into_iter()
        .filter(|name| !KNOWN_SECTIONS.contains(name))
        .map(|name| format!("'{}'", name))
        .collect();

    if !unknown.is_empty() {
        debug!("Unknown top-level keys: {:?}", unknown);
        findings.push(Finding::warning(
            Check::Structure,
            format!("Unknown top-level keys: {}", unknown.join(", ")),
        ));
    }
}

/// Checks required metadata fields and their formats.
pub fn check_metadata(workflow: &WorkflowDefinition, findings: &mut Vec<Finding>) {
    let metadata = workflow.metadata();

    for field in REQUIRED_METADATA {
        if metadata.get(field).is_none() {
            findings.push(
                Finding::error(Check::Metadata, format!("metadata.{} is required", field))
                    .at(format!("metadata.{}", field)),
            );
        }
    }

    if let Some(name) = metadata.get("workflow_name") {
        if !matches(&SNAKE_CASE, name) {
            findings.push(
                Finding::error(
                    Check::Metadata,
                    format!(
                        "workflow_name '{}' must be snake_case starting with a letter",
                        display_value(name)
                    ),
                )
                .at("metadata.workflow_name"),
            );
        }
    }

    if let Some(version) = metadata.get("schema_version") {
        if !matches(&SEMVER, version) {
            findings.push(
                Finding::error(
                    Check::Metadata,
                    format!(
                        "schema_version '{}' must be semver (e.g., 1.0.0)",
                        display_value(version)
                    ),
                )
                .at("metadata.schema_version"),
            );
        }
    }

    if !metadata.declares_idempotency() {
        findings.push(
            Finding::warning(
                Check::Metadata,
                "Consider declaring 'idempotent' status in metadata",
            )
            .at("metadata.idempotent"),
        );
    }
}

/// Checks workflow-level input declarations.
pub fn check_inputs(workflow: &WorkflowDefinition, findings: &mut Vec<Finding>) {
    let inputs = workflow.inputs();

    if !inputs.has_declarations() {
        findings.push(Finding::warning(
            Check::Inputs,
            "No inputs defined (required or optional)",
        ));
        return;
    }

    for param in inputs.parameters() {
        let location = format!("inputs.{}.{}", param.block.as_str(), param.name);

        if !param.has("type") {
            findings.push(
                Finding::error(
                    Check::Inputs,
                    format!("Input '{}' missing 'type' field", param.name),
                )
                .at(location.clone()),
            );
        }

        if !param.has("description") {
            findings.push(
                Finding::warning(Check::Inputs, format!("Input '{}' missing description", param.name))
                    .at(location.clone()),
            );
        }

        if param.param_type() == Some("string") && !param.has("validation") {
            findings.push(
                Finding::info(
                    Check::Inputs,
                    format!(
                        "Input '{}' (string) has no validation rules (consider adding pattern/length)",
                        param.name
                    ),
                )
                .at(location),
            );
        }
    }
}
