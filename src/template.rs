//! Template References
//!
//! Step inputs may embed two kinds of placeholder:
//!
//! - `{{steps.<step>.outputs.<field>}}` - an output of another step
//! - `{{inputs.<name>}}` - a workflow-level input
//!
//! This module finds step-output references for static analysis and
//! substitutes both kinds during a dry run.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex_lite::{Captures, Regex};
use serde_json::{Map, Value};

/// Matches `{{steps.<step>.outputs.<field>}}`.
pub static STEP_OUTPUT_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{steps\.([^.]+)\.outputs\.([^}]+)\}\}").expect("valid regex")
});

/// Matches `{{inputs.<name>}}`.
pub static WORKFLOW_INPUT_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{inputs\.([^}]+)\}\}").expect("valid regex"));

/// Recorded outputs of each simulated step, keyed by step id.
pub type OutputMemo = BTreeMap<String, Map<String, Value>>;

/// A reference to one output field of another step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRef {
    pub step: String,
    pub field: String,
}

/// Source of recorded step outputs for substitution.
pub trait OutputLookup {
    fn output(&self, step: &str, field: &str) -> Option<&Value>;
}

impl OutputLookup for OutputMemo {
    fn output(&self, step: &str, field: &str) -> Option<&Value> {
        self.get(step).and_then(|outputs| outputs.get(field))
    }
}

/// Returns every step-output reference inside `value`.
///
/// Object keys are searched as well as string values.
pub fn output_refs(value: &Value) -> Vec<OutputRef> {
    let mut refs = Vec::new();
    collect_refs(value, &mut refs);
    refs
}

fn collect_refs(value: &Value, refs: &mut Vec<OutputRef>) {
    match value {
        Value::String(text) => refs.extend(refs_in_str(text)),
        Value::Array(items) => items.iter().for_each(|item| collect_refs(item, refs)),
        Value::Object(map) => {
            for (key, item) in map {
                refs.extend(refs_in_str(key));
                collect_refs(item, refs);
            }
        }
        _ => {}
    }
}

fn refs_in_str(text: &str) -> impl Iterator<Item = OutputRef> + '_ {
    STEP_OUTPUT_REF.captures_iter(text).map(|caps| OutputRef {
        step: caps[1].to_string(),
        field: caps[2].to_string(),
    })
}

/// Placeholder used when a step output has not been recorded.
pub fn unresolved_placeholder(step: &str, field: &str) -> String {
    format!("<unresolved:{}.{}>", step, field)
}

/// Placeholder used for workflow-level inputs, which a dry run never binds.
pub fn input_placeholder(name: &str) -> String {
    format!("<input:{}>", name)
}

/// Resolves every template in a string.
///
/// Recorded outputs are substituted as text. Missing outputs and all
/// workflow inputs become explicit placeholders.
pub fn resolve_str(text: &str, outputs: &impl OutputLookup) -> String {
    let with_outputs = STEP_OUTPUT_REF.replace_all(text, |caps: &Captures| {
        match outputs.output(&caps[1], &caps[2]) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => unresolved_placeholder(&caps[1], &caps[2]),
        }
    });

    WORKFLOW_INPUT_REF
        .replace_all(&with_outputs, |caps: &Captures| input_placeholder(&caps[1]))
        .into_owned()
}

/// Resolves templates in every string of a nested input tree.
///
/// Keys and non-string scalars are left untouched.
pub fn resolve_value(value: &Value, outputs: &impl OutputLookup) -> Value {
    match value {
        Value::String(text) => Value::String(resolve_str(text, outputs)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| resolve_value(item, outputs))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), resolve_value(item, outputs)))
                .collect(),
        ),
        other => other.clone(),
    }
}
