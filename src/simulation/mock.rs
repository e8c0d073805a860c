//! Mock Output Synthesis
//!
//! Generates stand-in values for a step's declared outputs so that later
//! steps can resolve their templates during a dry run.

use chrono::Local;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::workflow::Step;

/// Integer used for every `count`-like output.
pub const MOCK_COUNT: i64 = 42;

/// Supplies the non-deterministic parts of a mock value.
pub trait MockSource {
    /// Returns 8 lowercase hexadecimal characters.
    fn hex_suffix(&mut self) -> String;

    /// Returns the current instant as an ISO-8601 string.
    fn timestamp(&mut self) -> String {
        Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// Default source backed by random UUIDs and the local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSource;

impl MockSource for RandomSource {
    fn hex_suffix(&mut self) -> String {
        let mut hex = Uuid::new_v4().simple().to_string();
        hex.truncate(8);
        hex
    }
}

/// Source returning the same suffix and timestamp every time.
#[derive(Debug, Clone)]
pub struct FixedSource {
    pub hex: String,
    pub timestamp: String,
}

impl FixedSource {
    pub fn new(hex: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            hex: hex.into(),
            timestamp: timestamp.into(),
        }
    }
}

impl MockSource for FixedSource {
    fn hex_suffix(&mut self) -> String {
        self.hex.clone()
    }

    fn timestamp(&mut self) -> String {
        self.timestamp.clone()
    }
}

/// Synthesizes a value for one output field.
///
/// The first matching rule wins, compared case-insensitively:
///
/// | field contains   | value                          |
/// |------------------|--------------------------------|
/// | `id`             | `mock_<field>_<8 hex>`         |
/// | `name`           | `Mock <Field Title Case>`      |
/// | `date` or `time` | current ISO-8601 timestamp     |
/// | `count`          | `42`                           |
/// | anything else    | `<mock_<field>>`               |
pub fn mock_value(field: &str, source: &mut dyn MockSource) -> Value {
    let lower = field.to_lowercase();

    if lower.contains("id") {
        Value::String(format!("mock_{}_{}", field, source.hex_suffix()))
    } else if lower.contains("name") {
        Value::String(format!("Mock {}", title_case(field)))
    } else if lower.contains("date") || lower.contains("time") {
        Value::String(source.timestamp())
    } else if lower.contains("count") {
        Value::from(MOCK_COUNT)
    } else {
        Value::String(format!("<mock_{}>", field))
    }
}

/// Synthesizes every declared output of a step, in declaration order.
pub fn synthesize_outputs(step: &Step<'_>, source: &mut dyn MockSource) -> Map<String, Value> {
    step.output_names()
        .into_iter()
        .map(|field| (field.to_string(), mock_value(field, source)))
        .collect()
}

/// Uppercases the first letter of every word and lowercases the rest.
///
/// Any non-alphabetic character starts a new word, so `widget_name`
/// becomes `Widget_Name`.
pub fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut at_word_start = true;

    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                result.extend(c.to_uppercase());
            } else {
                result.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            result.push(c);
            at_word_start = true;
        }
    }

    result
}
