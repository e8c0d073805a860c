//! Workflow Data Model
//!
//! Typed, read-only views over a parsed workflow document. Every accessor is
//! total: a missing or mistyped field reads as absent instead of failing.
//!
//! # Example JSON Format
//!
//! ```json
//! {
//!   "metadata": { "workflow_name": "create_order", "workflow_id": "wf-1",
//!                 "platform": "shopify", "schema_version": "1.0.0" },
//!   "inputs": { "required": { "customer_id": { "type": "string" } } },
//!   "security": { "auth_required": true, "secrets_handling": "runtime_injected" },
//!   "steps": [
//!     { "id": "find_customer", "operation": "query", "api_endpoint": "GET /customers",
//!       "inputs": { "id": "{{inputs.customer_id}}" },
//!       "outputs": { "customer_id": "$.id" } },
//!     { "id": "create_order", "operation": "mutation", "api_endpoint": "POST /orders",
//!       "inputs": { "customer": "{{steps.find_customer.outputs.customer_id}}" },
//!       "depends_on": ["find_customer"] }
//!   ]
//! }
//! ```

use std::fmt;

use serde_json::{Map, Value};

/// Shared stand-in for absent sections so views never need an `Option`.
static ABSENT: Value = Value::Null;

/// Operation kinds a step may declare.
pub const ALLOWED_OPERATIONS: &[&str] = &["query", "mutation", "workflow", "custom"];

/// Accepted values for `security.secrets_handling`.
pub const ALLOWED_SECRETS_HANDLING: &[&str] = &["runtime_injected", "vault", "env_var"];

/// Top-level keys that must be present.
pub const REQUIRED_SECTIONS: &[&str] = &["metadata", "inputs", "security", "steps"];

/// Every top-level key the schema knows about.
pub const KNOWN_SECTIONS: &[&str] = &[
    "metadata",
    "inputs",
    "security",
    "validation",
    "steps",
    "execution_config",
    "observability",
    "documentation",
];

/// Non-throwing lookups on a generic JSON value.
pub trait ValueExt {
    /// Returns the value under `key` when `self` is an object containing it.
    fn field(&self, key: &str) -> Option<&Value>;

    /// Returns true if `self` is an object containing `key`, whatever its value.
    fn has_field(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    /// Returns the string under `key`, if it is a string.
    fn str_field(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }

    /// Walks nested objects along `path`.
    fn path(&self, path: &[&str]) -> Option<&Value>;

    /// Loose truthiness: null, false, zero, and empty strings or
    /// collections are false; everything else is true.
    fn is_truthy(&self) -> bool;
}

impl ValueExt for Value {
    fn field(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    fn path(&self, path: &[&str]) -> Option<&Value> {
        path.iter().try_fold(self, |current, key| current.field(key))
    }

    fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
        }
    }
}

/// Renders a JSON value for messages: strings bare, everything else as JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Returns true when `key` exists and holds a truthy value.
fn flag(value: &Value, key: &str) -> bool {
    value.field(key).map(ValueExt::is_truthy).unwrap_or(false)
}

/// Kind of work a step performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Read-only API call
    Query,
    /// Call that changes remote state
    Mutation,
    /// Invocation of another workflow
    Workflow,
    /// Anything else the platform supports
    Custom,
}

impl Operation {
    /// Parses one of the allowed operation names.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "query" => Some(Self::Query),
            "mutation" => Some(Self::Mutation),
            "workflow" => Some(Self::Workflow),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    /// Returns the schema name of this operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Workflow => "workflow",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete workflow document.
///
/// Owns the parsed JSON tree and hands out borrowed views into it. The
/// definition is never modified after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowDefinition {
    root: Value,
}

impl WorkflowDefinition {
    /// Wraps an already-parsed JSON value.
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// Parses a workflow from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text).map(Self::from_value)
    }

    /// Returns the underlying JSON tree.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Returns true if the document has the given top-level key.
    pub fn has_section(&self, name: &str) -> bool {
        self.root.has_field(name)
    }

    /// Returns the top-level keys in document order.
    pub fn section_names(&self) -> Vec<&str> {
        self.root
            .as_object()
            .map(|map| map.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn section(&self, name: &str) -> &Value {
        self.root.field(name).unwrap_or(&ABSENT)
    }

    pub fn metadata(&self) -> Metadata<'_> {
        Metadata(self.section("metadata"))
    }

    pub fn inputs(&self) -> Inputs<'_> {
        Inputs(self.section("inputs"))
    }

    pub fn security(&self) -> Security<'_> {
        Security(self.section("security"))
    }

    pub fn execution_config(&self) -> ExecutionConfig<'_> {
        ExecutionConfig(self.section("execution_config"))
    }

    pub fn observability(&self) -> Observability<'_> {
        Observability(self.section("observability"))
    }

    pub fn documentation(&self) -> Documentation<'_> {
        Documentation(self.section("documentation"))
    }

    /// Returns the steps in declaration order.
    ///
    /// A `steps` value that is not an array yields no steps.
    pub fn steps(&self) -> Vec<Step<'_>> {
        self.section("steps")
            .as_array()
            .map(|steps| {
                steps
                    .iter()
                    .enumerate()
                    .map(|(index, raw)| Step { index, raw })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the declared pre-conditions.
    pub fn pre_conditions(&self) -> Vec<Condition<'_>> {
        self.conditions("pre_conditions")
    }

    /// Returns the declared post-conditions.
    pub fn post_conditions(&self) -> Vec<Condition<'_>> {
        self.conditions("post_conditions")
    }

    fn conditions(&self, kind: &str) -> Vec<Condition<'_>> {
        self.section("validation")
            .field(kind)
            .and_then(Value::as_array)
            .map(|list| list.iter().map(Condition).collect())
            .unwrap_or_default()
    }
}

/// View over the `metadata` section.
#[derive(Debug, Clone, Copy)]
pub struct Metadata<'a>(&'a Value);

impl<'a> Metadata<'a> {
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.0.field(key)
    }

    pub fn workflow_name(&self) -> Option<&'a str> {
        self.0.str_field("workflow_name")
    }

    pub fn platform(&self) -> Option<&'a str> {
        self.0.str_field("platform")
    }

    pub fn schema_version(&self) -> Option<&'a str> {
        self.0.str_field("schema_version")
    }

    /// Returns true if `idempotent` is declared, whatever its value.
    pub fn declares_idempotency(&self) -> bool {
        self.0.has_field("idempotent")
    }
}

/// Which block of the `inputs` section a parameter was declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterBlock {
    Required,
    Optional,
}

impl ParameterBlock {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Optional => "optional",
        }
    }
}

/// View over the `inputs` section.
#[derive(Debug, Clone, Copy)]
pub struct Inputs<'a>(&'a Value);

impl<'a> Inputs<'a> {
    /// Returns true if either a `required` or an `optional` block exists.
    pub fn has_declarations(&self) -> bool {
        self.0.has_field("required") || self.0.has_field("optional")
    }

    /// Returns every declared parameter, required ones first.
    pub fn parameters(&self) -> Vec<Parameter<'a>> {
        [ParameterBlock::Required, ParameterBlock::Optional]
            .into_iter()
            .filter_map(|block| {
                self.0
                    .field(block.as_str())
                    .and_then(Value::as_object)
                    .map(|params| (block, params))
            })
            .flat_map(|(block, params): (ParameterBlock, &'a Map<String, Value>)| {
                params.iter().map(move |(name, raw)| Parameter {
                    block,
                    name: name.as_str(),
                    raw,
                })
            })
            .collect()
    }
}

/// A single workflow-level input parameter declaration.
#[derive(Debug, Clone, Copy)]
pub struct Parameter<'a> {
    pub block: ParameterBlock,
    pub name: &'a str,
    raw: &'a Value,
}

impl<'a> Parameter<'a> {
    pub fn has(&self, key: &str) -> bool {
        self.raw.has_field(key)
    }

    pub fn param_type(&self) -> Option<&'a str> {
        self.raw.str_field("type")
    }
}

/// View over the `security` section.
#[derive(Debug, Clone, Copy)]
pub struct Security<'a>(&'a Value);

impl<'a> Security<'a> {
    /// Returns true if the section is absent or empty.
    pub fn is_empty(&self) -> bool {
        !self.0.is_truthy()
    }

    pub fn has(&self, key: &str) -> bool {
        self.0.has_field(key)
    }

    /// Returns the raw `secrets_handling` value, whatever its type.
    pub fn secrets_handling(&self) -> Option<&'a Value> {
        self.0.field("secrets_handling")
    }

    /// Returns true if a non-empty `pii_fields` declaration exists.
    pub fn declares_pii_fields(&self) -> bool {
        flag(self.0, "pii_fields")
    }
}

/// View over the `execution_config` section.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionConfig<'a>(&'a Value);

impl ExecutionConfig<'_> {
    pub fn dry_run_supported(&self) -> bool {
        flag(self.0, "dry_run_supported")
    }

    pub fn rollback_supported(&self) -> bool {
        flag(self.0, "rollback_supported")
    }
}

/// View over the `observability` section.
#[derive(Debug, Clone, Copy)]
pub struct Observability<'a>(&'a Value);

impl Observability<'_> {
    /// Returns true if `audit.log_inputs` is switched on.
    pub fn logs_inputs(&self) -> bool {
        self.0
            .path(&["audit", "log_inputs"])
            .map(ValueExt::is_truthy)
            .unwrap_or(false)
    }
}

/// View over the `documentation` section.
#[derive(Debug, Clone, Copy)]
pub struct Documentation<'a>(&'a Value);

impl Documentation<'_> {
    /// Returns true if `semantic_gaps` is present and non-empty.
    pub fn has_semantic_gaps(&self) -> bool {
        flag(self.0, "semantic_gaps")
    }
}

/// A single step, together with its position in the step list.
#[derive(Debug, Clone, Copy)]
pub struct Step<'a> {
    index: usize,
    raw: &'a Value,
}

impl<'a> Step<'a> {
    /// Zero-based position in the declared step list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// One-based position, as shown to users.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    pub fn has(&self, key: &str) -> bool {
        self.raw.has_field(key)
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.raw.field(key)
    }

    /// Returns the id if present and a string.
    pub fn id(&self) -> Option<&'a str> {
        self.raw.str_field("id")
    }

    /// Returns the raw operation name, even if it is not an allowed one.
    pub fn operation_name(&self) -> Option<&'a str> {
        self.raw.str_field("operation")
    }

    /// Returns the parsed operation, if it is one of the allowed kinds.
    pub fn operation(&self) -> Option<Operation> {
        self.operation_name().and_then(Operation::parse)
    }

    pub fn api_endpoint(&self) -> Option<&'a str> {
        self.raw.str_field("api_endpoint")
    }

    pub fn description(&self) -> Option<&'a str> {
        self.raw.str_field("description")
    }

    pub fn workflow_ref(&self) -> Option<&'a str> {
        self.raw.str_field("workflow_ref")
    }

    /// Returns the raw `inputs` tree, or null when absent.
    pub fn inputs(&self) -> &'a Value {
        self.raw.field("inputs").unwrap_or(&ABSENT)
    }

    /// Returns the declared output field names in document order.
    pub fn output_names(&self) -> Vec<&'a str> {
        self.raw
            .field("outputs")
            .and_then(Value::as_object)
            .map(|outputs| outputs.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns true if the step has an `outputs` object, even an empty one.
    pub fn declares_outputs(&self) -> bool {
        self.raw
            .field("outputs")
            .map(Value::is_object)
            .unwrap_or(false)
    }

    /// Returns every `depends_on` entry as written.
    ///
    /// A list yields its items. Any other non-null value is treated as a
    /// single entry, so a bare string still names a dependency.
    pub fn depends_on_raw(&self) -> Vec<&'a Value> {
        match self.raw.field("depends_on") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(deps)) => deps.iter().collect(),
            Some(other) => vec![other],
        }
    }

    /// Returns true if `depends_on` is present but not a list.
    pub fn depends_on_malformed(&self) -> bool {
        self.raw
            .field("depends_on")
            .map(|deps| !deps.is_array())
            .unwrap_or(false)
    }

    /// Returns the string entries of `depends_on`.
    pub fn depends_on(&self) -> Vec<&'a str> {
        self.depends_on_raw()
            .into_iter()
            .filter_map(Value::as_str)
            .collect()
    }

    /// Returns the id, or a positional label when the id is missing.
    pub fn label(&self) -> String {
        match self.id() {
            Some(id) => id.to_string(),
            None => format!("step_{}", self.number()),
        }
    }
}

/// A declared pre- or post-condition.
#[derive(Debug, Clone, Copy)]
pub struct Condition<'a>(&'a Value);

impl<'a> Condition<'a> {
    pub fn id(&self) -> &'a str {
        self.0.str_field("id").unwrap_or("unknown")
    }

    pub fn description(&self) -> &'a str {
        self.0.str_field("description").unwrap_or("No description")
    }

    pub fn condition_type(&self) -> &'a str {
        self.0.str_field("type").unwrap_or("unknown")
    }

    /// Conditions are critical unless they explicitly say otherwise.
    pub fn is_critical(&self) -> bool {
        self.0.field("critical").map(ValueExt::is_truthy).unwrap_or(true)
    }

    pub fn error_message(&self) -> &'a str {
        self.0.str_field("error_message").unwrap_or("Check failed")
    }
}
