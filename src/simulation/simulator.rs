//! Dry-Run Simulator
//!
//! Walks a workflow through its phases without touching any external
//! system:
//!
//! ```text
//! INIT -> PRECONDITIONS -> STEPS -> POSTCONDITIONS -> DONE
//!              |             |
//!              +-------------+------> ABORTED
//! ```
//!
//! Steps run strictly in list order. A step may only depend on steps that
//! appear before it, even when a later position would satisfy the
//! `depends_on` graph.

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Map;
use uuid::Uuid;

use super::conditions::{ConditionEvaluator, DryRunEvaluator};
use super::mock::{synthesize_outputs, MockSource, RandomSource};
use super::trace::{EventKind, ExecutionTrace, Phase, StepDisposition, StepRecord, TraceEvent};
use crate::error::SimulationFault;
use crate::template::{resolve_value, OutputMemo};
use crate::workflow::model::display_value;
use crate::workflow::{Condition, Operation, Step, WorkflowDefinition};

/// Final state of a dry run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SimulationStatus {
    Done,
    Aborted { phase: Phase, fault: SimulationFault },
}

/// Everything a finished dry run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationOutcome {
    pub trace_id: String,
    pub workflow_name: Option<String>,
    pub platform: Option<String>,
    /// ISO-8601 start time
    pub started_at: String,
    pub status: SimulationStatus,
    pub events: Vec<TraceEvent>,
    /// Outputs recorded per step id
    pub outputs: OutputMemo,
}

impl SimulationOutcome {
    /// Returns true if the run reached DONE.
    pub fn succeeded(&self) -> bool {
        matches!(self.status, SimulationStatus::Done)
    }

    /// Returns the fault that aborted the run, if any.
    pub fn fault(&self) -> Option<&SimulationFault> {
        match &self.status {
            SimulationStatus::Done => None,
            SimulationStatus::Aborted { fault, .. } => Some(fault),
        }
    }

    /// Returns every simulated step, in the order they ran.
    pub fn step_records(&self) -> impl Iterator<Item = &StepRecord> {
        self.events.iter().filter_map(|event| match &event.kind {
            EventKind::Step(record) => Some(record),
            _ => None,
        })
    }

    /// Returns the first record of a simulated step by id.
    pub fn step(&self, step_id: &str) -> Option<&StepRecord> {
        self.step_records().find(|record| record.step_id == step_id)
    }
}

/// Mutable state owned by a single run.
struct ExecutionState {
    trace_id: String,
    outputs: OutputMemo,
    trace: ExecutionTrace,
}

impl ExecutionState {
    fn new() -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string(),
            outputs: OutputMemo::new(),
            trace: ExecutionTrace::new(),
        }
    }

    fn record(&mut self, phase: Phase, kind: EventKind) {
        self.trace.record(phase, kind);
    }

    fn advisory(&mut self, phase: Phase, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.record(phase, EventKind::Advisory { message });
    }
}

/// Result of running one phase.
enum Transition {
    Advance(Phase),
    Finish,
    Abort(SimulationFault),
}

/// Simulates a workflow run.
///
/// A simulator is consumed by [`Simulator::run`]; every run starts from a
/// fresh trace id and an empty output table.
///
/// # Example
///
/// ```
/// use flowguard::simulation::Simulator;
/// use flowguard::workflow::WorkflowDefinition;
///
/// let workflow = WorkflowDefinition::from_json_str(r#"{
///     "steps": [{ "id": "fetch", "operation": "query", "outputs": { "order_id": "$.id" } }]
/// }"#).unwrap();
///
/// let outcome = Simulator::new().run(&workflow);
///
/// assert!(outcome.succeeded());
/// assert!(outcome.outputs["fetch"]["order_id"].as_str().unwrap().starts_with("mock_order_id_"));
/// ```
pub struct Simulator {
    source: Box<dyn MockSource>,
    evaluator: Box<dyn ConditionEvaluator>,
}

impl Simulator {
    /// Creates a simulator with random mock values and the dry-run evaluator.
    pub fn new() -> Self {
        Self {
            source: Box::new(RandomSource),
            evaluator: Box::new(DryRunEvaluator),
        }
    }

    /// Replaces the source of mock suffixes and timestamps.
    pub fn with_source(mut self, source: impl MockSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    /// Replaces the pre-condition evaluator.
    pub fn with_evaluator(mut self, evaluator: impl ConditionEvaluator + 'static) -> Self {
        self.evaluator = Box::new(evaluator);
        self
    }

    /// Runs the workflow to DONE or ABORTED.
    pub fn run(mut self, workflow: &WorkflowDefinition) -> SimulationOutcome {
        let mut state = ExecutionState::new();
        let started_at = self.source.timestamp();
        let metadata = workflow.metadata();

        info!(
            "Starting dry run {} of '{}'",
            state.trace_id,
            metadata.workflow_name().unwrap_or("unknown")
        );

        let mut phase = Phase::Init;

        let status = loop {
            debug!("Entering phase {}", phase);

            let transition = match phase {
                Phase::Init => self.init(workflow, &mut state),
                Phase::Preconditions => self.check_preconditions(workflow, &mut state),
                Phase::Steps => self.simulate_steps(workflow, &mut state),
                Phase::Postconditions => self.skip_postconditions(workflow, &mut state),
            };

            match transition {
                Transition::Advance(next) => phase = next,
                Transition::Finish => {
                    state.record(phase, EventKind::Completed);
                    info!("Dry run {} completed", state.trace_id);
                    break SimulationStatus::Done;
                }
                Transition::Abort(fault) => {
                    warn!("Dry run {} aborted in {}: {}", state.trace_id, phase, fault);
                    state.record(
                        phase,
                        EventKind::Aborted {
                            reason: fault.to_string(),
                        },
                    );
                    break SimulationStatus::Aborted { phase, fault };
                }
            }
        };

        debug!("Dry run took {:?}", state.trace.elapsed());

        SimulationOutcome {
            trace_id: state.trace_id,
            workflow_name: metadata.workflow_name().map(str::to_string),
            platform: metadata.platform().map(str::to_string),
            started_at,
            status,
            events: state.trace.into_events(),
            outputs: state.outputs,
        }
    }

    fn init(&mut self, workflow: &WorkflowDefinition, state: &mut ExecutionState) -> Transition {
        if !workflow.execution_config().dry_run_supported() {
            state.advisory(
                Phase::Init,
                "Workflow does not explicitly support dry-run mode",
            );
        }

        Transition::Advance(Phase::Preconditions)
    }

    fn check_preconditions(
        &mut self,
        workflow: &WorkflowDefinition,
        state: &mut ExecutionState,
    ) -> Transition {
        let conditions = workflow.pre_conditions();

        if conditions.is_empty() {
            state.record(Phase::Preconditions, EventKind::NoConditions);
            return Transition::Advance(Phase::Steps);
        }

        for condition in &conditions {
            if self.evaluator.evaluate(condition) {
                state.record(
                    Phase::Preconditions,
                    EventKind::ConditionPassed {
                        id: condition.id().to_string(),
                        description: condition.description().to_string(),
                    },
                );
                continue;
            }

            state.record(
                Phase::Preconditions,
                EventKind::ConditionFailed {
                    id: condition.id().to_string(),
                    description: condition.description().to_string(),
                    critical: condition.is_critical(),
                    message: condition.error_message().to_string(),
                },
            );

            if condition.is_critical() {
                return Transition::Abort(critical_fault(condition));
            }

            warn!("Non-critical pre-condition '{}' failed", condition.id());
        }

        Transition::Advance(Phase::Steps)
    }

    fn simulate_steps(
        &mut self,
        workflow: &WorkflowDefinition,
        state: &mut ExecutionState,
    ) -> Transition {
        let steps = workflow.steps();
        info!("Simulating {} steps", steps.len());

        for step in &steps {
            let step_id = step.label();

            // Non-string entries can never name a recorded step.
            if let Some(entry) = step.depends_on_raw().into_iter().find(|entry| {
                entry
                    .as_str()
                    .map(|dep| !state.outputs.contains_key(dep))
                    .unwrap_or(true)
            }) {
                let dependency = display_value(entry);
                state.record(
                    Phase::Steps,
                    EventKind::DependencyUnsatisfied {
                        step_id: step_id.clone(),
                        dependency: dependency.clone(),
                    },
                );
                return Transition::Abort(SimulationFault::DependencyNotSatisfied {
                    step: step_id,
                    dependency,
                });
            }

            let resolved_inputs = resolve_value(step.inputs(), &state.outputs);
            let (disposition, outputs) = self.dispatch(step);

            debug!(
                "Step {} '{}': {:?}, {} outputs",
                step.number(),
                step_id,
                disposition,
                outputs.len()
            );

            if let StepDisposition::CustomSkipped = disposition {
                state.advisory(
                    Phase::Steps,
                    format!(
                        "Step '{}' uses a custom operation, which has no dry-run behavior",
                        step_id
                    ),
                );
            }

            state.outputs.insert(step_id.clone(), outputs.clone());
            state.record(
                Phase::Steps,
                EventKind::Step(StepRecord {
                    number: step.number(),
                    step_id,
                    operation: step.operation_name().map(str::to_string),
                    endpoint: step.api_endpoint().map(str::to_string),
                    description: step.description().map(str::to_string),
                    dependencies: step.depends_on().into_iter().map(str::to_string).collect(),
                    resolved_inputs,
                    outputs,
                    disposition,
                }),
            );
        }

        Transition::Advance(Phase::Postconditions)
    }

    /// Decides what a step does in a dry run and which outputs it yields.
    fn dispatch(&mut self, step: &Step<'_>) -> (StepDisposition, Map<String, serde_json::Value>) {
        match step.operation() {
            Some(Operation::Query) => (
                StepDisposition::Executed,
                synthesize_outputs(step, self.source.as_mut()),
            ),
            Some(Operation::Mutation) => (
                StepDisposition::MutationSkipped,
                synthesize_outputs(step, self.source.as_mut()),
            ),
            Some(Operation::Workflow) => (
                StepDisposition::WorkflowSkipped {
                    workflow_ref: step.workflow_ref().map(str::to_string),
                },
                Map::new(),
            ),
            Some(Operation::Custom) => (StepDisposition::CustomSkipped, Map::new()),
            None => (
                StepDisposition::UnknownSkipped {
                    operation: step.operation_name().map(str::to_string),
                },
                Map::new(),
            ),
        }
    }

    fn skip_postconditions(
        &mut self,
        workflow: &WorkflowDefinition,
        state: &mut ExecutionState,
    ) -> Transition {
        let conditions = workflow.post_conditions();

        if conditions.is_empty() {
            state.record(Phase::Postconditions, EventKind::NoConditions);
        }

        for condition in &conditions {
            state.record(
                Phase::Postconditions,
                EventKind::ConditionSkipped {
                    id: condition.id().to_string(),
                    description: condition.description().to_string(),
                },
            );
        }

        Transition::Finish
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

fn critical_fault(condition: &Condition<'_>) -> SimulationFault {
    SimulationFault::CriticalCondition {
        condition: condition.id().to_string(),
        message: condition.error_message().to_string(),
    }
}

/// Runs a dry run with the default simulator.
pub fn simulate(workflow: &WorkflowDefinition) -> SimulationOutcome {
    Simulator::new().run(workflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::mock::FixedSource;
    use regex_lite::Regex;
    use serde_json::{json, Value};

    fn pinned() -> Simulator {
        Simulator::new().with_source(FixedSource::new("0badf00d", "2024-05-01T09:30:00.000000"))
    }

    fn workflow(doc: Value) -> WorkflowDefinition {
        WorkflowDefinition::from_value(doc)
    }

    /// Fails every condition whose id starts with `fail`.
    struct FailingEvaluator;

    impl ConditionEvaluator for FailingEvaluator {
        fn evaluate(&self, condition: &Condition<'_>) -> bool {
            !condition.id().starts_with("fail")
        }
    }

    fn order_flow() -> WorkflowDefinition {
        workflow(json!({
            "metadata": { "workflow_name": "ship_order", "platform": "shopify" },
            "execution_config": { "dry_run_supported": true },
            "steps": [
                {
                    "id": "a",
                    "operation": "query",
                    "api_endpoint": "GET /orders/latest",
                    "outputs": { "order_id": "$.order.id" }
                },
                {
                    "id": "b",
                    "operation": "mutation",
                    "api_endpoint": "POST /fulfillments",
                    "depends_on": ["a"],
                    "inputs": { "id": "{{steps.a.outputs.order_id}}" }
                }
            ]
        }))
    }

    #[test]
    fn test_two_step_run_resolves_outputs() {
        let outcome = Simulator::new().run(&order_flow());
        let pattern = Regex::new(r"^mock_order_id_[0-9a-f]{8}$").unwrap();

        assert!(outcome.succeeded());

        let synthesized = outcome.outputs["a"]["order_id"].as_str().unwrap();
        let resolved = &outcome.step("b").unwrap().resolved_inputs["id"];

        assert!(pattern.is_match(synthesized), "got {}", synthesized);
        assert_eq!(resolved, synthesized);
    }

    #[test]
    fn test_two_step_run_with_pinned_source() {
        let outcome = pinned().run(&order_flow());

        assert_eq!(outcome.step("b").unwrap().resolved_inputs["id"], "mock_order_id_0badf00d");
        assert_eq!(outcome.step("b").unwrap().disposition, StepDisposition::MutationSkipped);
        assert_eq!(outcome.step("a").unwrap().disposition, StepDisposition::Executed);
        assert_eq!(outcome.started_at, "2024-05-01T09:30:00.000000");
        assert_eq!(outcome.workflow_name.as_deref(), Some("ship_order"));
    }

    #[test]
    fn test_forward_dependency_aborts() {
        let outcome = pinned().run(&workflow(json!({
            "steps": [
                { "id": "ship", "operation": "mutation", "depends_on": ["pack"] },
                { "id": "pack", "operation": "query" }
            ]
        })));

        assert_eq!(
            outcome.status,
            SimulationStatus::Aborted {
                phase: Phase::Steps,
                fault: SimulationFault::DependencyNotSatisfied {
                    step: "ship".to_string(),
                    dependency: "pack".to_string(),
                },
            }
        );
        assert!(outcome.step("pack").is_none());
        assert!(outcome.outputs.is_empty());
    }

    #[test]
    fn test_non_string_dependency_aborts() {
        let outcome = pinned().run(&workflow(json!({
            "steps": [
                { "id": "a", "operation": "query" },
                { "id": "b", "operation": "mutation", "depends_on": ["a", 7, null] }
            ]
        })));

        assert_eq!(
            outcome.fault(),
            Some(&SimulationFault::DependencyNotSatisfied {
                step: "b".to_string(),
                dependency: "7".to_string(),
            })
        );
        assert!(outcome.step("a").is_some());
        assert!(outcome.step("b").is_none());
    }

    #[test]
    fn test_bare_string_dependency() {
        let outcome = pinned().run(&workflow(json!({
            "steps": [
                { "id": "a", "operation": "query" },
                { "id": "b", "operation": "mutation", "depends_on": "a" }
            ]
        })));

        assert!(outcome.succeeded());
        assert_eq!(outcome.step("b").unwrap().dependencies, vec!["a".to_string()]);
    }

    #[test]
    fn test_missing_dry_run_support_is_advisory() {
        let outcome = pinned().run(&workflow(json!({ "steps": [] })));

        assert!(outcome.succeeded());
        assert!(outcome.events.iter().any(|event| event.phase == Phase::Init
            && matches!(event.kind, EventKind::Advisory { .. })));
    }

    #[test]
    fn test_unique_trace_ids() {
        let wf = order_flow();
        let first = pinned().run(&wf);
        let second = pinned().run(&wf);

        assert_ne!(first.trace_id, second.trace_id);
    }

    #[test]
    fn test_critical_precondition_aborts() {
        let outcome = pinned().with_evaluator(FailingEvaluator).run(&workflow(json!({
            "validation": {
                "pre_conditions": [
                    { "id": "check_auth" },
                    { "id": "fail_stock", "error_message": "Out of stock" },
                    { "id": "never_reached" }
                ]
            },
            "steps": [{ "id": "a", "operation": "query" }]
        })));

        assert_eq!(
            outcome.fault(),
            Some(&SimulationFault::CriticalCondition {
                condition: "fail_stock".to_string(),
                message: "Out of stock".to_string(),
            })
        );
        assert!(outcome.step("a").is_none());
        assert!(!outcome
            .events
            .iter()
            .any(|e| matches!(&e.kind, EventKind::ConditionPassed { id, .. } if id == "never_reached")));
    }

    #[test]
    fn test_non_critical_precondition_is_recorded() {
        let outcome = pinned().with_evaluator(FailingEvaluator).run(&workflow(json!({
            "validation": {
                "pre_conditions": [{ "id": "fail_soft", "critical": false }]
            },
            "steps": [{ "id": "a", "operation": "query" }]
        })));

        assert!(outcome.succeeded());
        assert!(outcome.events.iter().any(|e| matches!(
            &e.kind,
            EventKind::ConditionFailed { critical: false, .. }
        )));
    }

    #[test]
    fn test_postconditions_always_skipped() {
        let outcome = pinned().with_evaluator(FailingEvaluator).run(&workflow(json!({
            "validation": {
                "post_conditions": [
                    { "id": "fail_order_created", "description": "Order exists" },
                    { "id": "email_sent" }
                ]
            },
            "steps": []
        })));

        let skipped: Vec<&str> = outcome
            .events
            .iter()
            .filter_map(|e| match &e.kind {
                EventKind::ConditionSkipped { description, .. } => Some(description.as_str()),
                _ => None,
            })
            .collect();

        assert!(outcome.succeeded());
        assert_eq!(skipped, vec!["Order exists", "No description"]);
    }

    #[test]
    fn test_workflow_and_custom_steps_have_no_outputs() {
        let outcome = pinned().run(&workflow(json!({
            "execution_config": { "dry_run_supported": true },
            "steps": [
                {
                    "id": "sub",
                    "operation": "workflow",
                    "workflow_ref": "notify_customer",
                    "outputs": { "message_id": "$.id" }
                },
                { "id": "hook", "operation": "custom", "outputs": { "status": "$.s" } },
                { "id": "after", "operation": "query", "depends_on": ["sub", "hook"] }
            ]
        })));

        assert!(outcome.succeeded());
        assert!(outcome.outputs["sub"].is_empty());
        assert!(outcome.outputs["hook"].is_empty());
        assert_eq!(
            outcome.step("sub").unwrap().disposition,
            StepDisposition::WorkflowSkipped {
                workflow_ref: Some("notify_customer".to_string())
            }
        );

        let advisories = outcome
            .events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::Advisory { .. }))
            .count();
        assert_eq!(advisories, 1);
    }

    #[test]
    fn test_unresolved_and_input_placeholders() {
        let outcome = pinned().run(&workflow(json!({
            "steps": [{
                "id": "a",
                "operation": "query",
                "inputs": {
                    "email": "{{inputs.customer_email}}",
                    "ref": "{{steps.later.outputs.x}}"
                }
            }]
        })));

        let inputs = &outcome.step("a").unwrap().resolved_inputs;
        assert_eq!(inputs["email"], "<input:customer_email>");
        assert_eq!(inputs["ref"], "<unresolved:later.x>");
    }

    #[test]
    fn test_step_without_id_uses_label() {
        let outcome = pinned().run(&workflow(json!({
            "steps": [{ "operation": "query", "outputs": { "total_count": "$.n" } }]
        })));

        assert_eq!(outcome.outputs["step_1"]["total_count"], 42);
    }

    #[test]
    fn test_outcome_serializes() {
        let outcome = pinned().run(&order_flow());
        let value = serde_json::to_value(&outcome).unwrap();

        assert_eq!(value["status"]["state"], "done");
        assert_eq!(value["outputs"]["a"]["order_id"], "mock_order_id_0badf00d");
        assert!(value["events"].as_array().unwrap().len() >= 4);
    }
}
