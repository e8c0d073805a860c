//! Execution Trace
//!
//! Sequential record of what a dry run did, phase by phase and step by
//! step. Events are kept in the order they happened.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{Map, Value};

/// Non-terminal phases of a dry run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Init,
    Preconditions,
    Steps,
    Postconditions,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Init => "INIT",
            Phase::Preconditions => "PRECONDITIONS",
            Phase::Steps => "STEPS",
            Phase::Postconditions => "POSTCONDITIONS",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the simulator did with a step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepDisposition {
    /// Read-only query, executed conceptually
    Executed,
    /// Mutation skipped, outputs still synthesized
    MutationSkipped,
    /// Sub-workflow invocation skipped, no outputs
    WorkflowSkipped { workflow_ref: Option<String> },
    /// Custom operation skipped, no outputs
    CustomSkipped,
    /// Missing or unrecognised operation skipped, no outputs
    UnknownSkipped { operation: Option<String> },
}

impl StepDisposition {
    /// Returns true if the step would have had a real effect.
    pub fn is_skipped(&self) -> bool {
        !matches!(self, StepDisposition::Executed)
    }
}

/// One simulated step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    /// One-based position in the step list
    pub number: usize,
    pub step_id: String,
    pub operation: Option<String>,
    pub endpoint: Option<String>,
    pub description: Option<String>,
    pub dependencies: Vec<String>,
    pub resolved_inputs: Value,
    pub outputs: Map<String, Value>,
    pub disposition: StepDisposition,
}

/// Kind of trace event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    /// Non-fatal note about the workflow
    Advisory { message: String },
    /// The phase has nothing declared
    NoConditions,
    ConditionPassed { id: String, description: String },
    ConditionFailed {
        id: String,
        description: String,
        critical: bool,
        message: String,
    },
    ConditionSkipped { id: String, description: String },
    Step(StepRecord),
    DependencyUnsatisfied { step_id: String, dependency: String },
    Completed,
    Aborted { reason: String },
}

/// A single event in the trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceEvent {
    pub phase: Phase,
    #[serde(flatten)]
    pub kind: EventKind,
    /// Time since the trace started
    #[serde(skip)]
    pub offset: Duration,
}

/// Ordered log of a single dry run.
#[derive(Debug, Clone)]
pub struct ExecutionTrace {
    events: Vec<TraceEvent>,
    start_time: Instant,
}

impl ExecutionTrace {
    /// Creates an empty trace starting now.
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            start_time: Instant::now(),
        }
    }

    /// Appends an event to the trace.
    pub fn record(&mut self, phase: Phase, kind: EventKind) {
        self.events.push(TraceEvent {
            phase,
            kind,
            offset: self.start_time.elapsed(),
        });
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }
}

impl Default for ExecutionTrace {
    fn default() -> Self {
        Self::new()
    }
}
