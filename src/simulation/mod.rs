//! Dry-Run Simulation Module
//!
//! Executes a workflow without side effects, synthesizing outputs so that
//! template references between steps resolve.
//!
//! # Components
//!
//! - [`Simulator`]: Phase-by-phase state machine
//! - [`ExecutionTrace`]: Ordered event log of a run
//! - [`MockSource`]: Random parts of synthesized values
//! - [`ConditionEvaluator`]: Pre-condition evaluation

pub mod conditions;
pub mod mock;
pub mod simulator;
pub mod trace;

pub use conditions::{ConditionEvaluator, DryRunEvaluator};
pub use mock::{mock_value, synthesize_outputs, FixedSource, MockSource, RandomSource};
pub use simulator::{simulate, SimulationOutcome, SimulationStatus, Simulator};
pub use trace::{EventKind, ExecutionTrace, Phase, StepDisposition, StepRecord, TraceEvent};
