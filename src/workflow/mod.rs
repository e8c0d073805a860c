//! Workflow Definition Module
//!
//! Data model and loading for workflow definitions.
//!
//! # Structure
//!
//! - [`model`]: Typed views over the parsed JSON document
//! - [`parser`]: Loading definitions from disk

pub mod model;
pub mod parser;

pub use model::{
    Condition, Operation, Parameter, ParameterBlock, Step, ValueExt, WorkflowDefinition,
};
pub use parser::load_workflow;
