//! Workflow Loader
//!
//! Reads a workflow definition from a JSON file. Malformed input is
//! rejected here, before any validation pass or simulation sees it.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::{debug, info};

use super::model::WorkflowDefinition;
use crate::error::LoadError;

/// Loads a workflow definition from a JSON file.
///
/// # Arguments
///
/// * `path` - Path to the workflow JSON file
///
/// # Returns
///
/// * `Ok(WorkflowDefinition)` - Parsed document, not yet validated
/// * `Err(LoadError)` - File missing, unreadable, or not valid JSON
///
/// # Example
///
/// ```rust,no_run
/// use flowguard::workflow::load_workflow;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let workflow = load_workflow("create_order.json")?;
///     println!("Loaded {} steps", workflow.steps().len());
///     Ok(())
/// }
/// ```
pub fn load_workflow(path: impl AsRef<Path>) -> Result<WorkflowDefinition, LoadError> {
    let path = path.as_ref();
    info!("Loading workflow from: {}", path.display());

    let content = fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    debug!("JSON content loaded ({} bytes)", content.len());

    let workflow =
        WorkflowDefinition::from_json_str(&content).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    info!(
        "Parsed workflow with {} top-level sections, {} steps",
        workflow.section_names().len(),
        workflow.steps().len()
    );

    Ok(workflow)
}
