//! Report Rendering
//!
//! Turns validation reports and simulation outcomes into terminal text or
//! JSON. Rendering never changes a result; `verbose` only adds detail.

use std::fmt;

use colored::Colorize;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::simulation::{
    EventKind, Phase, SimulationOutcome, SimulationStatus, StepDisposition, StepRecord,
};
use crate::validation::{Check, Finding, Severity, ValidationReport};

const RULE_WIDTH: usize = 60;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Terminal view of a validation report.
pub struct ValidationDisplay<'a> {
    pub source: &'a str,
    pub report: &'a ValidationReport,
    pub verbose: bool,
}

impl fmt::Display for ValidationDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;

        writeln!(f, "Validating: {}", self.source.bold())?;
        if report.is_strict() {
            writeln!(f, "Mode: strict (warnings fail validation)")?;
        }
        writeln!(f, "{}", rule())?;

        let groups: [(Severity, &str, Vec<&Finding>); 3] = [
            (Severity::Error, "ERRORS", report.errors().collect()),
            (Severity::Warning, "WARNINGS", report.warnings().collect()),
            (Severity::Info, "INFO", report.infos().collect()),
        ];

        for (severity, heading, group) in groups {
            if group.is_empty() {
                continue;
            }

            writeln!(f)?;
            let title = format!("{} ({}):", heading, group.len());
            let (title, marker) = match severity {
                Severity::Error => (title.red().bold(), "✗".red()),
                Severity::Warning => (title.yellow().bold(), "⚠".yellow()),
                Severity::Info => (title.blue().bold(), "ℹ".blue()),
            };
            writeln!(f, "{}", title)?;

            for finding in group {
                if self.verbose {
                    writeln!(f, "  {} [{}] {}", marker, finding.check, finding)?;
                } else {
                    writeln!(f, "  {} {}", marker, finding.message)?;
                }
            }
        }

        writeln!(f)?;
        writeln!(f, "{}", rule())?;

        let verdict = if report.has_errors() {
            format!("✗ Validation failed with {} errors", report.count(Severity::Error))
                .red()
                .bold()
        } else if !report.passed() {
            "✗ Validation failed (warnings in strict mode)".red().bold()
        } else if report.has_warnings() {
            "✓ Validation passed (with warnings)".yellow().bold()
        } else {
            "✓ Validation passed with no issues".green().bold()
        };
        writeln!(f, "{}", verdict)
    }
}

/// Renders a validation report for the terminal.
pub fn render_validation(source: &str, report: &ValidationReport, verbose: bool) -> String {
    ValidationDisplay {
        source,
        report,
        verbose,
    }
    .to_string()
}

/// Terminal view of a simulation outcome.
pub struct SimulationDisplay<'a> {
    pub outcome: &'a SimulationOutcome,
    pub verbose: bool,
}

impl SimulationDisplay<'_> {
    fn write_step(&self, f: &mut fmt::Formatter<'_>, record: &StepRecord) -> fmt::Result {
        writeln!(
            f,
            "  Step {}: {} ({})",
            record.number,
            record.step_id.bold(),
            record.operation.as_deref().unwrap_or("no operation")
        )?;
        if let Some(endpoint) = &record.endpoint {
            writeln!(f, "      Endpoint: {}", endpoint)?;
        }
        writeln!(f, "      {}", describe_disposition(&record.disposition))?;

        if self.verbose {
            if let Some(description) = &record.description {
                writeln!(f, "      Description: {}", description)?;
            }
            if !record.dependencies.is_empty() {
                writeln!(f, "      Depends on: {}", record.dependencies.join(", "))?;
            }
            if !record.resolved_inputs.is_null() {
                writeln!(f, "      Inputs: {}", record.resolved_inputs)?;
            }
            for (field, value) in &record.outputs {
                writeln!(f, "      Output {} = {}", field, value)?;
            }
        } else if !record.outputs.is_empty() {
            let fields: Vec<&str> = record.outputs.keys().map(String::as_str).collect();
            writeln!(f, "      Outputs: {}", fields.join(", "))?;
        }
        Ok(())
    }
}

impl fmt::Display for SimulationDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = self.outcome;

        writeln!(f, "{}", "DRY RUN SIMULATION".bold())?;
        writeln!(f, "{}", rule())?;
        writeln!(f, "Trace ID:  {}", outcome.trace_id)?;
        writeln!(
            f,
            "Workflow:  {}",
            outcome.workflow_name.as_deref().unwrap_or("unknown")
        )?;
        writeln!(
            f,
            "Platform:  {}",
            outcome.platform.as_deref().unwrap_or("unknown")
        )?;
        writeln!(f, "Started:   {}", outcome.started_at)?;

        let mut current: Option<Phase> = None;

        for event in &outcome.events {
            if current != Some(event.phase) {
                current = Some(event.phase);
                writeln!(f)?;
                writeln!(f, "{}", format!("[{}]", event.phase).cyan().bold())?;
            }

            match &event.kind {
                EventKind::Advisory { message } => {
                    writeln!(f, "  {} {}", "⚠".yellow(), message)?;
                }
                EventKind::NoConditions => writeln!(f, "  No conditions defined")?,
                EventKind::ConditionPassed { id, description } => {
                    writeln!(f, "  {} {}", "✓".green(), id)?;
                    if self.verbose {
                        writeln!(f, "      {}", description)?;
                    }
                }
                EventKind::ConditionFailed {
                    id,
                    description,
                    critical,
                    message,
                } => {
                    let label = if *critical { "critical" } else { "non-critical" };
                    writeln!(f, "  {} {} ({}): {}", "✗".red(), id, label, message)?;
                    if self.verbose {
                        writeln!(f, "      {}", description)?;
                    }
                }
                EventKind::ConditionSkipped { id, description } => {
                    writeln!(f, "  - {} skipped: {}", id, description)?;
                }
                EventKind::Step(record) => self.write_step(f, record)?,
                EventKind::DependencyUnsatisfied {
                    step_id,
                    dependency,
                } => {
                    writeln!(
                        f,
                        "  {} Step '{}' needs '{}', which has not run",
                        "✗".red(),
                        step_id,
                        dependency
                    )?;
                }
                EventKind::Completed | EventKind::Aborted { .. } => {}
            }
        }

        writeln!(f)?;
        writeln!(f, "{}", rule())?;

        match &outcome.status {
            SimulationStatus::Done => {
                // Counted from the trace: duplicate ids share one output entry.
                let (simulated, skipped) = outcome
                    .step_records()
                    .fold((0, 0), |(simulated, skipped), record| {
                        (simulated + 1, skipped + usize::from(record.disposition.is_skipped()))
                    });
                writeln!(
                    f,
                    "{}",
                    format!(
                        "✓ Dry run completed ({} steps simulated, {} skipped)",
                        simulated, skipped
                    )
                    .green()
                    .bold()
                )
            }
            SimulationStatus::Aborted { phase, fault } => writeln!(
                f,
                "{}",
                format!("✗ Dry run aborted in {}: {}", phase, fault).red().bold()
            ),
        }
    }
}

/// Renders a simulation outcome for the terminal.
pub fn render_simulation(outcome: &SimulationOutcome, verbose: bool) -> String {
    SimulationDisplay { outcome, verbose }.to_string()
}

fn describe_disposition(disposition: &StepDisposition) -> String {
    match disposition {
        StepDisposition::Executed => "Executed (read-only query)".to_string(),
        StepDisposition::MutationSkipped => {
            "Skipped mutation (outputs synthesized)".to_string()
        }
        StepDisposition::WorkflowSkipped { workflow_ref } => format!(
            "Skipped sub-workflow '{}'",
            workflow_ref.as_deref().unwrap_or("unknown")
        ),
        StepDisposition::CustomSkipped => "Skipped custom operation".to_string(),
        StepDisposition::UnknownSkipped { operation } => format!(
            "Skipped unrecognised operation '{}'",
            operation.as_deref().unwrap_or("none")
        ),
    }
}

/// JSON form of a validation report, including the verdict.
///
/// `by_check` lists finding counts for every check that reported anything.
pub fn validation_json(source: &str, report: &ValidationReport) -> Value {
    let by_check: Map<String, Value> = Check::ALL
        .iter()
        .filter_map(|&check| {
            let count = report.from_check(check).count();
            (count > 0).then(|| (check.as_str().to_string(), json!(count)))
        })
        .collect();

    json!({
        "source": source,
        "passed": report.passed(),
        "strict": report.is_strict(),
        "errors": report.count(Severity::Error),
        "warnings": report.count(Severity::Warning),
        "info": report.count(Severity::Info),
        "by_check": by_check,
        "findings": report.findings(),
    })
}

/// Pretty-prints any serializable result.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}
