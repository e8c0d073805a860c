//! Validation Findings
//!
//! Every check reports through [`Finding`] records. A [`ValidationReport`]
//! keeps them in the order the checks produced them and decides pass/fail.

use std::fmt;

use serde::Serialize;

/// How serious a finding is.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Fails validation
    Error,
    /// Fails validation only in strict mode
    Warning,
    /// Advisory note, including positive confirmations
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The validation pass that produced a finding.
///
/// Declared in the order the passes run.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    Structure,
    Metadata,
    Inputs,
    Security,
    Steps,
    Dependencies,
    DataFlow,
    SecurityAudit,
    BestPractices,
}

impl Check {
    /// Every check, in run order.
    pub const ALL: [Check; 9] = [
        Self::Structure,
        Self::Metadata,
        Self::Inputs,
        Self::Security,
        Self::Steps,
        Self::Dependencies,
        Self::DataFlow,
        Self::SecurityAudit,
        Self::BestPractices,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structure => "structure",
            Self::Metadata => "metadata",
            Self::Inputs => "inputs",
            Self::Security => "security",
            Self::Steps => "steps",
            Self::Dependencies => "dependencies",
            Self::DataFlow => "data_flow",
            Self::SecurityAudit => "security_audit",
            Self::BestPractices => "best_practices",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single problem or note found in a workflow definition.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub check: Check,
    pub message: String,
    /// Dotted path to the offending part of the document, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Finding {
    pub fn new(severity: Severity, check: Check, message: impl Into<String>) -> Self {
        Self {
            severity,
            check,
            message: message.into(),
            location: None,
        }
    }

    pub fn error(check: Check, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, check, message)
    }

    pub fn warning(check: Check, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, check, message)
    }

    pub fn info(check: Check, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, check, message)
    }

    /// Attaches a location to the finding.
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} (at {})", self.message, location),
            None => f.write_str(&self.message),
        }
    }
}

/// Outcome of a validation run.
#[derive(Serialize, Debug, Clone)]
pub struct ValidationReport {
    findings: Vec<Finding>,
    strict: bool,
}

impl ValidationReport {
    pub fn new(findings: Vec<Finding>, strict: bool) -> Self {
        Self { findings, strict }
    }

    /// Returns all findings in the order they were produced.
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Returns findings of one severity, preserving order.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.with_severity(Severity::Warning)
    }

    pub fn infos(&self) -> impl Iterator<Item = &Finding> {
        self.with_severity(Severity::Info)
    }

    /// Returns findings produced by one check.
    pub fn from_check(&self, check: Check) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.check == check)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.with_severity(severity).count()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Returns true if the workflow passed.
    ///
    /// Errors always fail. Warnings fail only in strict mode.
    pub fn passed(&self) -> bool {
        !self.has_errors() && !(self.strict && self.has_warnings())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed() -> Vec<Finding> {
        vec![
            Finding::warning(Check::Metadata, "Consider declaring 'idempotent'"),
            Finding::info(Check::Steps, "Step 'a' has no telemetry configuration"),
        ]
    }

    #[test]
    fn test_report_without_errors_passes() {
        let report = ValidationReport::new(mixed(), false);

        assert!(report.passed());
        assert_eq!(report.count(Severity::Warning), 1);
        assert_eq!(report.count(Severity::Info), 1);
    }

    #[test]
    fn test_strict_mode_fails_on_warnings() {
        let report = ValidationReport::new(mixed(), true);

        assert!(!report.has_errors());
        assert!(!report.passed());
    }

    #[test]
    fn test_strict_mode_ignores_info() {
        let findings = vec![Finding::info(Check::Security, "ok")];
        let report = ValidationReport::new(findings, true);

        assert!(report.passed());
    }

    #[test]
    fn test_error_fails_report() {
        let mut findings = mixed();
        findings.push(Finding::error(Check::Dependencies, "cycle"));
        let report = ValidationReport::new(findings, false);

        assert!(!report.passed());
        assert_eq!(report.errors().count(), 1);
        assert_eq!(report.from_check(Check::Dependencies).count(), 1);
    }

    #[test]
    fn test_finding_display_with_location() {
        let finding = Finding::error(Check::Metadata, "metadata.platform is required")
            .at("metadata.platform");

        assert_eq!(
            finding.to_string(),
            "metadata.platform is required (at metadata.platform)"
        );
    }

    #[test]
    fn test_finding_serializes_snake_case() {
        let finding = Finding::warning(Check::DataFlow, "undeclared field");
        let json = serde_json::to_value(&finding).unwrap();

        assert_eq!(json["severity"], "warning");
        assert_eq!(json["check"], "data_flow");
        assert!(json.get("location").is_none());
    }
}
