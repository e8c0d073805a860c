//! Security Checks
//!
//! Two passes live here: validation of the declared `security` section, and
//! an audit of the whole document for hardcoded credentials and inputs that
//! would be logged without PII declarations.

use log::warn;
use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::findings::{Check, Finding};
use crate::workflow::model::{display_value, ALLOWED_SECRETS_HANDLING};
use crate::workflow::WorkflowDefinition;

/// Kinds of credential the audit looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    Password,
    Token,
    ApiKey,
    Secret,
}

impl CredentialKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Token => "token",
            Self::ApiKey => "API key",
            Self::Secret => "secret",
        }
    }
}

/// Literal `name: "value"` / `name = 'value'` assignments, matched against
/// lowercased compact JSON.
static CREDENTIAL_PATTERNS: Lazy<Vec<(CredentialKind, Regex)>> = Lazy::new(|| {
    [
        (CredentialKind::Password, r#"password["']?\s*[:=]\s*["'][^"']+["']"#),
        (CredentialKind::Token, r#"token["']?\s*[:=]\s*["'][^"']+["']"#),
        (CredentialKind::ApiKey, r#"api[_-]?key["']?\s*[:=]\s*["'][^"']+["']"#),
        (CredentialKind::Secret, r#"secret["']?\s*[:=]\s*["'][^"']+["']"#),
    ]
    .into_iter()
    .map(|(kind, pattern)| (kind, Regex::new(pattern).expect("valid regex")))
    .collect()
});

/// Checks the declared security configuration.
///
/// An absent or empty section is a single error and nothing else is checked.
pub fn check_security(workflow: &WorkflowDefinition, findings: &mut Vec<Finding>) {
    let security = workflow.security();

    if security.is_empty() {
        findings.push(Finding::error(Check::Security, "Security configuration is required").at("security"));
        return;
    }

    if !security.has("auth_required") {
        findings.push(
            Finding::error(Check::Security, "security.auth_required must be declared")
                .at("security.auth_required"),
        );
    }

    match security.secrets_handling() {
        None => findings.push(
            Finding::error(Check::Security, "security.secrets_handling must be declared")
                .at("security.secrets_handling"),
        ),
        Some(value) => match value.as_str() {
            Some("runtime_injected") => findings.push(Finding::info(
                Check::Security,
                "Credential-agnostic design (runtime_injected)",
            )),
            Some(mode) if ALLOWED_SECRETS_HANDLING.contains(&mode) => findings.push(
                Finding::warning(
                    Check::Security,
                    "Consider using 'runtime_injected' for better security",
                )
                .at("security.secrets_handling"),
            ),
            _ => findings.push(
                Finding::error(
                    Check::Security,
                    format!("Invalid secrets_handling: {}", display_value(value)),
                )
                .at("security.secrets_handling"),
            ),
        },
    }

    if !security.has("minimum_role") {
        findings.push(
            Finding::warning(Check::Security, "Consider specifying 'minimum_role' for RBAC")
                .at("security.minimum_role"),
        );
    }

    if !security.has("rate_limit") {
        findings.push(
            Finding::warning(Check::Security, "Consider adding rate_limit configuration")
                .at("security.rate_limit"),
        );
    }
}

/// Scans the whole document for hardcoded credentials and PII exposure.
///
/// Each credential kind is reported at most once, however often it occurs.
pub fn audit_security(workflow: &WorkflowDefinition, findings: &mut Vec<Finding>) {
    let flattened = workflow.root().to_string().to_lowercase();

    for (kind, pattern) in CREDENTIAL_PATTERNS.iter() {
        if pattern.is_match(&flattened) {
            warn!("Possible hardcoded {} detected", kind.label());
            findings.push(Finding::error(
                Check::SecurityAudit,
                format!("SECURITY: Possible hardcoded {} found in workflow", kind.label()),
            ));
        }
    }

    if workflow.observability().logs_inputs() && !workflow.security().declares_pii_fields() {
        findings.push(
            Finding::warning(
                Check::SecurityAudit,
                "Audit logs inputs but no PII fields declared - consider privacy implications",
            )
            .at("observability.audit.log_inputs"),
        );
    }
}
