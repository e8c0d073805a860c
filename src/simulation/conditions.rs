//! Condition Evaluation
//!
//! A real deployment would run each pre-condition against live state. A dry
//! run has no live state, so the default evaluator passes everything.

use log::debug;

use crate::workflow::Condition;

/// Decides whether a declared condition holds.
pub trait ConditionEvaluator {
    fn evaluate(&self, condition: &Condition<'_>) -> bool;
}

/// Evaluator used during a dry run. Every condition passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunEvaluator;

impl ConditionEvaluator for DryRunEvaluator {
    fn evaluate(&self, condition: &Condition<'_>) -> bool {
        let id = condition.id();

        if id.contains("check_auth") || condition.condition_type() == "security" {
            debug!("Condition '{}': assuming credentials are valid", id);
        } else if id.contains("exists") || id.contains("unique") {
            debug!("Condition '{}': assuming entity check holds", id);
        } else {
            debug!("Condition '{}': no dry-run rule, passing", id);
        }

        true
    }
}
