//! Named rule contexts over `validator` field rules.
//!
//! Targets derive [`validator::Validate`]; [`validate_in_context`] evaluates
//! the derived rules under a named context and folds the result into a
//! [`ValidationReport`] with a tri-state outcome. Any non-valid outcome,
//! whatever its severity, blocks the accept transition.

use once_cell::sync::Lazy;
use regex::Regex;
use validator::Validate;

use crate::config::EMAIL_PATTERN;

/// Compiled email syntax rule, shared by every rule context that checks
/// email fields.
pub static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(EMAIL_PATTERN).expect("email pattern must compile"));

/// Severity of a single rule violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RuleSeverity {
    Information,
    Warning,
    Error,
}

/// One violated rule, tied to the field it was declared on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleViolation {
    pub field: String,
    pub severity: RuleSeverity,
    pub message: String,
}

/// Aggregated outcome of a rule-context evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Information,
    Warning,
    Error,
}

/// Result of evaluating a target against a named rule context.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    context: String,
    violations: Vec<RuleViolation>,
}

impl ValidationReport {
    /// The rule context this report was produced under.
    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn violations(&self) -> &[RuleViolation] {
        &self.violations
    }

    /// Highest severity among the violations, or `Valid` when there are none.
    pub fn outcome(&self) -> ValidationOutcome {
        match self.violations.iter().map(|v| v.severity).max() {
            None => ValidationOutcome::Valid,
            Some(RuleSeverity::Information) => ValidationOutcome::Information,
            Some(RuleSeverity::Warning) => ValidationOutcome::Warning,
            Some(RuleSeverity::Error) => ValidationOutcome::Error,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let details = self
            .violations
            .iter()
            .map(|v| format!("{}: {}", v.field, v.message))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "[{}] {}", self.context, details)
    }
}

/// Evaluate a target's derived rules under a named context.
pub fn validate_in_context<T: Validate>(context: &str, target: &T) -> ValidationReport {
    let mut violations = Vec::new();

    if let Err(errors) = target.validate() {
        for (field, errs) in errors.field_errors() {
            for err in errs.iter() {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                violations.push(RuleViolation {
                    field: field.to_string(),
                    severity: severity_for(field, err.code.as_ref()),
                    message,
                });
            }
        }
        // field_errors() iterates a map; order the report for the UI
        violations.sort_by(|a, b| a.field.cmp(&b.field));
    }

    tracing::debug!(context, violations = violations.len(), "rule context evaluated");

    ValidationReport {
        context: context.to_string(),
        violations,
    }
}

/// Password length policy reports at warning level; warnings still block
/// the accept transition.
fn severity_for(field: &str, code: &str) -> RuleSeverity {
    match (field, code) {
        ("password", "length") => RuleSeverity::Warning,
        _ => RuleSeverity::Error,
    }
}
