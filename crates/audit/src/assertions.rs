//! Assertion evaluation
//!
//! Applies the configured rules to a URL's aggregated metrics. Failed
//! error-severity assertions gate the build; failed warnings are recorded
//! and reported but never fatal. A metric the report does not contain is an
//! error-severity failure regardless of the rule's own severity, so a
//! misspelled key cannot pass silently.

use serde::Serialize;

use crate::config::{AssertConfig, AssertionRule, Bound, Severity};
use crate::report::MedianReport;

/// One evaluated rule.
#[derive(Debug, Clone, Serialize)]
pub struct AssertionOutcome {
    pub key: String,
    pub severity: Severity,
    pub passed: bool,
    pub observed: Option<f64>,
    pub bound: Bound,
    pub message: String,
}

impl AssertionRule {
    /// Evaluate this rule against an observed value.
    pub fn evaluate(&self, key: &str, observed: Option<f64>) -> AssertionOutcome {
        let Some(value) = observed else {
            return AssertionOutcome {
                key: key.to_string(),
                severity: Severity::Error,
                passed: false,
                observed: None,
                bound: self.bound,
                message: "metric not present in report".to_string(),
            };
        };

        let (passed, message) = match self.bound {
            Bound::MinScore(min) => {
                if value >= min {
                    (true, format!("score {:.2} meets minimum {:.2}", value, min))
                } else {
                    (false, format!("score {:.2} below minimum {:.2}", value, min))
                }
            }
            Bound::MaxNumericValue(max) => {
                if value <= max {
                    (true, format!("{:.1} within ceiling {:.1}", value, max))
                } else {
                    (false, format!("{:.1} exceeds ceiling {:.1}", value, max))
                }
            }
        };

        AssertionOutcome {
            key: key.to_string(),
            severity: self.severity,
            passed,
            observed: Some(value),
            bound: self.bound,
            message,
        }
    }
}

/// Evaluate every configured rule against a URL's aggregated report.
pub fn evaluate_assertions(assert: &AssertConfig, report: &MedianReport) -> Vec<AssertionOutcome> {
    assert
        .assertions
        .iter()
        .map(|(key, rule)| rule.evaluate(key, report.metric(key)))
        .collect()
}

/// Error-severity failures: these make the audit fail.
pub fn failures(outcomes: &[AssertionOutcome]) -> Vec<&AssertionOutcome> {
    outcomes
        .iter()
        .filter(|o| !o.passed && o.severity == Severity::Error)
        .collect()
}

/// Warn-severity failures: recorded, never fatal.
pub fn warnings(outcomes: &[AssertionOutcome]) -> Vec<&AssertionOutcome> {
    outcomes
        .iter()
        .filter(|o| !o.passed && o.severity == Severity::Warn)
        .collect()
}
