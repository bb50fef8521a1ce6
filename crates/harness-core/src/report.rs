//! Aggregated run reporting.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::validate::ValidationResult;

/// Terminal state of one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    /// Every predicate held
    Passed,
    /// At least one predicate failed
    Failed,
    /// The scenario's lifecycle itself failed (fixture, snapshot, timeout)
    Errored,
}

/// Result record for one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioRecord {
    pub name: String,
    pub status: ScenarioStatus,
    /// Per-predicate outcomes; absent when the scenario errored
    pub validation: Option<ValidationResult>,
    /// Error detail; present only when the scenario errored
    pub error: Option<String>,
}

/// Aggregate of a whole orchestration run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub scenarios: Vec<ScenarioRecord>,
}

impl Report {
    /// Create an empty report stamped with the current time.
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            total: 0,
            passed: 0,
            failed: 0,
            errored: 0,
            scenarios: Vec::new(),
        }
    }

    /// Record a validated scenario.
    pub fn record_validation(&mut self, name: impl Into<String>, validation: ValidationResult) {
        let status = if validation.passed {
            ScenarioStatus::Passed
        } else {
            ScenarioStatus::Failed
        };
        self.push(ScenarioRecord {
            name: name.into(),
            status,
            validation: Some(validation),
            error: None,
        });
    }

    /// Record a scenario whose lifecycle failed before validation.
    pub fn record_error(&mut self, name: impl Into<String>, error: impl Into<String>) {
        self.push(ScenarioRecord {
            name: name.into(),
            status: ScenarioStatus::Errored,
            validation: None,
            error: Some(error.into()),
        });
    }

    fn push(&mut self, record: ScenarioRecord) {
        self.total += 1;
        match record.status {
            ScenarioStatus::Passed => self.passed += 1,
            ScenarioStatus::Failed => self.failed += 1,
            ScenarioStatus::Errored => self.errored += 1,
        }
        self.scenarios.push(record);
    }

    /// True iff every scenario passed. Drives the process exit status.
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }

    /// Human-readable summary with expected/actual detail for failures.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for record in &self.scenarios {
            let status = match record.status {
                ScenarioStatus::Passed => "PASS",
                ScenarioStatus::Failed => "FAIL",
                ScenarioStatus::Errored => "ERROR",
            };
            out.push_str(&format!("{status:>5}  {}\n", record.name));

            if let Some(error) = &record.error {
                out.push_str(&format!("       {error}\n"));
            }
            if let Some(validation) = &record.validation {
                for outcome in &validation.outcomes {
                    let mark = if outcome.passed { "ok" } else { "FAILED" };
                    out.push_str(&format!("       [{mark}] {}\n", outcome.name));
                    if !outcome.passed {
                        out.push_str(&format!("            expected: {}\n", outcome.expected));
                        out.push_str(&format!("            actual:   {}\n", outcome.actual));
                    }
                }
            }
        }
        out.push_str(&format!(
            "\n{} scenarios: {} passed, {} failed, {} errored\n",
            self.total, self.passed, self.failed, self.errored
        ));
        out
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{PredicateOutcome, ValidationResult};

    fn outcome(passed: bool) -> ValidationResult {
        ValidationResult {
            passed,
            outcomes: vec![PredicateOutcome {
                name: "head-changed".to_string(),
                passed,
                expected: "HEAD != abc".to_string(),
                actual: "HEAD abc".to_string(),
            }],
        }
    }

    #[test]
    fn counts_follow_recorded_statuses() {
        let mut report = Report::new();
        report.record_validation("a", outcome(true));
        report.record_validation("b", outcome(false));
        report.record_error("c", "fixture exploded");

        assert_eq!(report.total, 3);
        assert_eq!(report.passed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errored, 1);
        assert!(!report.all_passed());
    }

    #[test]
    fn all_passed_requires_no_failures_and_no_errors() {
        let mut report = Report::new();
        report.record_validation("a", outcome(true));
        assert!(report.all_passed());

        report.record_error("b", "boom");
        assert!(!report.all_passed());
    }

    #[test]
    fn render_includes_expected_and_actual_for_failures() {
        let mut report = Report::new();
        report.record_validation("bad", outcome(false));

        let text = report.render();
        assert!(text.contains("FAIL"));
        assert!(text.contains("expected: HEAD != abc"));
        assert!(text.contains("actual:   HEAD abc"));
    }
}
