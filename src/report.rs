//! Validation reports and the aggregated verification summary.

/// Terminal state of one verification check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// The check ran and found no violations.
    Passed,
    /// The check ran and found at least one violation.
    Failed,
    /// The check could not run because a prerequisite was missing.
    Skipped,
}

/// Outcome of one verification dimension.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Name of the dimension (e.g. `workflow-file`).
    pub name: String,
    /// Terminal state of the check.
    pub status: CheckStatus,
    /// Violations found, in discovery order.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// A passing report with no errors.
    pub fn passed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Passed,
            errors: Vec::new(),
        }
    }

    /// A report whose status is derived from the collected errors.
    pub fn from_errors(name: impl Into<String>, errors: Vec<String>) -> Self {
        let status = if errors.is_empty() {
            CheckStatus::Passed
        } else {
            CheckStatus::Failed
        };
        Self {
            name: name.into(),
            status,
            errors,
        }
    }

    /// A skipped report (prerequisite missing; not a failure).
    pub fn skipped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Skipped,
            errors: Vec::new(),
        }
    }

    /// Returns true unless the check ran and failed.
    pub fn is_passing(&self) -> bool {
        self.status != CheckStatus::Failed
    }
}

/// Aggregated result of one verification run.
#[derive(Debug)]
pub struct VerificationSummary {
    /// Identifier of this verification run.
    pub run_id: String,
    /// Reports in execution order.
    pub reports: Vec<ValidationReport>,
    /// Overall verdict: every executed check passed.
    pub passed: bool,
}

impl VerificationSummary {
    /// Renders the human-readable summary block printed at process exit.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&"=".repeat(60));
        out.push('\n');
        out.push_str(&format!("Verification run {}\n\n", self.run_id));

        for report in &self.reports {
            let marker = match report.status {
                CheckStatus::Passed => "PASS",
                CheckStatus::Failed => "FAIL",
                CheckStatus::Skipped => "SKIP",
            };
            out.push_str(&format!("  [{}] {}\n", marker, report.name));
            for error in &report.errors {
                out.push_str(&format!("        - {}\n", error));
            }
        }

        out.push('\n');
        if self.passed {
            out.push_str("Overall: PASS - workflow automation behaves as expected\n");
        } else {
            out.push_str("Overall: FAIL - see errors above\n");
        }
        out.push_str(&"=".repeat(60));
        out
    }
}
