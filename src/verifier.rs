//! Verification orchestrator.
//!
//! Sequences the individual checks into one pass/fail verdict. Run and
//! comment validation depend on the main PR being found and valid; the
//! failure-scenario lifecycle is an independent concern and always runs.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::comment_check;
use crate::config::VerifierConfig;
use crate::github::PlatformClient;
use crate::report::{ValidationReport, VerificationSummary};
use crate::run_check;
use crate::scenario::ScenarioRunner;
use crate::workflow_check;

/// Orchestrates a full verification run against one repository.
pub struct Verifier<C: PlatformClient> {
    client: Arc<C>,
    config: VerifierConfig,
}

impl<C: PlatformClient> Verifier<C> {
    /// Creates a verifier over the given client and configuration.
    pub fn new(client: C, config: VerifierConfig) -> Self {
        Self {
            client: Arc::new(client),
            config,
        }
    }

    /// Runs every check and returns the aggregated summary.
    pub async fn run(&self) -> VerificationSummary {
        let run_id = Uuid::new_v4().to_string();
        info!(%run_id, repo = %self.config.repository, "starting workflow verification");

        let mut reports = Vec::new();

        let workflow_report = workflow_check::verify_workflow_file(
            &*self.client,
            &self.config.workflow,
            &self.config.main_pr.target_branch,
        )
        .await;
        log_report(&workflow_report);
        reports.push(workflow_report);

        let (pr_report, main_pr) = run_check::find_and_check_main_pr(
            &*self.client,
            &self.config.main_pr,
            self.config.per_page,
        )
        .await;
        log_report(&pr_report);
        let main_pr_ok = pr_report.is_passing();
        reports.push(pr_report);

        match main_pr.filter(|_| main_pr_ok) {
            Some(pr) => {
                let runs_report = run_check::verify_workflow_runs(
                    &*self.client,
                    &pr,
                    &self.config.workflow,
                    self.config.per_page,
                )
                .await;
                log_report(&runs_report);
                reports.push(runs_report);

                let comments_report =
                    comment_check::verify_pr_comments(&*self.client, pr.number, &self.config.comments)
                        .await;
                log_report(&comments_report);
                reports.push(comments_report);
            }
            None => {
                info!("main PR check did not yield a usable record; skipping run and comment validation");
                reports.push(ValidationReport::skipped(run_check::RUNS_CHECK));
                reports.push(ValidationReport::skipped(comment_check::CHECK_NAME));
            }
        }

        // Independent concern: scenarios run no matter what came before.
        let scenario_report = ScenarioRunner::new(self.client.clone(), &self.config)
            .run()
            .await;
        log_report(&scenario_report);
        reports.push(scenario_report);

        let passed = reports.iter().all(ValidationReport::is_passing);
        info!(%run_id, passed, "verification finished");

        VerificationSummary {
            run_id,
            reports,
            passed,
        }
    }
}

/// Logs a report's outcome and errors inline as the check completes.
fn log_report(report: &ValidationReport) {
    if report.is_passing() {
        info!(check = %report.name, status = ?report.status, "check finished");
    } else {
        warn!(check = %report.name, "check failed");
        for error in &report.errors {
            warn!(check = %report.name, "  - {}", error);
        }
    }
}
