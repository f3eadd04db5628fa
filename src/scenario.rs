//! Ephemeral test-scenario lifecycle.
//!
//! For each intentionally broken scenario: create an isolated branch from
//! the target branch tip, commit the broken file, open a pull request,
//! observe the workflow's verdict, and tear everything down. Any scenario
//! failure aborts only that scenario; cleanup runs exactly once for every
//! pull request that was actually created.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::VerifierConfig;
use crate::github::{self, PlatformClient};
use crate::poller::RunPoller;
use crate::report::ValidationReport;

/// Name of this verification dimension.
pub const CHECK_NAME: &str = "failure-scenarios";

/// Page size when fetching runs for per-PR validation.
const VALIDATION_FETCH_COUNT: u32 = 5;

/// One predefined, intentionally broken change.
#[derive(Debug, Clone, Deserialize)]
pub struct TestScenario {
    /// Pull request title; also used in error messages.
    pub title: String,
    /// Branch the scenario lives on.
    pub branch: String,
    /// Path of the broken file.
    pub file_path: String,
    /// Deliberately broken file content.
    pub content: String,
    /// The job this scenario must cause to fail.
    pub expected_failure_job: String,
}

/// A live test pull request, tracked for cleanup.
#[derive(Debug, Clone)]
pub struct TestPr {
    pub number: u64,
    pub branch: String,
}

/// Creates, observes, and tears down scenario pull requests.
pub struct ScenarioRunner<C> {
    client: Arc<C>,
    workflow_file: String,
    target_branch: String,
    scenarios: Vec<TestScenario>,
    wait_budget: Duration,
    cleanup_enabled: bool,
    /// Pause after PR creation before polling begins.
    trigger_grace: Duration,
    /// Pause after deleting a conflicting branch before recreating it.
    propagation_delay: Duration,
    poll_interval: Duration,
    poll_grace: Duration,
}

impl<C: PlatformClient> ScenarioRunner<C> {
    /// Creates a runner from the verifier configuration.
    pub fn new(client: Arc<C>, config: &VerifierConfig) -> Self {
        Self {
            client,
            workflow_file: config.workflow.file_name.clone(),
            target_branch: config.main_pr.target_branch.clone(),
            scenarios: config.scenarios.clone(),
            wait_budget: Duration::from_secs(config.budgets.scenario_wait_secs),
            cleanup_enabled: config.cleanup_enabled,
            trigger_grace: Duration::from_secs(5),
            propagation_delay: Duration::from_secs(2),
            poll_interval: Duration::from_secs(10),
            poll_grace: Duration::from_secs(5),
        }
    }

    /// Overrides the grace and propagation pauses. Tests use this to run
    /// without wall-clock delays.
    pub fn with_timing(mut self, trigger_grace: Duration, propagation_delay: Duration) -> Self {
        self.trigger_grace = trigger_grace;
        self.propagation_delay = propagation_delay;
        self
    }

    /// Overrides the completion-poll cadence.
    pub fn with_poll_cadence(mut self, interval: Duration, grace: Duration) -> Self {
        self.poll_interval = interval;
        self.poll_grace = grace;
        self
    }

    /// Runs the full scenario lifecycle and reports the result.
    pub async fn run(&self) -> ValidationReport {
        let mut errors = Vec::new();
        let mut created: Vec<(&TestScenario, TestPr)> = Vec::new();

        for (index, scenario) in self.scenarios.iter().enumerate() {
            info!(scenario = index + 1, title = %scenario.title, "creating test scenario");
            match self.create_scenario_pr(scenario).await {
                Ok(pr) => {
                    info!(pr = pr.number, branch = %pr.branch, "created test PR");
                    created.push((scenario, pr));
                }
                Err(reason) => {
                    warn!(scenario = index + 1, %reason, "scenario setup failed");
                    errors.push(format!(
                        "scenario {} ({}): {}",
                        index + 1,
                        scenario.title,
                        reason
                    ));
                }
            }
        }

        if !created.is_empty() {
            info!(count = created.len(), "waiting for scenario workflow runs to settle");
            sleep(self.trigger_grace).await;

            let poller = RunPoller::new(self.client.clone())
                .with_cadence(self.poll_interval, self.poll_grace);
            let outcome = poller
                .await_completion(&self.workflow_file, self.wait_budget)
                .await;
            if !outcome.is_satisfied() {
                warn!(?outcome, "scenario runs did not settle cleanly; validating current state");
            }

            for (scenario, pr) in &created {
                if let Some(error) = self.validate_expected_failure(scenario, pr).await {
                    errors.push(error);
                }
            }
        }

        if self.cleanup_enabled && !created.is_empty() {
            info!(count = created.len(), "cleaning up test PRs and branches");
            for (_, pr) in &created {
                self.cleanup_pr(pr, &mut errors).await;
            }
        }

        ValidationReport::from_errors(CHECK_NAME, errors)
    }

    /// Creates branch, file commit, and pull request for one scenario.
    ///
    /// The step order is load-bearing: branch before file, file before PR,
    /// PR before it joins the cleanup set.
    async fn create_scenario_pr(&self, scenario: &TestScenario) -> Result<TestPr, String> {
        let client = &*self.client;

        let Some(target_sha) = github::branch_head_sha(client, &self.target_branch).await else {
            return Err(format!("cannot resolve {} branch tip", self.target_branch));
        };

        if !github::create_ref(client, &scenario.branch, &target_sha).await {
            debug!(branch = %scenario.branch, "branch exists; deleting and recreating");
            if !github::delete_ref(client, &scenario.branch).await {
                return Err(format!(
                    "cannot delete existing branch {}",
                    scenario.branch
                ));
            }
            // Ref deletion takes a moment to propagate.
            sleep(self.propagation_delay).await;
            if !github::create_ref(client, &scenario.branch, &target_sha).await {
                return Err(format!("failed to recreate branch {}", scenario.branch));
            }
        }

        // An existing path needs its current blob sha to update in place.
        let existing_sha =
            github::file_sha(client, &scenario.file_path, &self.target_branch).await;

        let message = format!("Test commit: {}", scenario.title);
        if !github::put_file(
            client,
            &scenario.file_path,
            &scenario.branch,
            &message,
            &scenario.content,
            existing_sha.as_deref(),
        )
        .await
        {
            return Err(format!("failed to upload {}", scenario.file_path));
        }

        let body = format!(
            "Verification PR: asserts the workflow rejects this change via the {} job.",
            scenario.expected_failure_job
        );
        let Some(pr) = github::create_pull(
            client,
            &scenario.title,
            &scenario.branch,
            &self.target_branch,
            &body,
        )
        .await
        else {
            return Err("failed to open pull request".to_string());
        };

        Ok(TestPr {
            number: pr.number,
            branch: scenario.branch.clone(),
        })
    }

    /// Checks that the latest run for the test PR concluded in failure.
    async fn validate_expected_failure(
        &self,
        scenario: &TestScenario,
        pr: &TestPr,
    ) -> Option<String> {
        let Some(runs) =
            github::runs_for_pull_request_event(&*self.client, VALIDATION_FETCH_COUNT).await
        else {
            return Some(format!(
                "test PR #{}: failed to fetch workflow runs",
                pr.number
            ));
        };

        let Some(latest) = runs.iter().find(|run| run.references_pr(pr.number)) else {
            return Some(format!("test PR #{}: no workflow runs found", pr.number));
        };

        if latest.conclusion.as_deref() != Some("failure") {
            return Some(format!(
                "test PR #{}: expected the {} job to fail the run, got conclusion {:?}",
                pr.number, scenario.expected_failure_job, latest.conclusion
            ));
        }

        info!(pr = pr.number, job = %scenario.expected_failure_job, "workflow correctly rejected scenario");
        None
    }

    /// Best-effort teardown of one test PR; failures are recorded, never
    /// propagated, so the remaining PRs still get their cleanup attempt.
    async fn cleanup_pr(&self, pr: &TestPr, errors: &mut Vec<String>) {
        if github::close_pull(&*self.client, pr.number).await {
            info!(pr = pr.number, "closed test PR");
        } else {
            errors.push(format!("cleanup: failed to close test PR #{}", pr.number));
        }

        if github::delete_ref(&*self.client, &pr.branch).await {
            info!(branch = %pr.branch, "deleted test branch");
        } else {
            errors.push(format!("cleanup: failed to delete branch {}", pr.branch));
        }
    }
}
