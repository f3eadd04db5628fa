//! Main pull request discovery and workflow run/job validation.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::{MainPrSpec, WorkflowDescriptor};
use crate::github::{self, JobRecord, PlatformClient, PullRequestRecord, WorkflowRunRecord};
use crate::report::ValidationReport;

/// Name of the main-PR discovery dimension.
pub const MAIN_PR_CHECK: &str = "main-pr";

/// Name of the run/job validation dimension.
pub const RUNS_CHECK: &str = "workflow-runs";

/// Finds the main pull request by exact title and validates its merge state
/// and branches.
///
/// Returns the record alongside the report so downstream checks can reuse
/// it; `None` means the PR was not found and dependent checks should be
/// skipped.
pub async fn find_and_check_main_pr<C>(
    client: &C,
    spec: &MainPrSpec,
    per_page: u32,
) -> (ValidationReport, Option<PullRequestRecord>)
where
    C: PlatformClient + ?Sized,
{
    info!(title = %spec.title, "looking up main pull request");

    let Some(pr) = github::find_pr_by_title(client, &spec.title, per_page).await else {
        let report = ValidationReport::from_errors(
            MAIN_PR_CHECK,
            vec![format!("main PR '{}' not found", spec.title)],
        );
        return (report, None);
    };

    debug!(pr = pr.number, state = %pr.state, "found main pull request");

    let mut errors = Vec::new();
    if !pr.is_merged() {
        errors.push(format!("PR #{} has not been merged", pr.number));
    }
    if pr.head_ref() != spec.source_branch {
        errors.push(format!(
            "PR #{} head branch should be {}, found {}",
            pr.number,
            spec.source_branch,
            pr.head_ref()
        ));
    }
    if pr.base_ref() != spec.target_branch {
        errors.push(format!(
            "PR #{} base branch should be {}, found {}",
            pr.number,
            spec.target_branch,
            pr.base_ref()
        ));
    }

    (
        ValidationReport::from_errors(MAIN_PR_CHECK, errors),
        Some(pr),
    )
}

/// Validates the latest workflow run of the main pull request: conclusion,
/// required job presence, per-job success, and job-start parallelism.
///
/// Sub-checks never short-circuit; one pass reports every violation found.
pub async fn verify_workflow_runs<C>(
    client: &C,
    pr: &PullRequestRecord,
    workflow: &WorkflowDescriptor,
    per_page: u32,
) -> ValidationReport
where
    C: PlatformClient + ?Sized,
{
    info!(pr = pr.number, "validating workflow runs");

    let Some(runs) = github::runs_for_pull_request_event(client, per_page).await else {
        return ValidationReport::from_errors(
            RUNS_CHECK,
            vec!["failed to fetch workflow runs".to_string()],
        );
    };

    let Some(latest) = latest_run_for_pr(&runs, pr) else {
        return ValidationReport::from_errors(
            RUNS_CHECK,
            vec![format!(
                "no workflow runs found for PR #{} (sha {}, branch {})",
                pr.number,
                pr.head_sha(),
                pr.head_ref()
            )],
        );
    };

    debug!(run = latest.id, started_at = ?latest.started_at, "latest matching run selected");

    let mut errors = Vec::new();
    if latest.conclusion.as_deref() != Some("success") {
        errors.push(format!(
            "latest workflow run (id {}) did not succeed, conclusion: {:?}",
            latest.id, latest.conclusion
        ));
    }

    let Some(jobs) = github::jobs_for_run(client, latest.id).await else {
        errors.push(format!("failed to fetch jobs for run {}", latest.id));
        return ValidationReport::from_errors(RUNS_CHECK, errors);
    };

    errors.extend(check_required_jobs(&jobs, &workflow.required_jobs));
    errors.extend(check_job_conclusions(&jobs));
    errors.extend(check_parallelism(
        &jobs,
        workflow.required_jobs.len(),
        workflow.parallel_threshold_secs,
    ));

    ValidationReport::from_errors(RUNS_CHECK, errors)
}

/// Selects the most recent run belonging to the pull request.
///
/// A run matches when its head sha equals the PR's head sha, or (fallback)
/// its head branch equals the PR's head branch. Runs arrive newest-first,
/// so the first match is the latest.
pub fn latest_run_for_pr<'a>(
    runs: &'a [WorkflowRunRecord],
    pr: &PullRequestRecord,
) -> Option<&'a WorkflowRunRecord> {
    runs.iter().find(|run| {
        (!pr.head_sha().is_empty() && run.head_sha == pr.head_sha())
            || (!pr.head_ref().is_empty() && run.head_branch == pr.head_ref())
    })
}

/// Checks the job set covers every required job name.
fn check_required_jobs(jobs: &[JobRecord], required: &[String]) -> Vec<String> {
    let found: Vec<&str> = jobs.iter().map(|j| j.name.as_str()).collect();
    let missing: Vec<&str> = required
        .iter()
        .map(String::as_str)
        .filter(|name| !found.contains(name))
        .collect();

    if missing.is_empty() {
        Vec::new()
    } else {
        vec![format!(
            "missing required jobs: {:?}, found: {:?}",
            missing, found
        )]
    }
}

/// Checks every job concluded successfully, listing exactly the failures.
fn check_job_conclusions(jobs: &[JobRecord]) -> Vec<String> {
    let failed: Vec<&str> = jobs
        .iter()
        .filter(|j| !j.succeeded())
        .map(|j| j.name.as_str())
        .collect();

    if failed.is_empty() {
        Vec::new()
    } else {
        vec![format!("jobs did not succeed: {:?}", failed)]
    }
}

/// Checks the jobs started within the parallelism threshold of each other.
///
/// Only evaluated once at least `required_count` jobs exist; with fewer
/// timestamped starts than that, the spread cannot be judged and an error
/// is reported instead.
fn check_parallelism(jobs: &[JobRecord], required_count: usize, threshold_secs: u64) -> Vec<String> {
    if jobs.len() < required_count {
        return Vec::new();
    }

    let starts: Vec<DateTime<Utc>> = jobs.iter().filter_map(|j| j.started_at).collect();
    if starts.len() < required_count {
        return vec!["not enough timestamped job starts to verify parallel execution".to_string()];
    }

    let (Some(earliest), Some(latest)) = (starts.iter().min(), starts.iter().max()) else {
        return Vec::new();
    };
    let span = (*latest - *earliest).num_seconds().unsigned_abs();

    if span > threshold_secs {
        vec![format!(
            "jobs did not run in parallel (start spread {}s, threshold {}s)",
            span, threshold_secs
        )]
    } else {
        Vec::new()
    }
}
