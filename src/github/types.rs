//! Typed views over the platform's REST payloads.
//!
//! Only the fields the verifier consumes are modeled; everything else in the
//! payloads is ignored during deserialization.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One endpoint (head or base) of a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct GitEndpoint {
    /// Branch name.
    #[serde(rename = "ref")]
    pub branch: String,
    /// Commit sha at the endpoint.
    #[serde(default)]
    pub sha: String,
}

/// A pull request as returned by the pulls API.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestRecord {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub state: String,
    pub merged_at: Option<DateTime<Utc>>,
    pub head: GitEndpoint,
    pub base: GitEndpoint,
}

impl PullRequestRecord {
    /// Returns true once the PR has been merged.
    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }

    pub fn head_ref(&self) -> &str {
        &self.head.branch
    }

    pub fn head_sha(&self) -> &str {
        &self.head.sha
    }

    pub fn base_ref(&self) -> &str {
        &self.base.branch
    }
}

/// Lifecycle status of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    /// Any status this verifier doesn't track (requested, waiting, ...).
    #[serde(other)]
    Other,
}

/// Pull request reference embedded in a workflow run payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RunPrRef {
    pub number: u64,
}

/// One execution of a workflow definition.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRunRecord {
    pub id: u64,
    pub status: RunStatus,
    pub conclusion: Option<String>,
    #[serde(default)]
    pub head_sha: String,
    #[serde(default)]
    pub head_branch: String,
    #[serde(rename = "run_started_at")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pull_requests: Vec<RunPrRef>,
}

impl WorkflowRunRecord {
    /// Returns true while the run is queued or executing.
    pub fn is_pending(&self) -> bool {
        matches!(self.status, RunStatus::Queued | RunStatus::InProgress)
    }

    /// Returns true once the run has a terminal conclusion.
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Returns true when the run references the given pull request number.
    pub fn references_pr(&self, number: u64) -> bool {
        self.pull_requests.iter().any(|pr| pr.number == number)
    }
}

/// One named unit of work within a run.
#[derive(Debug, Clone, Deserialize)]
pub struct JobRecord {
    pub name: String,
    pub conclusion: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// Returns true when the job concluded successfully.
    pub fn succeeded(&self) -> bool {
        self.conclusion.as_deref() == Some("success")
    }
}

/// Author of an issue comment.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentAuthor {
    pub login: String,
}

/// An issue comment on a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentRecord {
    #[serde(default)]
    pub body: String,
    pub user: CommentAuthor,
}
