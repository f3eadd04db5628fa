//! workflow-sentinel - end-to-end verifier for PR automation workflows
//!
//! This library verifies that a repository's pull-request CI workflow
//! behaves correctly end-to-end: the definition exists with the right
//! triggers and jobs, the workflow ran successfully on the pull request
//! that introduced it, the automation bot posted its report comments, and
//! intentionally broken pull requests are correctly rejected.

pub mod comment_check;
pub mod config;
pub mod credentials;
pub mod error;
pub mod github;
pub mod poller;
pub mod report;
pub mod run_check;
pub mod scenario;
pub mod verifier;
pub mod workflow_check;

pub use error::Error;

pub use config::{
    CommentExpectations, MainPrSpec, ReportSignature, RepositoryRef, Validate, ValidationResult,
    VerifierConfig, WaitBudgets, WorkflowDescriptor,
};
pub use credentials::Credentials;
pub use github::{
    ApiResponse, CommentRecord, GitHubClient, JobRecord, PlatformClient, PullRequestRecord,
    RunStatus, WorkflowRunRecord,
};
pub use poller::{PollOutcome, RunPoller};
pub use report::{CheckStatus, ValidationReport, VerificationSummary};
pub use scenario::{ScenarioRunner, TestPr, TestScenario};
pub use verifier::Verifier;
