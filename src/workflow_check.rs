//! Static check of the workflow definition file.
//!
//! The definition is inspected with substring checks only. That is a
//! documented heuristic: the trigger and job names used here are distinctive
//! enough in practice that a full workflow grammar isn't warranted.

use tracing::info;

use crate::config::WorkflowDescriptor;
use crate::github::{self, PlatformClient};
use crate::report::ValidationReport;

/// Name of this verification dimension.
pub const CHECK_NAME: &str = "workflow-file";

/// Verifies the workflow definition exists on the target branch and names
/// the required triggers and jobs.
pub async fn verify_workflow_file<C>(
    client: &C,
    workflow: &WorkflowDescriptor,
    target_branch: &str,
) -> ValidationReport
where
    C: PlatformClient + ?Sized,
{
    info!(path = %workflow.file_path, branch = %target_branch, "checking workflow definition");

    let Some(content) = github::file_content(client, &workflow.file_path, target_branch).await
    else {
        return ValidationReport::from_errors(
            CHECK_NAME,
            vec![format!(
                "workflow file {} not found on branch {}",
                workflow.file_path, target_branch
            )],
        );
    };

    ValidationReport::from_errors(CHECK_NAME, inspect_definition(&content, workflow))
}

/// Substring inspection of the definition text.
fn inspect_definition(content: &str, workflow: &WorkflowDescriptor) -> Vec<String> {
    let mut errors = Vec::new();

    if !content.contains("pull_request:") {
        errors.push("workflow is missing the pull_request trigger configuration".to_string());
    }

    let missing_triggers: Vec<&str> = workflow
        .required_triggers
        .iter()
        .map(String::as_str)
        .filter(|t| !content.contains(t))
        .collect();
    if !missing_triggers.is_empty() {
        errors.push(format!(
            "missing required trigger events: {:?}",
            missing_triggers
        ));
    }

    let missing_jobs: Vec<&str> = workflow
        .required_jobs
        .iter()
        .map(String::as_str)
        .filter(|j| !content.contains(&format!("{}:", j)))
        .collect();
    if !missing_jobs.is_empty() {
        errors.push(format!("missing required jobs: {:?}", missing_jobs));
    }

    errors
}
