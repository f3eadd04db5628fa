//! Validation of bot-authored automation comments on the main pull request.

use tracing::{debug, info};

use crate::config::{CommentExpectations, ReportSignature};
use crate::github::{self, PlatformClient};
use crate::report::ValidationReport;

/// Name of this verification dimension.
pub const CHECK_NAME: &str = "pr-comments";

/// Verifies that the automation bot posted every required report comment.
pub async fn verify_pr_comments<C>(
    client: &C,
    pr_number: u64,
    expectations: &CommentExpectations,
) -> ValidationReport
where
    C: PlatformClient + ?Sized,
{
    info!(pr = pr_number, "validating automation comments");

    let Some(comments) = github::issue_comments(client, pr_number).await else {
        return ValidationReport::from_errors(
            CHECK_NAME,
            vec!["failed to fetch PR comments".to_string()],
        );
    };

    let bot_bodies: Vec<String> = comments
        .into_iter()
        .filter(|c| c.user.login == expectations.bot_login)
        .map(|c| c.body)
        .collect();

    if bot_bodies.is_empty() {
        return ValidationReport::from_errors(
            CHECK_NAME,
            vec![format!(
                "no comments from {} found on PR #{}",
                expectations.bot_login, pr_number
            )],
        );
    }

    debug!(pr = pr_number, count = bot_bodies.len(), "found bot comments");

    ValidationReport::from_errors(
        CHECK_NAME,
        evaluate_reports(&bot_bodies, &expectations.required_reports),
    )
}

/// Matches comment bodies against required report signatures.
///
/// A report is found when any body contains any of its main keywords; the
/// first matching body must then contain all sub keywords, or a missing
/// sub-keyword error is recorded while the report still counts as found.
/// The final count check defends against one comment satisfying several
/// signatures in a way the per-report matching wouldn't surface.
fn evaluate_reports(bodies: &[String], required: &[ReportSignature]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut found_count = 0usize;

    for report in required {
        let matching = bodies
            .iter()
            .find(|body| report.main_keywords.iter().any(|kw| body.contains(kw.as_str())));

        match matching {
            Some(body) => {
                found_count += 1;
                let missing_sub: Vec<&str> = report
                    .sub_keywords
                    .iter()
                    .map(String::as_str)
                    .filter(|kw| !body.contains(*kw))
                    .collect();
                if !missing_sub.is_empty() {
                    errors.push(format!(
                        "{} is missing sub-keywords: {:?}",
                        report.name, missing_sub
                    ));
                }
            }
            None => {
                errors.push(format!(
                    "missing {} (main keywords: {:?})",
                    report.name, report.main_keywords
                ));
            }
        }
    }

    if found_count != required.len() {
        errors.push(format!(
            "expected {} reports, found {}",
            required.len(),
            found_count
        ));
    }

    errors
}
