//! Integration tests for the full verification flow without a network.
//!
//! These drive the public API against a fixture-backed platform client,
//! suitable for CI.

use std::collections::HashMap;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};

use workflow_sentinel::{
    ApiResponse, CheckStatus, PlatformClient, Verifier, VerifierConfig,
};

/// Platform client answering from a fixed `"METHOD path"` fixture map.
///
/// Requests with no fixture fail, the way the production client degrades on
/// a 404 or transport error.
struct FixtureClient {
    responses: HashMap<String, Value>,
}

impl FixtureClient {
    fn new(responses: HashMap<String, Value>) -> Self {
        Self { responses }
    }

    fn lookup(&self, method: &str, path: &str) -> ApiResponse {
        match self.responses.get(&format!("{} {}", method, path)) {
            Some(body) => ApiResponse::success(body.clone()),
            None => ApiResponse::failure(),
        }
    }
}

#[async_trait]
impl PlatformClient for FixtureClient {
    async fn get(&self, path: &str) -> ApiResponse {
        self.lookup("GET", path)
    }

    async fn post(&self, path: &str, _body: Value) -> ApiResponse {
        self.lookup("POST", path)
    }

    async fn put(&self, path: &str, _body: Value) -> ApiResponse {
        self.lookup("PUT", path)
    }

    async fn patch(&self, path: &str, _body: Value) -> ApiResponse {
        self.lookup("PATCH", path)
    }

    async fn delete(&self, path: &str) -> bool {
        self.responses.contains_key(&format!("DELETE {}", path))
    }
}

const WORKFLOW_TEXT: &str = "\
name: pr-automation
on:
  pull_request:
    types: [opened, synchronize, reopened]
jobs:
  code-quality:
    runs-on: ubuntu-latest
  testing-suite:
    runs-on: ubuntu-latest
  security-scan:
    runs-on: ubuntu-latest
  build-validation:
    runs-on: ubuntu-latest
";

fn main_pr_payload() -> Value {
    json!([{
        "number": 42,
        "title": "feat: add PR automation workflow (code-quality/test/security/build)",
        "state": "closed",
        "merged_at": "2025-05-02T10:15:00Z",
        "head": {"ref": "feat/pr-automation", "sha": "abc123"},
        "base": {"ref": "main", "sha": "def456"}
    }])
}

fn successful_jobs_payload() -> Value {
    json!({"jobs": [
        {"name": "code-quality", "conclusion": "success", "started_at": "2025-05-02T10:00:00Z"},
        {"name": "testing-suite", "conclusion": "success", "started_at": "2025-05-02T10:00:20Z"},
        {"name": "security-scan", "conclusion": "success", "started_at": "2025-05-02T10:00:40Z"},
        {"name": "build-validation", "conclusion": "success", "started_at": "2025-05-02T10:00:55Z"}
    ]})
}

fn bot_comments_payload() -> Value {
    let bodies = [
        "## Code Quality Check Results (ESLint)\nPass Rate: 100%\nTotal Issues: 0",
        "## Test Coverage Results (Jest)\nCoverage: 85%+",
        "## Security Scan Results\nSecret Detection: No Secrets Found",
        "## Build Check Results (Webpack)\nBuild Successful",
    ];
    Value::Array(
        bodies
            .iter()
            .map(|body| json!({"body": body, "user": {"login": "github-actions[bot]"}}))
            .collect(),
    )
}

/// Fixtures for the checks that depend only on the main pull request.
fn main_path_fixtures() -> HashMap<String, Value> {
    let mut responses = HashMap::new();
    responses.insert(
        "GET contents/.github/workflows/pr-automation.yml?ref=main".to_string(),
        json!({"content": BASE64.encode(WORKFLOW_TEXT), "sha": "wfblob"}),
    );
    responses.insert(
        "GET pulls?state=closed&per_page=100".to_string(),
        main_pr_payload(),
    );
    responses.insert(
        "GET actions/runs?event=pull_request&per_page=100".to_string(),
        json!({"workflow_runs": [{
            "id": 900,
            "status": "completed",
            "conclusion": "success",
            "head_sha": "abc123",
            "head_branch": "feat/pr-automation",
            "run_started_at": "2025-05-02T10:00:00Z"
        }]}),
    );
    responses.insert(
        "GET actions/runs/900/jobs".to_string(),
        successful_jobs_payload(),
    );
    responses.insert("GET issues/42/comments".to_string(), bot_comments_payload());
    responses
}

/// Adds the lifecycle fixtures for the first default scenario.
fn with_scenario_fixtures(mut responses: HashMap<String, Value>) -> HashMap<String, Value> {
    responses.insert(
        "GET git/ref/heads/main".to_string(),
        json!({"object": {"sha": "tip123"}}),
    );
    responses.insert("POST git/refs".to_string(), json!({}));
    responses.insert(
        "PUT contents/src/utils/test-lint-fail.js".to_string(),
        json!({}),
    );
    responses.insert(
        "POST pulls".to_string(),
        json!({
            "number": 101,
            "title": "Test: Code Quality Failure (ESLint Error)",
            "state": "open",
            "merged_at": null,
            "head": {"ref": "test-code-quality-fail", "sha": "head101"},
            "base": {"ref": "main", "sha": "tip123"}
        }),
    );
    let scenario_run = json!({"workflow_runs": [{
        "id": 1101,
        "status": "completed",
        "conclusion": "failure",
        "head_sha": "head101",
        "head_branch": "test-code-quality-fail",
        "pull_requests": [{"number": 101}]
    }]});
    responses.insert(
        "GET actions/workflows/pr-automation.yml/runs?per_page=10".to_string(),
        scenario_run.clone(),
    );
    responses.insert(
        "GET actions/runs?event=pull_request&per_page=5".to_string(),
        scenario_run,
    );
    responses.insert("PATCH pulls/101".to_string(), json!({}));
    responses.insert(
        "DELETE git/refs/heads/test-code-quality-fail".to_string(),
        json!(true),
    );
    responses
}

fn reference_config() -> VerifierConfig {
    let mut config = VerifierConfig::default();
    config.resolve_owner("web-dev-team");
    config
}

#[tokio::test]
async fn full_verification_passes_on_a_compliant_repository() {
    let mut config = reference_config();
    // One scenario keeps the (real-time) trigger grace to a single wait.
    config.scenarios.truncate(1);

    let client = FixtureClient::new(with_scenario_fixtures(main_path_fixtures()));
    let summary = Verifier::new(client, config).run().await;

    for report in &summary.reports {
        assert_eq!(
            report.status,
            CheckStatus::Passed,
            "{} failed: {:?}",
            report.name,
            report.errors
        );
    }
    assert!(summary.passed);

    let rendered = summary.render();
    assert!(rendered.contains("Overall: PASS"));
    assert!(rendered.contains("[PASS] failure-scenarios"));
}

#[tokio::test]
async fn failing_job_fails_only_the_run_check() {
    let mut responses = main_path_fixtures();
    responses.insert(
        "GET actions/runs/900/jobs".to_string(),
        json!({"jobs": [
            {"name": "code-quality", "conclusion": "success", "started_at": "2025-05-02T10:00:00Z"},
            {"name": "testing-suite", "conclusion": "success", "started_at": "2025-05-02T10:00:20Z"},
            {"name": "security-scan", "conclusion": "failure", "started_at": "2025-05-02T10:00:40Z"},
            {"name": "build-validation", "conclusion": "success", "started_at": "2025-05-02T10:00:55Z"}
        ]}),
    );

    let mut config = reference_config();
    config.scenarios.clear();

    let client = FixtureClient::new(responses);
    let summary = Verifier::new(client, config).run().await;

    assert!(!summary.passed);

    let runs_report = summary
        .reports
        .iter()
        .find(|r| r.name == "workflow-runs")
        .unwrap();
    assert_eq!(runs_report.status, CheckStatus::Failed);
    assert!(runs_report.errors[0].contains("security-scan"));

    // Every other dimension still passed.
    let failed: Vec<&str> = summary
        .reports
        .iter()
        .filter(|r| r.status == CheckStatus::Failed)
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(failed, vec!["workflow-runs"]);
}

#[tokio::test]
async fn unreachable_api_fails_checks_without_panicking() {
    let mut config = reference_config();
    config.scenarios.clear();

    let client = FixtureClient::new(HashMap::new());
    let summary = Verifier::new(client, config).run().await;

    assert!(!summary.passed);
    // Workflow file and main PR checks fail; the dependent checks are
    // skipped rather than failed.
    assert_eq!(summary.reports[0].status, CheckStatus::Failed);
    assert_eq!(summary.reports[1].status, CheckStatus::Failed);
    assert_eq!(summary.reports[2].status, CheckStatus::Skipped);
    assert_eq!(summary.reports[3].status, CheckStatus::Skipped);
}
