//! Verifier configuration.
//!
//! One immutable configuration value is constructed at startup and passed by
//! reference into every component. Configuration can be loaded from a TOML
//! file; the defaults describe the reference `web-application` repository so
//! the binary is runnable without one.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::scenario::TestScenario;

/// Identifies the repository under verification.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryRef {
    /// Repository owner (organization or user). Resolved from credentials
    /// when left empty in the config file.
    #[serde(default)]
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl std::fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Describes the workflow under verification.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowDescriptor {
    /// Path of the workflow definition within the repository.
    pub file_path: String,
    /// Bare file name, used by the runs API.
    pub file_name: String,
    /// Trigger activity types that must appear in the definition.
    pub required_triggers: Vec<String>,
    /// Job names that must appear in the definition and in every run.
    pub required_jobs: Vec<String>,
    /// Maximum spread of job start times for runs to count as parallel.
    pub parallel_threshold_secs: u64,
}

/// Identifies the pull request that introduced the workflow.
#[derive(Debug, Clone, Deserialize)]
pub struct MainPrSpec {
    /// Exact title of the pull request.
    pub title: String,
    /// Expected head branch.
    pub source_branch: String,
    /// Expected base branch (also the branch test scenarios fork from).
    pub target_branch: String,
}

/// A named set of keyword substrings identifying one automation comment.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportSignature {
    /// Human-readable report name, used in error messages.
    pub name: String,
    /// The report is present if any of these appears in a bot comment.
    pub main_keywords: Vec<String>,
    /// All of these must appear in the matching comment.
    #[serde(default)]
    pub sub_keywords: Vec<String>,
}

/// Expectations for bot-authored pull request comments.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentExpectations {
    /// Login of the automation account that posts the reports.
    pub bot_login: String,
    /// Reports that must all be present.
    pub required_reports: Vec<ReportSignature>,
}

/// Wall-clock budgets for waiting on asynchronous workflow runs.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WaitBudgets {
    /// Maximum wait for the main workflow to settle, in seconds.
    pub workflow_wait_secs: u64,
    /// Maximum wait for test-scenario runs to settle, in seconds.
    pub scenario_wait_secs: u64,
}

impl Default for WaitBudgets {
    fn default() -> Self {
        Self {
            workflow_wait_secs: 600,
            scenario_wait_secs: 300,
        }
    }
}

fn default_per_page() -> u32 {
    100
}

fn default_cleanup() -> bool {
    true
}

fn default_env_file() -> String {
    ".github_env".to_string()
}

/// Complete verifier configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifierConfig {
    /// Repository under verification.
    pub repository: RepositoryRef,
    /// Workflow under verification.
    pub workflow: WorkflowDescriptor,
    /// The pull request that introduced the workflow.
    pub main_pr: MainPrSpec,
    /// Expected automation comments on the main pull request.
    pub comments: CommentExpectations,
    /// Intentionally broken changes the workflow must reject.
    #[serde(default)]
    pub scenarios: Vec<TestScenario>,
    /// Wait budgets for asynchronous runs.
    #[serde(default)]
    pub budgets: WaitBudgets,
    /// Page size for list endpoints.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Whether to tear down test PRs and branches after validation.
    #[serde(default = "default_cleanup")]
    pub cleanup_enabled: bool,
    /// Dotenv-style file holding credentials.
    #[serde(default = "default_env_file")]
    pub env_file: String,
}

impl VerifierConfig {
    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))
    }

    /// Fills in the repository owner when the config file left it empty.
    pub fn resolve_owner(&mut self, org: &str) {
        if self.repository.owner.is_empty() {
            self.repository.owner = org.to_string();
        }
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            repository: RepositoryRef {
                owner: String::new(),
                name: "web-application".to_string(),
            },
            workflow: WorkflowDescriptor {
                file_path: ".github/workflows/pr-automation.yml".to_string(),
                file_name: "pr-automation.yml".to_string(),
                required_triggers: vec![
                    "opened".to_string(),
                    "synchronize".to_string(),
                    "reopened".to_string(),
                ],
                required_jobs: vec![
                    "code-quality".to_string(),
                    "testing-suite".to_string(),
                    "security-scan".to_string(),
                    "build-validation".to_string(),
                ],
                parallel_threshold_secs: 120,
            },
            main_pr: MainPrSpec {
                title: "feat: add PR automation workflow (code-quality/test/security/build)"
                    .to_string(),
                source_branch: "feat/pr-automation".to_string(),
                target_branch: "main".to_string(),
            },
            comments: CommentExpectations {
                bot_login: "github-actions[bot]".to_string(),
                required_reports: vec![
                    ReportSignature {
                        name: "Code Quality Report".to_string(),
                        main_keywords: vec![
                            "Code Quality Check Results".to_string(),
                            "ESLint".to_string(),
                        ],
                        sub_keywords: vec![
                            "Pass Rate: 100%".to_string(),
                            "Total Issues: 0".to_string(),
                        ],
                    },
                    ReportSignature {
                        name: "Test Coverage Report".to_string(),
                        main_keywords: vec![
                            "Test Coverage Results".to_string(),
                            "Jest".to_string(),
                        ],
                        sub_keywords: vec!["Coverage: 85%+".to_string()],
                    },
                    ReportSignature {
                        name: "Security Scan Report".to_string(),
                        main_keywords: vec![
                            "Security Scan Results".to_string(),
                            "Secret Detection".to_string(),
                        ],
                        sub_keywords: vec!["No Secrets Found".to_string()],
                    },
                    ReportSignature {
                        name: "Build Validation Report".to_string(),
                        main_keywords: vec![
                            "Build Check Results".to_string(),
                            "Webpack".to_string(),
                        ],
                        sub_keywords: vec!["Build Successful".to_string()],
                    },
                ],
            },
            scenarios: vec![
                TestScenario {
                    title: "Test: Code Quality Failure (ESLint Error)".to_string(),
                    branch: "test-code-quality-fail".to_string(),
                    file_path: "src/utils/test-lint-fail.js".to_string(),
                    content: "// References an undeclared variable\nconsole.log(undefinedVar);\n"
                        .to_string(),
                    expected_failure_job: "code-quality".to_string(),
                },
                TestScenario {
                    title: "Test: Testing Suite Failure (Jest Assert Error)".to_string(),
                    branch: "test-testing-fail".to_string(),
                    file_path: "tests/utils/test-fail.test.js".to_string(),
                    content: "const sum = (a, b) => a + b;\ntest('sum 1+1 should be 2', () => {\n  expect(sum(1, 1)).toBe(3);\n});\n"
                        .to_string(),
                    expected_failure_job: "testing-suite".to_string(),
                },
                TestScenario {
                    title: "Test: Security Scan Failure (Hardcoded Secret)".to_string(),
                    branch: "test-security-fail".to_string(),
                    file_path: "src/api/security-test.js".to_string(),
                    content: "// Hardcoded API key the scanner must flag\nconst apiKey = 'sk_test_1234567890abcdef';\n"
                        .to_string(),
                    expected_failure_job: "security-scan".to_string(),
                },
                TestScenario {
                    title: "Test: Build Validation Failure (Missing Dependency)".to_string(),
                    branch: "test-build-fail".to_string(),
                    file_path: "src/components/test-build-fail.js".to_string(),
                    content: "import nonExistentLib from 'non-existent-lib';\nconst TestComponent = () => <div>{nonExistentLib.render()}</div>;\nexport default TestComponent;\n"
                        .to_string(),
                    expected_failure_job: "build-validation".to_string(),
                },
            ],
            budgets: WaitBudgets::default(),
            per_page: default_per_page(),
            cleanup_enabled: true,
            env_file: default_env_file(),
        }
    }
}

/// Validation result containing all found issues.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// List of validation errors (fatal).
    pub errors: Vec<String>,
    /// List of validation warnings (non-fatal).
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Adds an error to the result.
    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    /// Adds a warning to the result.
    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    /// Converts to a Result, failing if there are errors.
    pub fn into_result(self) -> Result<Vec<String>> {
        if self.is_valid() {
            Ok(self.warnings)
        } else {
            Err(Error::Config(self.errors.join("; ")))
        }
    }
}

/// Trait for validatable configuration types.
pub trait Validate {
    /// Validates the configuration and returns any issues found.
    fn validate(&self) -> ValidationResult;
}

impl Validate for VerifierConfig {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.repository.owner.trim().is_empty() {
            result.add_error("repository owner is empty (set it or provide GITHUB_ORG)");
        }
        if self.repository.name.trim().is_empty() {
            result.add_error("repository name cannot be empty");
        }
        if self.workflow.file_name.trim().is_empty() {
            result.add_error("workflow file_name cannot be empty");
        }
        if self.workflow.required_jobs.is_empty() {
            result.add_error("workflow must name at least one required job");
        }
        if self.main_pr.title.trim().is_empty() {
            result.add_error("main PR title cannot be empty");
        }
        if self.budgets.workflow_wait_secs == 0 || self.budgets.scenario_wait_secs == 0 {
            result.add_error("wait budgets must be greater than zero");
        }
        if self.per_page == 0 || self.per_page > 100 {
            result.add_error("per_page must be between 1 and 100");
        }

        for report in &self.comments.required_reports {
            if report.main_keywords.is_empty() {
                result.add_error(format!("report '{}' has no main keywords", report.name));
            }
        }

        let mut branches = std::collections::HashSet::new();
        for scenario in &self.scenarios {
            if !branches.insert(scenario.branch.as_str()) {
                result.add_error(format!("duplicate scenario branch '{}'", scenario.branch));
            }
            if scenario.branch == self.main_pr.target_branch {
                result.add_error(format!(
                    "scenario branch '{}' collides with the target branch",
                    scenario.branch
                ));
            }
        }

        if self.budgets.scenario_wait_secs < 60 {
            result.add_warning(
                "scenario_wait_secs under 60 seconds rarely leaves time for runs to conclude",
            );
        }
        if !self.cleanup_enabled {
            result.add_warning("cleanup is disabled; test PRs and branches will be left behind");
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_matches_reference_repository() {
        let config = VerifierConfig::default();

        assert_eq!(config.repository.name, "web-application");
        assert_eq!(config.workflow.file_name, "pr-automation.yml");
        assert_eq!(config.workflow.required_jobs.len(), 4);
        assert_eq!(config.workflow.parallel_threshold_secs, 120);
        assert_eq!(config.scenarios.len(), 4);
        assert_eq!(config.comments.required_reports.len(), 4);
        assert_eq!(config.budgets.workflow_wait_secs, 600);
        assert_eq!(config.budgets.scenario_wait_secs, 300);
        assert_eq!(config.per_page, 100);
        assert!(config.cleanup_enabled);
    }

    #[test]
    fn default_config_is_invalid_until_owner_is_resolved() {
        let mut config = VerifierConfig::default();
        assert!(!config.validate().is_valid());

        config.resolve_owner("web-dev-team");
        let result = config.validate();
        assert!(result.is_valid(), "errors: {:?}", result.errors);
        assert_eq!(config.repository.to_string(), "web-dev-team/web-application");
    }

    #[test]
    fn resolve_owner_does_not_override_explicit_owner() {
        let mut config = VerifierConfig::default();
        config.repository.owner = "explicit-org".to_string();

        config.resolve_owner("env-org");

        assert_eq!(config.repository.owner, "explicit-org");
    }

    #[test]
    fn validate_flags_zero_budget_and_bad_page_size() {
        let mut config = VerifierConfig::default();
        config.resolve_owner("org");
        config.budgets.workflow_wait_secs = 0;
        config.per_page = 500;

        let result = config.validate();

        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn validate_flags_duplicate_scenario_branches() {
        let mut config = VerifierConfig::default();
        config.resolve_owner("org");
        config.scenarios[1].branch = config.scenarios[0].branch.clone();

        let result = config.validate();

        assert!(!result.is_valid());
        assert!(result.errors[0].contains("duplicate scenario branch"));
    }

    #[test]
    fn validate_warns_when_cleanup_disabled() {
        let mut config = VerifierConfig::default();
        config.resolve_owner("org");
        config.cleanup_enabled = false;

        let result = config.validate();

        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn config_loads_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentinel.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[repository]
owner = "acme"
name = "storefront"

[workflow]
file_path = ".github/workflows/ci.yml"
file_name = "ci.yml"
required_triggers = ["opened"]
required_jobs = ["lint", "test"]
parallel_threshold_secs = 90

[main_pr]
title = "feat: add ci"
source_branch = "feat/ci"
target_branch = "main"

[comments]
bot_login = "github-actions[bot]"

[[comments.required_reports]]
name = "Lint Report"
main_keywords = ["Lint Results"]
sub_keywords = ["0 problems"]

[[scenarios]]
title = "Test: lint failure"
branch = "test-lint-fail"
file_path = "src/bad.js"
content = "syntax error("
expected_failure_job = "lint"
"#
        )
        .unwrap();

        let config = VerifierConfig::from_toml_file(&path).unwrap();

        assert_eq!(config.repository.owner, "acme");
        assert_eq!(config.workflow.required_jobs, vec!["lint", "test"]);
        assert_eq!(config.scenarios.len(), 1);
        assert_eq!(config.scenarios[0].expected_failure_job, "lint");
        // Unspecified sections fall back to defaults.
        assert_eq!(config.per_page, 100);
        assert_eq!(config.budgets.workflow_wait_secs, 600);
        assert_eq!(config.env_file, ".github_env");
    }

    #[test]
    fn from_toml_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "not valid toml [").unwrap();

        let result = VerifierConfig::from_toml_file(&path);

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn into_result_joins_errors() {
        let mut result = ValidationResult::default();
        result.add_error("first");
        result.add_error("second");

        let err = result.into_result().unwrap_err();
        assert!(err.to_string().contains("first; second"));
    }
}
