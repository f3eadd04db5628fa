//! Platform client for the hosting service's REST API.
//!
//! The verifier consumes the [`PlatformClient`] contract; [`GitHubClient`]
//! is the production implementation. Typed query helpers live here so every
//! component (and every test double) shares the same payload handling.

mod client;
mod types;

pub use client::GitHubClient;
pub use types::{
    CommentAuthor, CommentRecord, GitEndpoint, JobRecord, PullRequestRecord, RunPrRef, RunStatus,
    WorkflowRunRecord,
};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Outcome of one API call.
///
/// Transport failures and non-2xx statuses both collapse to `ok = false`
/// with a logged diagnostic; the caller never sees them as process-fatal
/// errors.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// Whether the request succeeded.
    pub ok: bool,
    /// Decoded response body, when one was returned.
    pub body: Option<Value>,
}

impl ApiResponse {
    /// A successful response carrying the given body.
    pub fn success(body: Value) -> Self {
        Self {
            ok: true,
            body: Some(body),
        }
    }

    /// A successful response without a body.
    pub fn empty() -> Self {
        Self { ok: true, body: None }
    }

    /// A failed response.
    pub fn failure() -> Self {
        Self { ok: false, body: None }
    }

    /// Returns the body of a successful response, `None` otherwise.
    pub fn into_body(self) -> Option<Value> {
        if self.ok {
            self.body
        } else {
            None
        }
    }
}

/// Request/response contract over the hosting platform's REST API.
///
/// Paths are repository-relative (`pulls?...`, `actions/runs?...`); the
/// implementation owns the base URL and authentication.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    async fn get(&self, path: &str) -> ApiResponse;
    async fn post(&self, path: &str, body: Value) -> ApiResponse;
    async fn put(&self, path: &str, body: Value) -> ApiResponse;
    async fn patch(&self, path: &str, body: Value) -> ApiResponse;
    async fn delete(&self, path: &str) -> bool;
}

/// Decodes a JSON value into a typed record, logging on mismatch.
fn decode<T: serde::de::DeserializeOwned>(context: &str, value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!(context, error = %e, "unexpected API payload shape");
            None
        }
    }
}

/// Fetches a file's decoded content from the given ref.
pub async fn file_content<C>(client: &C, path: &str, git_ref: &str) -> Option<String>
where
    C: PlatformClient + ?Sized,
{
    let response = client
        .get(&format!("contents/{}?ref={}", path, git_ref))
        .await;
    let body = response.into_body()?;

    let encoded = body.get("content")?.as_str()?;
    let stripped: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();

    match BASE64.decode(stripped.as_bytes()) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(path, error = %e, "file content is not valid UTF-8");
                None
            }
        },
        Err(e) => {
            warn!(path, error = %e, "failed to decode file content");
            None
        }
    }
}

/// Returns the blob sha of a file on the given ref, if the file exists.
pub async fn file_sha<C>(client: &C, path: &str, git_ref: &str) -> Option<String>
where
    C: PlatformClient + ?Sized,
{
    let response = client
        .get(&format!("contents/{}?ref={}", path, git_ref))
        .await;
    let body = response.into_body()?;
    body.get("sha")?.as_str().map(str::to_string)
}

/// Finds a pull request by exact title, scanning closed then open PRs.
pub async fn find_pr_by_title<C>(
    client: &C,
    title: &str,
    per_page: u32,
) -> Option<PullRequestRecord>
where
    C: PlatformClient + ?Sized,
{
    for state in ["closed", "open"] {
        let response = client
            .get(&format!("pulls?state={}&per_page={}", state, per_page))
            .await;
        let Some(body) = response.into_body() else {
            continue;
        };
        let Some(prs) = decode::<Vec<PullRequestRecord>>("pulls", body) else {
            continue;
        };
        if let Some(pr) = prs.into_iter().find(|pr| pr.title == title) {
            return Some(pr);
        }
    }
    None
}

/// Lists the most recent runs of a named workflow, newest first.
pub async fn workflow_runs<C>(
    client: &C,
    workflow_file: &str,
    per_page: u32,
) -> Option<Vec<WorkflowRunRecord>>
where
    C: PlatformClient + ?Sized,
{
    let response = client
        .get(&format!(
            "actions/workflows/{}/runs?per_page={}",
            workflow_file, per_page
        ))
        .await;
    let body = response.into_body()?;
    decode("workflow_runs", body.get("workflow_runs")?.clone())
}

/// Lists recent runs triggered by pull request events, newest first.
pub async fn runs_for_pull_request_event<C>(
    client: &C,
    per_page: u32,
) -> Option<Vec<WorkflowRunRecord>>
where
    C: PlatformClient + ?Sized,
{
    let response = client
        .get(&format!("actions/runs?event=pull_request&per_page={}", per_page))
        .await;
    let body = response.into_body()?;
    decode("workflow_runs", body.get("workflow_runs")?.clone())
}

/// Lists the jobs of one workflow run.
pub async fn jobs_for_run<C>(client: &C, run_id: u64) -> Option<Vec<JobRecord>>
where
    C: PlatformClient + ?Sized,
{
    let response = client.get(&format!("actions/runs/{}/jobs", run_id)).await;
    let body = response.into_body()?;
    decode("jobs", body.get("jobs")?.clone())
}

/// Lists the issue comments on a pull request.
pub async fn issue_comments<C>(client: &C, pr_number: u64) -> Option<Vec<CommentRecord>>
where
    C: PlatformClient + ?Sized,
{
    let response = client
        .get(&format!("issues/{}/comments", pr_number))
        .await;
    let body = response.into_body()?;
    decode("comments", body)
}

/// Resolves the tip sha of a branch.
pub async fn branch_head_sha<C>(client: &C, branch: &str) -> Option<String>
where
    C: PlatformClient + ?Sized,
{
    let response = client.get(&format!("git/ref/heads/{}", branch)).await;
    let body = response.into_body()?;
    body.get("object")?.get("sha")?.as_str().map(str::to_string)
}

/// Creates a branch ref pointing at the given sha.
pub async fn create_ref<C>(client: &C, branch: &str, sha: &str) -> bool
where
    C: PlatformClient + ?Sized,
{
    let body = json!({
        "ref": format!("refs/heads/{}", branch),
        "sha": sha,
    });
    client.post("git/refs", body).await.ok
}

/// Deletes a branch ref.
pub async fn delete_ref<C>(client: &C, branch: &str) -> bool
where
    C: PlatformClient + ?Sized,
{
    client.delete(&format!("git/refs/heads/{}", branch)).await
}

/// Creates or updates a file on a branch via the contents API.
///
/// `existing_sha` must be the file's current blob sha when the path already
/// exists, so the call performs an update instead of a conflicting create.
pub async fn put_file<C>(
    client: &C,
    path: &str,
    branch: &str,
    message: &str,
    content: &str,
    existing_sha: Option<&str>,
) -> bool
where
    C: PlatformClient + ?Sized,
{
    let mut body = json!({
        "message": message,
        "content": BASE64.encode(content.as_bytes()),
        "branch": branch,
    });
    if let Some(sha) = existing_sha {
        body["sha"] = Value::String(sha.to_string());
    }

    client.put(&format!("contents/{}", path), body).await.ok
}

/// Opens a pull request.
pub async fn create_pull<C>(
    client: &C,
    title: &str,
    head: &str,
    base: &str,
    body_text: &str,
) -> Option<PullRequestRecord>
where
    C: PlatformClient + ?Sized,
{
    let body = json!({
        "title": title,
        "head": head,
        "base": base,
        "body": body_text,
    });
    let response = client.post("pulls", body).await;
    let payload = response.into_body()?;
    decode("pull", payload)
}

/// Closes a pull request.
pub async fn close_pull<C>(client: &C, number: u64) -> bool
where
    C: PlatformClient + ?Sized,
{
    debug!(pr = number, "closing pull request");
    client
        .patch(&format!("pulls/{}", number), json!({"state": "closed"}))
        .await
        .ok
}

#[cfg(test)]
pub(crate) mod stub {
    //! Scripted platform client for unit tests.

    use super::{ApiResponse, PlatformClient};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// One recorded call, for asserting ordering and payloads.
    #[derive(Debug, Clone)]
    pub(crate) struct Call {
        pub method: &'static str,
        pub path: String,
        pub body: Option<Value>,
    }

    #[derive(Default)]
    struct Script {
        responses: Vec<ApiResponse>,
        served: usize,
    }

    impl Script {
        /// Serves responses in order; the last one repeats once exhausted.
        fn next(&mut self) -> ApiResponse {
            if self.responses.is_empty() {
                return ApiResponse::failure();
            }
            let index = self.served.min(self.responses.len() - 1);
            self.served += 1;
            self.responses[index].clone()
        }
    }

    /// A platform client that answers from pre-scripted responses.
    ///
    /// Responses are keyed by `"METHOD path"`; each key serves its scripted
    /// responses in order and repeats the last one. Unscripted calls fail.
    #[derive(Default)]
    pub(crate) struct StubClient {
        scripts: Mutex<HashMap<String, Script>>,
        deletions: Mutex<HashMap<String, Vec<bool>>>,
        calls: Mutex<Vec<Call>>,
    }

    impl StubClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn script(self, method: &str, path: &str, response: ApiResponse) -> Self {
            self.scripts
                .lock()
                .unwrap()
                .entry(format!("{} {}", method, path))
                .or_default()
                .responses
                .push(response);
            self
        }

        pub fn on_get(self, path: &str, body: Value) -> Self {
            self.script("GET", path, ApiResponse::success(body))
        }

        pub fn on_get_failure(self, path: &str) -> Self {
            self.script("GET", path, ApiResponse::failure())
        }

        pub fn on_post(self, path: &str, response: ApiResponse) -> Self {
            self.script("POST", path, response)
        }

        pub fn on_put(self, path: &str, response: ApiResponse) -> Self {
            self.script("PUT", path, response)
        }

        pub fn on_patch(self, path: &str, response: ApiResponse) -> Self {
            self.script("PATCH", path, response)
        }

        pub fn on_delete(self, path: &str, ok: bool) -> Self {
            self.deletions
                .lock()
                .unwrap()
                .entry(path.to_string())
                .or_default()
                .push(ok);
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, method: &'static str, path: &str, body: Option<Value>) {
            self.calls.lock().unwrap().push(Call {
                method,
                path: path.to_string(),
                body,
            });
        }

        fn respond(&self, method: &'static str, path: &str) -> ApiResponse {
            let mut scripts = self.scripts.lock().unwrap();
            match scripts.get_mut(&format!("{} {}", method, path)) {
                Some(script) => script.next(),
                None => ApiResponse::failure(),
            }
        }
    }

    #[async_trait]
    impl PlatformClient for StubClient {
        async fn get(&self, path: &str) -> ApiResponse {
            self.record("GET", path, None);
            self.respond("GET", path)
        }

        async fn post(&self, path: &str, body: Value) -> ApiResponse {
            self.record("POST", path, Some(body));
            self.respond("POST", path)
        }

        async fn put(&self, path: &str, body: Value) -> ApiResponse {
            self.record("PUT", path, Some(body));
            self.respond("PUT", path)
        }

        async fn patch(&self, path: &str, body: Value) -> ApiResponse {
            self.record("PATCH", path, Some(body));
            self.respond("PATCH", path)
        }

        async fn delete(&self, path: &str) -> bool {
            self.record("DELETE", path, None);
            let mut deletions = self.deletions.lock().unwrap();
            match deletions.get_mut(path) {
                Some(outcomes) if !outcomes.is_empty() => {
                    if outcomes.len() == 1 {
                        outcomes[0]
                    } else {
                        outcomes.remove(0)
                    }
                }
                _ => false,
            }
        }
    }
}
