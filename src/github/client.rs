//! Production platform client backed by reqwest.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::RepositoryRef;
use crate::credentials::Credentials;
use crate::error::Result;

use super::{ApiResponse, PlatformClient};

/// Media type the REST API expects.
const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";

/// Platform client for the GitHub REST API, scoped to one repository.
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl GitHubClient {
    /// Creates a client scoped to the given repository.
    pub fn new(repository: &RepositoryRef, credentials: Credentials) -> Result<Self> {
        Self::with_base_url(
            format!(
                "https://api.github.com/repos/{}/{}",
                repository.owner, repository.name
            ),
            credentials,
        )
    }

    /// Creates a client against an explicit base URL (used by live tests
    /// pointing at mock servers).
    pub fn with_base_url(base_url: String, credentials: Credentials) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));

        let mut auth = HeaderValue::from_str(&format!("token {}", credentials.token()))
            .map_err(|_| crate::error::Error::Credential("token contains invalid characters".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .user_agent(concat!("workflow-sentinel/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Issues one request and collapses every failure mode into an
    /// [`ApiResponse`] with `ok = false`.
    async fn dispatch(&self, method: Method, path: &str, body: Option<Value>) -> ApiResponse {
        let mut request = self.http.request(method.clone(), self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    if status == StatusCode::NO_CONTENT {
                        return ApiResponse::empty();
                    }
                    match response.json::<Value>().await {
                        Ok(json) => ApiResponse::success(json),
                        Err(e) => {
                            warn!(%method, path, error = %self.credentials.redact(&e.to_string()),
                                "response body was not valid JSON");
                            ApiResponse::empty()
                        }
                    }
                } else if status == StatusCode::NOT_FOUND {
                    debug!(%method, path, "resource not found (404)");
                    ApiResponse::failure()
                } else {
                    let text = response.text().await.unwrap_or_default();
                    let snippet: String = text.chars().take(100).collect();
                    warn!(%method, path, %status, detail = %self.credentials.redact(&snippet),
                        "API request failed");
                    ApiResponse::failure()
                }
            }
            Err(e) => {
                warn!(%method, path, error = %self.credentials.redact(&e.to_string()),
                    "API request errored");
                ApiResponse::failure()
            }
        }
    }
}

#[async_trait]
impl PlatformClient for GitHubClient {
    async fn get(&self, path: &str) -> ApiResponse {
        self.dispatch(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> ApiResponse {
        self.dispatch(Method::POST, path, Some(body)).await
    }

    async fn put(&self, path: &str, body: Value) -> ApiResponse {
        self.dispatch(Method::PUT, path, Some(body)).await
    }

    async fn patch(&self, path: &str, body: Value) -> ApiResponse {
        self.dispatch(Method::PATCH, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> bool {
        self.dispatch(Method::DELETE, path, None).await.ok
    }
}
