//! Credential loading for the remote platform API.
//!
//! Handles reading the API token and organization name from the process
//! environment, optionally seeded from a dotenv-style file, and redaction
//! of the token from any text destined for logs.

use std::collections::HashMap;
use std::env;
use std::path::Path;

use crate::error::{Error, Result};

/// Environment variable holding the API token.
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";

/// Environment variable holding the organization (repository owner).
pub const ORG_VAR: &str = "GITHUB_ORG";

/// Resolved credentials for the platform API.
///
/// The token is deliberately kept out of `Debug` output.
#[derive(Clone)]
pub struct Credentials {
    token: String,
    org: String,
}

impl Credentials {
    /// Creates credentials from explicit values (used by tests and callers
    /// that resolve the environment themselves).
    pub fn new(token: impl Into<String>, org: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            org: org.into(),
        }
    }

    /// Loads credentials from the process environment, seeded from an
    /// optional dotenv-style file.
    ///
    /// Values already present in the process environment take precedence
    /// over values from the file. A missing or unreadable file is not an
    /// error; a missing token or organization is.
    pub fn load(env_file: &Path) -> Result<Self> {
        let file_vars = read_env_file(env_file);

        let token = resolve(TOKEN_VAR, &file_vars).ok_or_else(|| {
            Error::Credential(format!(
                "{} not set in environment or {}",
                TOKEN_VAR,
                env_file.display()
            ))
        })?;
        let org = resolve(ORG_VAR, &file_vars).ok_or_else(|| {
            Error::Credential(format!(
                "{} not set in environment or {}",
                ORG_VAR,
                env_file.display()
            ))
        })?;

        Ok(Self { token, org })
    }

    /// Returns the API token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the organization name.
    pub fn org(&self) -> &str {
        &self.org
    }

    /// Redacts the token value from a string.
    ///
    /// Token occurrences are replaced with `[REDACTED:GITHUB_TOKEN]` so
    /// diagnostics can be logged without leaking the credential.
    pub fn redact(&self, text: &str) -> String {
        if self.token.is_empty() {
            return text.to_string();
        }
        text.replace(&self.token, &format!("[REDACTED:{}]", TOKEN_VAR))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"[REDACTED]")
            .field("org", &self.org)
            .finish()
    }
}

/// Looks up a variable in the process environment first, then the file map.
fn resolve(name: &str, file_vars: &HashMap<String, String>) -> Option<String> {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| file_vars.get(name).cloned())
}

/// Parses a dotenv-style file into a map.
///
/// Lines are `KEY=VALUE`; blank lines and `#` comments are skipped, and
/// surrounding single or double quotes on the value are stripped.
fn read_env_file(path: &Path) -> HashMap<String, String> {
    let mut vars = HashMap::new();

    let Ok(contents) = std::fs::read_to_string(path) else {
        return vars;
    };

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !key.is_empty() && !value.is_empty() {
                vars.insert(key.to_string(), value.to_string());
            }
        }
    }

    vars
}
