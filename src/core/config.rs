//! Run configuration
//!
//! Resolved once in main.rs from global flags (each with an environment
//! fallback) and passed by reference to every command. The repository
//! registry itself is not here: it lives in the release document.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the release document inside the project directory
pub const DOCUMENT_FILE: &str = "package.json";

/// Default hosting API endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default remote receiving the bookkeeping commits and tags
pub const DEFAULT_REMOTE: &str = "origin";

/// Default branch receiving the bookkeeping commits
pub const DEFAULT_BRANCH: &str = "master";

/// Hosting API request timeout
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings shared by all commands
#[derive(Debug, Clone)]
pub struct Settings {
  /// Checkout of the main repository (holds package.json)
  pub project_root: PathBuf,

  /// Git remote to push to
  pub remote: String,

  /// Branch to push to
  pub branch: String,

  /// Hosting API base URL (no trailing slash)
  pub api_url: String,

  /// Hosting API token
  pub token: Option<String>,

  /// Hosting API request timeout
  pub timeout: Duration,
}

impl Settings {
  /// Settings with defaults for everything but the project directory
  pub fn new(project_root: impl Into<PathBuf>) -> Self {
    Self {
      project_root: project_root.into(),
      remote: DEFAULT_REMOTE.to_string(),
      branch: DEFAULT_BRANCH.to_string(),
      api_url: DEFAULT_API_URL.to_string(),
      token: None,
      timeout: HTTP_TIMEOUT,
    }
  }

  pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
    self.remote = remote.into();
    self
  }

  pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
    self.branch = branch.into();
    self
  }

  pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
    self.api_url = api_url.into().trim_end_matches('/').to_string();
    self
  }

  /// Empty tokens are treated as absent
  pub fn with_token(mut self, token: Option<String>) -> Self {
    self.token = token.filter(|t| !t.trim().is_empty());
    self
  }

  /// Absolute or project-relative path of the release document
  pub fn document_path(&self) -> PathBuf {
    self.project_root.join(DOCUMENT_FILE)
  }

  pub fn project_root(&self) -> &Path {
    &self.project_root
  }
}
