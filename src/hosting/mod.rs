//! Source-control hosting service seam
//!
//! The release pipeline only needs two calls from the hosting service:
//! list the commits of a repository and create a release on it. Both are
//! behind [`HostingService`] so the pipeline can run against any backend.

pub mod github;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use github::GitHubClient;

/// Largest page the hosting API hands out
pub const MAX_PER_PAGE: u8 = 100;

/// A commit as reported by the hosting service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
  pub sha: String,
  /// Hosting account login, or the git author name for unlinked authors
  pub author_login: String,
  /// Full commit message
  pub message: String,
  pub authored_at: DateTime<Utc>,
}

impl Commit {
  /// First line of the message (what gets surfaced to humans)
  pub fn first_line(&self) -> &str {
    self.message.lines().next().unwrap_or("").trim_end()
  }
}

/// Parameters for one page of a commit listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitQuery {
  /// Only commits at or after this instant
  pub since: Option<DateTime<Utc>>,
  pub per_page: u8,
  /// 1-based page index
  pub page: u32,
}

impl CommitQuery {
  /// First page of the most recent commit only
  pub fn head() -> Self {
    Self {
      since: None,
      per_page: 1,
      page: 1,
    }
  }

  /// First full page of commits since a watermark
  pub fn since(since: Option<DateTime<Utc>>) -> Self {
    Self {
      since,
      per_page: MAX_PER_PAGE,
      page: 1,
    }
  }

  pub fn next_page(self) -> Self {
    Self {
      page: self.page + 1,
      ..self
    }
  }
}

/// Release to create on the hosting service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRelease {
  pub tag_name: String,
  pub name: String,
  pub body: String,
}

/// Release as created by the hosting service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublishedRelease {
  pub html_url: String,
}

/// Hosting API failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
  /// Service answered with a non-success status
  Status { status: u16, message: String },
  /// Request never got a response (DNS, TLS, timeout, refused)
  Transport(String),
  /// Response body did not match the expected shape
  Decode(String),
}

impl HostError {
  pub fn status(&self) -> Option<u16> {
    match self {
      HostError::Status { status, .. } => Some(*status),
      _ => None,
    }
  }
}

impl fmt::Display for HostError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      HostError::Status { status, message } => write!(f, "HTTP {}: {}", status, message),
      HostError::Transport(reason) => write!(f, "request failed: {}", reason),
      HostError::Decode(reason) => write!(f, "unexpected response: {}", reason),
    }
  }
}

impl std::error::Error for HostError {}

pub type HostResult<T> = Result<T, HostError>;

/// Commit listing and release creation on a hosting service
///
/// Implementations must be shareable across threads: repositories are
/// fetched concurrently.
pub trait HostingService: Sync {
  /// One page of commits, newest first
  fn list_commits(&self, owner: &str, repo: &str, query: &CommitQuery) -> HostResult<Vec<Commit>>;

  /// Create a release pointing at an existing tag
  fn create_release(&self, owner: &str, repo: &str, release: &NewRelease) -> HostResult<PublishedRelease>;
}
