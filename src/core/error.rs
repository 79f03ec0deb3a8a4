//! Error types for simple-release with contextual messages
//!
//! Every failure aborts the remaining steps of a run. Errors are grouped by
//! category so each one prints a single diagnostic line, optionally followed
//! by a hint pointing the operator at the fix.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Main error type for simple-release
#[derive(Debug)]
pub enum ReleaseError {
  /// Release document / registry problems
  Config(ConfigError),

  /// Hosting API failure while fetching commits
  Fetch(FetchError),

  /// Version-control command exited non-zero
  Git(GitError),

  /// Current version is not valid semver, or the bump could not be expressed
  InvalidVersion { version: String, reason: String },

  /// Release document could not be written
  Write { path: PathBuf, reason: String },

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ReleaseError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  pub fn invalid_version(version: impl Into<String>, reason: impl fmt::Display) -> Self {
    ReleaseError::InvalidVersion {
      version: version.into(),
      reason: reason.to_string(),
    }
  }

  pub fn write(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
    ReleaseError::Write {
      path: path.into(),
      reason: reason.to_string(),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ReleaseError::Message { message, context, help } => ReleaseError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      ReleaseError::Io(err) => ReleaseError::Message {
        message: format!("{}: {}", ctx_str, err),
        context: None,
        help: None,
      },
      _ => self,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ReleaseError::Config(e) => e.help_message(),
      ReleaseError::Fetch(e) => e.help_message(),
      ReleaseError::Git(e) => e.help_message(),
      ReleaseError::InvalidVersion { .. } => {
        Some("Fix the \"version\" field in package.json to a valid semantic version (e.g. 1.0.0).".to_string())
      }
      ReleaseError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for ReleaseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseError::Config(e) => write!(f, "{}", e),
      ReleaseError::Fetch(e) => write!(f, "{}", e),
      ReleaseError::Git(e) => write!(f, "{}", e),
      ReleaseError::InvalidVersion { version, reason } => {
        write!(f, "Invalid version '{}': {}", version, reason)
      }
      ReleaseError::Write { path, reason } => {
        write!(f, "Failed to write {}: {}", path.display(), reason)
      }
      ReleaseError::Io(e) => write!(f, "I/O error: {}", e),
      ReleaseError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ReleaseError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ReleaseError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for ReleaseError {
  fn from(err: io::Error) -> Self {
    ReleaseError::Io(err)
  }
}

impl From<String> for ReleaseError {
  fn from(msg: String) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<&str> for ReleaseError {
  fn from(msg: &str) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<serde_json::Error> for ReleaseError {
  fn from(err: serde_json::Error) -> Self {
    ReleaseError::message(format!("JSON error: {}", err))
  }
}

impl From<ConfigError> for ReleaseError {
  fn from(err: ConfigError) -> Self {
    ReleaseError::Config(err)
  }
}

impl From<FetchError> for ReleaseError {
  fn from(err: FetchError) -> Self {
    ReleaseError::Fetch(err)
  }
}

impl From<GitError> for ReleaseError {
  fn from(err: GitError) -> Self {
    ReleaseError::Git(err)
  }
}

impl From<anyhow::Error> for ReleaseError {
  fn from(err: anyhow::Error) -> Self {
    ReleaseError::message(err.to_string())
  }
}

/// Release document and registry errors
#[derive(Debug)]
pub enum ConfigError {
  /// package.json not found in the project directory
  DocumentNotFound { path: PathBuf },

  /// Missing required field in the document
  MissingField { field: String },

  /// Registry is malformed (no main, duplicates, ...)
  InvalidRegistry { reason: String },

  /// Repository has no watermark entry in `releases`
  NotInitialized { repo: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::DocumentNotFound { .. } => {
        Some("Point --project at the directory holding the main repository's package.json.".to_string())
      }
      ConfigError::NotInitialized { .. } => Some("Run `simple-release init` before the first release.".to_string()),
      ConfigError::InvalidRegistry { .. } => Some(
        "Edit the \"simple-release.config\" array: exactly one entry needs \"main\": true and names must be unique."
          .to_string(),
      ),
      ConfigError::MissingField { field } if field.ends_with(".config") => Some(
        "Run `simple-release init --main OWNER/NAME [--dep OWNER/NAME]...` to record the repositories.".to_string(),
      ),
      ConfigError::MissingField { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::DocumentNotFound { path } => {
        write!(f, "Release document not found: {}", path.display())
      }
      ConfigError::MissingField { field } => {
        write!(f, "Missing required field in package.json: {}", field)
      }
      ConfigError::InvalidRegistry { reason } => {
        write!(f, "Invalid repository registry: {}", reason)
      }
      ConfigError::NotInitialized { repo } => {
        write!(f, "Repository '{}' has no release entry", repo)
      }
    }
  }
}

/// Hosting API errors, always tied to the repository being queried
#[derive(Debug)]
pub struct FetchError {
  pub repo: String,
  pub status: Option<u16>,
  pub reason: String,
}

impl FetchError {
  fn help_message(&self) -> Option<String> {
    match self.status {
      Some(401) | Some(403) => Some("Export a token with repository read access: export GITHUB_TOKEN=<token>".to_string()),
      Some(404) => Some(format!(
        "Check that '{}' exists and the token can see it.",
        self.repo
      )),
      _ => None,
    }
  }
}

impl fmt::Display for FetchError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.status {
      Some(status) => write!(f, "Failed to fetch commits for {} (HTTP {}): {}", self.repo, status, self.reason),
      None => write!(f, "Failed to fetch commits for {}: {}", self.repo, self.reason),
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },

  /// Tag already present locally
  TagExists { tag: String },

  /// Push failed
  PushFailed {
    remote: String,
    refspec: String,
    reason: String,
  },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::PushFailed { reason, .. } => {
        let cause = if reason.contains("non-fast-forward") || reason.contains("rejected") {
          "The remote has commits you don't have. Pull first, then run the release again.\n"
        } else if reason.contains("Permission denied") || reason.contains("403") {
          "Check your SSH key or credential helper for the remote.\n"
        } else {
          ""
        };
        Some(format!(
          "{}Nothing was rolled back: the local commit and any local tag are still there. \
           Push them by hand, or reset the commit and delete the tag before releasing again.",
          cause
        ))
      }
      GitError::RepoNotFound { path } => Some(format!(
        "The project directory must be a git checkout of the main repository: {}",
        path.display()
      )),
      GitError::TagExists { tag } => Some(format!(
        "Delete the stale tag with `git tag -d {}` or bump to a different version.",
        tag
      )),
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr.trim_end())
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
      GitError::TagExists { tag } => {
        write!(f, "Tag already exists: {}", tag)
      }
      GitError::PushFailed { remote, refspec, reason } => {
        write!(f, "Push of {} to {} failed: {}", refspec, remote, reason.trim_end())
      }
    }
  }
}

/// Result type alias for simple-release
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ReleaseError>,
{
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ReleaseError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
