//! Release operations for SystemGit (stage, commit, tag, push)

use super::system_git::SystemGit;
use crate::core::error::{GitError, ReleaseError, ReleaseResult, ResultExt};
use std::path::Path;

impl SystemGit {
  /// Stage a single file
  pub fn add(&self, path: &Path) -> ReleaseResult<()> {
    let path = path.to_string_lossy();
    self.run(&["add", "--", &path], "Failed to stage file")?;
    Ok(())
  }

  /// Commit whatever is staged
  pub fn commit(&self, message: &str) -> ReleaseResult<()> {
    self.run(&["commit", "-m", message], "Failed to commit")?;
    Ok(())
  }

  /// Create an annotated tag on HEAD
  pub fn tag_annotated(&self, tag: &str, message: &str) -> ReleaseResult<()> {
    if self.tag_exists(tag)? {
      return Err(ReleaseError::Git(GitError::TagExists { tag: tag.to_string() }));
    }

    self.run(&["tag", "-a", tag, "-m", message], "Failed to create tag")?;
    Ok(())
  }

  /// Check whether a tag exists locally
  pub fn tag_exists(&self, tag: &str) -> ReleaseResult<bool> {
    let refname = format!("refs/tags/{}", tag);
    let output = self
      .git_cmd()
      .args(["rev-parse", "--verify", "--quiet", &refname])
      .output()
      .context("Failed to look up tag")?;

    Ok(output.status.success())
  }

  /// Push a branch to a remote
  pub fn push_branch(&self, remote: &str, branch: &str) -> ReleaseResult<()> {
    self.push(remote, branch)
  }

  /// Push a single tag to a remote
  pub fn push_tag(&self, remote: &str, tag: &str) -> ReleaseResult<()> {
    self.push(remote, &format!("refs/tags/{}", tag))
  }

  fn push(&self, remote: &str, refspec: &str) -> ReleaseResult<()> {
    tracing::debug!(remote, refspec, "pushing");

    let output = self
      .git_cmd()
      .args(["push", remote, refspec])
      .output()
      .context("Failed to push")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(ReleaseError::Git(GitError::PushFailed {
        remote: remote.to_string(),
        refspec: refspec.to_string(),
        reason: stderr.to_string(),
      }));
    }

    Ok(())
  }
}
