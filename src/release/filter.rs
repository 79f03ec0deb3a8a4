//! Commit filters applied before a changelog is built
//!
//! Two independent passes over each repository's fetched commits:
//!
//! - the boundary filter drops the already-released watermark commit
//! - the redundancy filter drops this tool's own bookkeeping commits
//!
//! Watermarks are taken after the first pass only; the changelog and the
//! "anything to release?" check use both.

use crate::release::fetch::RepoCommits;
use tracing::warn;

/// Prefix of the version-bump commit message
pub const VERSION_BUMP_MARKER: &str = "Bump package version to";

/// Message of the commit recording new watermarks
pub const RELEASE_INFO_MESSAGE: &str = "Update package with release info";

/// Bookkeeping markers, matched as case-sensitive substrings of the first line
pub const BOOKKEEPING_MARKERS: [&str; 2] = [VERSION_BUMP_MARKER, RELEASE_INFO_MESSAGE];

/// Commit message for a version bump
pub fn version_bump_message(version: &semver::Version) -> String {
  format!("{} {}", VERSION_BUMP_MARKER, version)
}

/// Annotated tag message for a release
pub fn tag_message(version: &semver::Version) -> String {
  format!("Release {}", version)
}

/// Drop the watermark commit
///
/// Returns whether the watermark was found. A miss keeps every fetched
/// commit, since none of them can be proven released.
pub fn drop_released(mut fetched: RepoCommits) -> (RepoCommits, bool) {
  let Some(last_sha) = fetched.repo.last_sha().map(str::to_string) else {
    return (fetched, false);
  };

  let before = fetched.commits.len();
  fetched.commits.retain(|c| c.sha != last_sha);
  let found = fetched.commits.len() < before;

  if !found {
    warn!(
      repo = %fetched.repo,
      last_sha = %last_sha,
      fetched = before,
      "last released commit not among fetched commits; treating all of them as unreleased"
    );
  }

  (fetched, found)
}

/// Whether a first line carries a bookkeeping marker
pub fn is_bookkeeping(first_line: &str) -> bool {
  BOOKKEEPING_MARKERS.iter().any(|marker| first_line.contains(marker))
}

/// Drop commits created by this tool
pub fn drop_bookkeeping(mut fetched: RepoCommits) -> RepoCommits {
  fetched.commits.retain(|c| !is_bookkeeping(c.first_line()));
  fetched
}

/// True iff no repository has a commit left
pub fn has_no_updates(filtered: &[RepoCommits]) -> bool {
  filtered.iter().map(|r| r.commits.len()).sum::<usize>() == 0
}
