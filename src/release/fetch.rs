//! Commit fetching with a per-repository fan-out
//!
//! Every repository is queried concurrently, then joined. A single failure
//! fails the whole join: partial results are never used downstream.

use crate::core::error::{FetchError, ReleaseError, ReleaseResult};
use crate::hosting::{Commit, CommitQuery, HostError, HostingService};
use crate::release::registry::Repository;
use crate::ui::progress::FetchProgress;
use rayon::prelude::*;
use tracing::debug;

/// Upper bound on pages walked for one repository
const MAX_PAGES: u32 = 50;

/// Commits fetched for one repository, newest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCommits {
  pub repo: Repository,
  pub commits: Vec<Commit>,
}

impl RepoCommits {
  pub fn new(repo: Repository, commits: Vec<Commit>) -> Self {
    Self { repo, commits }
  }

  pub fn is_empty(&self) -> bool {
    self.commits.is_empty()
  }

  /// Most recent commit
  pub fn newest(&self) -> Option<&Commit> {
    self.commits.first()
  }
}

/// Run `op` for every repository in parallel, preserving input order
pub fn fan_out<T, F>(repos: &[Repository], progress: &FetchProgress, op: F) -> ReleaseResult<Vec<T>>
where
  T: Send,
  F: Fn(&Repository) -> ReleaseResult<T> + Sync,
{
  repos
    .par_iter()
    .map(|repo| {
      let result = op(repo);
      progress.inc();
      result
    })
    .collect()
}

/// Latest commit of a repository
pub fn fetch_head<H>(host: &H, repo: &Repository) -> ReleaseResult<Commit>
where
  H: HostingService + ?Sized,
{
  let mut page = host
    .list_commits(&repo.owner, &repo.name, &CommitQuery::head())
    .map_err(|e| fetch_error(repo, e))?;

  if page.is_empty() {
    return Err(ReleaseError::Fetch(FetchError {
      repo: repo.slug(),
      status: None,
      reason: "repository has no commits".to_string(),
    }));
  }

  Ok(page.swap_remove(0))
}

/// All commits since the repository's watermark, newest first
///
/// Pages until a short page, until the watermark commit shows up, or until
/// the page cap is hit. The watermark commit itself is kept; removing it is
/// the boundary filter's job.
pub fn fetch_since<H>(host: &H, repo: &Repository) -> ReleaseResult<RepoCommits>
where
  H: HostingService + ?Sized,
{
  let since = repo.since.as_ref().and_then(|w| w.since);
  let last_sha = repo.last_sha();

  let mut query = CommitQuery::since(since);
  let mut commits = Vec::new();

  loop {
    let page = host
      .list_commits(&repo.owner, &repo.name, &query)
      .map_err(|e| fetch_error(repo, e))?;

    let fetched = page.len();
    let reached_boundary = last_sha.is_some_and(|sha| page.iter().any(|c| c.sha == sha));
    commits.extend(page);

    debug!(repo = %repo, page = query.page, fetched, reached_boundary, "fetched commit page");

    if reached_boundary || fetched < usize::from(query.per_page) || query.page >= MAX_PAGES {
      break;
    }
    query = query.next_page();
  }

  Ok(RepoCommits::new(repo.clone(), commits))
}

/// Fetch every repository's new commits (all-or-nothing)
pub fn fetch_all<H>(host: &H, repos: &[Repository], progress: &FetchProgress) -> ReleaseResult<Vec<RepoCommits>>
where
  H: HostingService + ?Sized,
{
  fan_out(repos, progress, |repo| fetch_since(host, repo))
}

fn fetch_error(repo: &Repository, err: HostError) -> ReleaseError {
  ReleaseError::Fetch(FetchError {
    repo: repo.slug(),
    status: err.status(),
    reason: err.to_string(),
  })
}
