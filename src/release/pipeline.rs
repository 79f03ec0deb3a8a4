//! Release pipeline
//!
//! A release is a fixed sequence of stages, each one consuming the value
//! produced by the previous one:
//!
//! ```text
//! fetch_commits ─► FetchedCommits
//!   .check_for_updates()      ─► Option<PendingRelease>   (None = nothing to release)
//!   .bump_version(type)       ─► BumpedRelease
//!   .push_version_bump(..)    ─► PushedRelease            (commit, tag, push)
//!   .build_changelog()        ─► NotedRelease
//!   .publish(..)              ─► ReleaseSummary           (hosted release, watermarks)
//! ```
//!
//! Any error ends the run. Nothing is rolled back: once the tag is pushed it
//! stays pushed. The bumped version is written before the commit, so a
//! failing git step leaves package.json modified, and a failing push leaves
//! the local commit and tag behind. The next run then stops on the existing
//! tag until it is deleted or pushed. A failed hosted release is logged and the watermarks are
//! still recorded. If recording the watermarks fails after the release was
//! created, the next run will list the same commits again.

use crate::core::config::{DOCUMENT_FILE, Settings};
use crate::core::error::{GitError, ReleaseError, ReleaseResult};
use crate::core::vcs::SystemGit;
use crate::hosting::{HostingService, NewRelease, PublishedRelease};
use crate::release::changelog::Changelog;
use crate::release::fetch::{self, RepoCommits};
use crate::release::filter;
use crate::release::registry::Registry;
use crate::release::state::{ReleaseDocument, Watermark, Watermarks};
use crate::release::version::ReleaseType;
use crate::ui::progress::FetchProgress;
use semver::Version;
use std::path::Path;
use tracing::{error, info};

/// How to bump the version
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseOptions {
  pub release_type: ReleaseType,
  pub preid: Option<String>,
}

/// Commits fetched for every repository, watermark commits removed
#[derive(Debug)]
pub struct FetchedCommits {
  document: ReleaseDocument,
  registry: Registry,
  /// Boundary-filtered commits: the source of the next watermarks
  unreleased: Vec<RepoCommits>,
}

/// There is something to release
#[derive(Debug)]
pub struct PendingRelease {
  document: ReleaseDocument,
  registry: Registry,
  unreleased: Vec<RepoCommits>,
  /// Boundary- and bookkeeping-filtered commits: the changelog input
  notable: Vec<RepoCommits>,
}

/// Next version computed, nothing written yet
#[derive(Debug)]
pub struct BumpedRelease {
  pending: PendingRelease,
  previous: Version,
  next: Version,
}

/// Version bump committed, tagged and pushed
#[derive(Debug)]
pub struct PushedRelease {
  bumped: BumpedRelease,
}

/// Release notes rendered
#[derive(Debug)]
pub struct NotedRelease {
  pushed: PushedRelease,
  changelog: Changelog,
}

/// Result of a completed release
#[derive(Debug)]
pub struct ReleaseSummary {
  pub previous_version: Version,
  pub version: Version,
  pub tag: String,
  pub changelog: Changelog,
  /// The hosted release, if creating it succeeded
  pub release: Option<PublishedRelease>,
  /// Why the hosted release could not be created
  pub release_error: Option<String>,
  pub watermarks: Watermarks,
}

/// What a dry run would release
#[derive(Debug)]
pub struct ReleasePreview {
  pub previous_version: Version,
  pub version: Version,
  pub changelog: Changelog,
}

/// Terminal state of a release run
#[derive(Debug)]
pub enum ReleaseOutcome {
  /// No repository has a commit worth releasing
  NoUpdates,
  Preview(ReleasePreview),
  Released(Box<ReleaseSummary>),
}

/// Fetch and boundary-filter commits for every registered repository
pub fn fetch_commits<H>(host: &H, document: ReleaseDocument) -> ReleaseResult<FetchedCommits>
where
  H: HostingService + ?Sized,
{
  let registry = document.registry()?;
  info!(repos = registry.repos().len(), "fetching commits");

  let progress = FetchProgress::new(registry.repos().len(), "Fetching commits");
  let fetched = fetch::fetch_all(host, registry.repos(), &progress)?;
  let unreleased = fetched.into_iter().map(|f| filter::drop_released(f).0).collect();

  Ok(FetchedCommits {
    document,
    registry,
    unreleased,
  })
}

impl FetchedCommits {
  /// Drop bookkeeping commits; `None` when nothing is left anywhere
  pub fn check_for_updates(self) -> Option<PendingRelease> {
    let notable: Vec<RepoCommits> = self.unreleased.iter().cloned().map(filter::drop_bookkeeping).collect();

    if filter::has_no_updates(&notable) {
      info!("no new commits since the last release");
      return None;
    }

    Some(PendingRelease {
      document: self.document,
      registry: self.registry,
      unreleased: self.unreleased,
      notable,
    })
  }
}

impl PendingRelease {
  pub fn bump_version(self, options: &ReleaseOptions) -> ReleaseResult<BumpedRelease> {
    let previous = self.document.version()?;
    let next = options.release_type.apply(&previous, options.preid.as_deref())?;
    info!(from = %previous, to = %next, release_type = %options.release_type, "bumped version");

    Ok(BumpedRelease {
      pending: self,
      previous,
      next,
    })
  }

  /// Changelog and next version without touching anything
  pub fn preview(&self, options: &ReleaseOptions) -> ReleaseResult<ReleasePreview> {
    let previous_version = self.document.version()?;
    let version = options.release_type.apply(&previous_version, options.preid.as_deref())?;

    Ok(ReleasePreview {
      previous_version,
      version,
      changelog: Changelog::build(&self.notable),
    })
  }
}

impl BumpedRelease {
  /// Write the new version, then commit, tag and push it
  ///
  /// The tag is checked before anything is written so a stale local tag
  /// leaves the document untouched.
  pub fn push_version_bump(mut self, git: &SystemGit, settings: &Settings) -> ReleaseResult<PushedRelease> {
    let tag = self.next.to_string();
    if git.tag_exists(&tag)? {
      return Err(ReleaseError::Git(GitError::TagExists { tag }));
    }

    self.pending.document.set_version(&self.next);
    self.pending.document.save()?;

    git.add(Path::new(DOCUMENT_FILE))?;
    git.commit(&filter::version_bump_message(&self.next))?;
    git.tag_annotated(&tag, &filter::tag_message(&self.next))?;
    git.push_branch(&settings.remote, &settings.branch)?;
    git.push_tag(&settings.remote, &tag)?;
    info!(tag = %tag, remote = %settings.remote, "pushed version bump");

    Ok(PushedRelease { bumped: self })
  }
}

impl PushedRelease {
  pub fn build_changelog(self) -> NotedRelease {
    let changelog = Changelog::build(&self.bumped.pending.notable);
    info!(entries = changelog.entry_count(), "built changelog");
    NotedRelease { pushed: self, changelog }
  }
}

impl NotedRelease {
  /// Create the hosted release, then record and push the new watermarks
  pub fn publish<H>(self, host: &H, git: &SystemGit, settings: &Settings) -> ReleaseResult<ReleaseSummary>
  where
    H: HostingService + ?Sized,
  {
    let BumpedRelease {
      pending,
      previous,
      next,
    } = self.pushed.bumped;
    let tag = next.to_string();

    let (release, release_error) = match create_release(host, &pending.registry, &next, &self.changelog) {
      Ok(release) => (Some(release), None),
      Err(reason) => (None, Some(reason)),
    };

    let mut document = pending.document;
    let watermarks = persist_watermarks(&mut document, &pending.unreleased, git, settings)?;

    Ok(ReleaseSummary {
      previous_version: previous,
      version: next,
      tag,
      changelog: self.changelog,
      release,
      release_error,
      watermarks,
    })
  }
}

/// Create the release on the main repository (best effort)
fn create_release<H>(host: &H, registry: &Registry, version: &Version, changelog: &Changelog) -> Result<PublishedRelease, String>
where
  H: HostingService + ?Sized,
{
  let main = registry.main();
  let request = NewRelease {
    tag_name: version.to_string(),
    name: filter::tag_message(version),
    body: changelog.to_markdown(),
  };

  match host.create_release(&main.owner, &main.name, &request) {
    Ok(release) => {
      info!(repo = %main, url = %release.html_url, "created release");
      Ok(release)
    }
    Err(e) => {
      error!(repo = %main, tag = %request.tag_name, error = %e, "failed to create release");
      Err(e.to_string())
    }
  }
}

/// Watermarks after a release
///
/// Each repository moves to its newest unreleased commit. Repositories
/// without new commits keep their previous entry.
pub fn next_watermarks(previous: &Watermarks, unreleased: &[RepoCommits]) -> Watermarks {
  let mut next = previous.clone();

  for repo_commits in unreleased {
    if let Some(newest) = repo_commits.newest() {
      next.insert(repo_commits.repo.name.clone(), Watermark::from_commit(newest));
    } else if let Some(current) = &repo_commits.repo.since {
      next
        .entry(repo_commits.repo.name.clone())
        .or_insert_with(|| current.clone());
    }
  }

  next
}

fn persist_watermarks(
  document: &mut ReleaseDocument,
  unreleased: &[RepoCommits],
  git: &SystemGit,
  settings: &Settings,
) -> ReleaseResult<Watermarks> {
  let mut section = document.section()?;
  section.releases = next_watermarks(&section.releases, unreleased);
  document.set_section(&section)?;
  document.save()?;

  git.add(Path::new(DOCUMENT_FILE))?;
  git.commit(filter::RELEASE_INFO_MESSAGE)?;
  git.push_branch(&settings.remote, &settings.branch)?;
  info!("recorded release watermarks");

  Ok(section.releases)
}

/// Run a full release against the document in `settings.project_root`
pub fn run<H>(
  host: &H,
  git: &SystemGit,
  settings: &Settings,
  options: &ReleaseOptions,
) -> ReleaseResult<ReleaseOutcome>
where
  H: HostingService + ?Sized,
{
  let document = ReleaseDocument::load(&settings.document_path())?;
  let Some(pending) = fetch_commits(host, document)?.check_for_updates() else {
    return Ok(ReleaseOutcome::NoUpdates);
  };

  let summary = pending
    .bump_version(options)?
    .push_version_bump(git, settings)?
    .build_changelog()
    .publish(host, git, settings)?;

  Ok(ReleaseOutcome::Released(Box::new(summary)))
}

/// Fetch, filter and bump without writing, committing or publishing anything
pub fn preview<H>(
  host: &H,
  settings: &Settings,
  options: &ReleaseOptions,
) -> ReleaseResult<ReleaseOutcome>
where
  H: HostingService + ?Sized,
{
  let document = ReleaseDocument::load(&settings.document_path())?;
  match fetch_commits(host, document)?.check_for_updates() {
    None => Ok(ReleaseOutcome::NoUpdates),
    Some(pending) => Ok(ReleaseOutcome::Preview(pending.preview(options)?)),
  }
}
