//! Tracked repositories and first-run initialization
//!
//! The registry is one main repository (the one that gets tagged and
//! released) plus any number of dependents whose commits feed the
//! changelog. It is loaded from the release document on every run and
//! passed explicitly through the pipeline.

use crate::core::error::{ConfigError, ReleaseError, ReleaseResult};
use crate::hosting::{Commit, HostingService};
use crate::release::fetch;
use crate::release::state::{Watermark, Watermarks};
use crate::ui::progress::FetchProgress;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Repository descriptor as persisted in `simple-release.config`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoDescriptor {
  pub user: String,
  pub name: String,
  #[serde(default)]
  pub main: bool,
}

/// A tracked repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
  pub owner: String,
  pub name: String,
  pub is_main: bool,
  /// Last released commit, absent until the registry is joined with the document's releases
  pub since: Option<Watermark>,
}

impl Repository {
  pub fn new(owner: impl Into<String>, name: impl Into<String>, is_main: bool) -> Self {
    Self {
      owner: owner.into(),
      name: name.into(),
      is_main,
      since: None,
    }
  }

  /// `owner/name`
  pub fn slug(&self) -> String {
    format!("{}/{}", self.owner, self.name)
  }

  /// SHA of the last released commit, if any
  pub fn last_sha(&self) -> Option<&str> {
    self.since.as_ref().map(|w| w.last_sha.as_str())
  }

  pub fn descriptor(&self) -> RepoDescriptor {
    RepoDescriptor {
      user: self.owner.clone(),
      name: self.name.clone(),
      main: self.is_main,
    }
  }
}

impl fmt::Display for Repository {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.owner, self.name)
  }
}

impl From<&RepoDescriptor> for Repository {
  fn from(descriptor: &RepoDescriptor) -> Self {
    Repository::new(&descriptor.user, &descriptor.name, descriptor.main)
  }
}

/// The active set of tracked repositories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
  repos: Vec<Repository>,
}

impl Registry {
  /// Build and validate a registry
  ///
  /// Exactly one repository must be main; `(owner, name)` pairs and names
  /// must be unique (the releases map is keyed by name).
  pub fn new(repos: Vec<Repository>) -> ReleaseResult<Self> {
    if repos.is_empty() {
      return Err(invalid("no repositories configured"));
    }

    let mains = repos.iter().filter(|r| r.is_main).count();
    if mains != 1 {
      return Err(invalid(format!("expected exactly one main repository, found {}", mains)));
    }

    let mut names = HashSet::new();
    for repo in &repos {
      if repo.owner.trim().is_empty() || repo.name.trim().is_empty() {
        return Err(invalid(format!("repository '{}' needs both an owner and a name", repo)));
      }
      if !names.insert(repo.name.as_str()) {
        return Err(invalid(format!("repository name '{}' is used more than once", repo.name)));
      }
    }

    Ok(Self { repos })
  }

  pub fn from_descriptors(descriptors: &[RepoDescriptor]) -> ReleaseResult<Self> {
    Self::new(descriptors.iter().map(Repository::from).collect())
  }

  /// Parse `owner/name` specs into a registry, main first
  pub fn from_specs(main: &str, dependents: &[String]) -> ReleaseResult<Self> {
    let mut repos = vec![parse_spec(main, true)?];
    for spec in dependents {
      repos.push(parse_spec(spec, false)?);
    }
    Self::new(repos)
  }

  pub fn repos(&self) -> &[Repository] {
    &self.repos
  }

  /// The repository that gets tagged and released
  pub fn main(&self) -> &Repository {
    // Registry::new guarantees exactly one main repository
    self
      .repos
      .iter()
      .find(|r| r.is_main)
      .unwrap_or(&self.repos[0])
  }

  pub fn descriptors(&self) -> Vec<RepoDescriptor> {
    self.repos.iter().map(Repository::descriptor).collect()
  }

  /// Attach each repository's watermark
  ///
  /// Fails if any repository is missing from `releases`: a release cannot
  /// run without a boundary for every repository.
  pub fn with_watermarks(mut self, releases: &Watermarks) -> ReleaseResult<Self> {
    for repo in &mut self.repos {
      let watermark = releases
        .get(&repo.name)
        .ok_or_else(|| ReleaseError::Config(ConfigError::NotInitialized { repo: repo.slug() }))?;
      repo.since = Some(watermark.clone());
    }
    Ok(self)
  }
}

fn invalid(reason: impl Into<String>) -> ReleaseError {
  ReleaseError::Config(ConfigError::InvalidRegistry { reason: reason.into() })
}

/// Parse an `owner/name` repository spec
pub fn parse_spec(spec: &str, is_main: bool) -> ReleaseResult<Repository> {
  let spec = spec.trim().trim_end_matches(".git");
  match spec.split_once('/') {
    Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
      Ok(Repository::new(owner, name, is_main))
    }
    _ => Err(invalid(format!("'{}' is not an owner/name repository spec", spec))),
  }
}

/// Record every repository's current head as its watermark
///
/// All-or-nothing: if any lookup fails, nothing is returned.
pub fn initialize<H>(host: &H, registry: &Registry, progress: &FetchProgress) -> ReleaseResult<Watermarks>
where
  H: HostingService + ?Sized,
{
  let heads = fetch::fan_out(registry.repos(), progress, |repo| fetch::fetch_head(host, repo))?;

  Ok(
    registry
      .repos()
      .iter()
      .zip(heads)
      .map(|(repo, head): (&Repository, Commit)| (repo.name.clone(), Watermark::from_commit(&head)))
      .collect(),
  )
}
