use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use crate::core::config::Settings;
use crate::core::error::ReleaseResult;
use crate::release::registry::Registry;
use crate::release::state::ReleaseDocument;

/// Status of one tracked repository
#[derive(Debug, Clone, Serialize)]
pub struct RepoStatus {
  pub owner: String,
  pub name: String,
  pub main: bool,
  /// Last released commit (absent before `init`)
  pub last_sha: Option<String>,
  pub since: Option<DateTime<Utc>>,
  pub message: Option<String>,
}

/// Status of the whole project
#[derive(Debug, Clone, Serialize)]
pub struct ProjectStatus {
  pub document: PathBuf,
  pub version: String,
  pub initialized: bool,
  pub repositories: Vec<RepoStatus>,
}

/// Read the release document (no network, no git)
pub fn project_status(settings: &Settings) -> ReleaseResult<ProjectStatus> {
  let document = ReleaseDocument::load(&settings.document_path())?;
  let section = document.section()?;

  let repositories = if section.config.is_empty() {
    Vec::new()
  } else {
    Registry::from_descriptors(&section.config)?
      .repos()
      .iter()
      .map(|repo| {
        let watermark = section.releases.get(&repo.name);
        RepoStatus {
          owner: repo.owner.clone(),
          name: repo.name.clone(),
          main: repo.is_main,
          last_sha: watermark.map(|w| w.last_sha.clone()),
          since: watermark.and_then(|w| w.since),
          message: watermark.map(|w| w.message.clone()),
        }
      })
      .collect()
  };

  Ok(ProjectStatus {
    document: settings.document_path(),
    version: document.version_str()?.to_string(),
    initialized: !section.releases.is_empty(),
    repositories,
  })
}

/// Run the status command
pub fn run_status(settings: &Settings, json: bool) -> ReleaseResult<()> {
  let status = project_status(settings)?;

  if json {
    println!("{}", serde_json::to_string_pretty(&status)?);
    return Ok(());
  }

  println!("📦 Version {}", status.version);
  println!("   {}", status.document.display());
  println!();

  if status.repositories.is_empty() {
    println!("⚠️  No repositories configured. Run `simple-release init`.");
    return Ok(());
  }

  for repo in &status.repositories {
    let role = if repo.main { "main" } else { "dependent" };
    match &repo.last_sha {
      Some(sha) => {
        let since = repo
          .since
          .map(|s| s.format("%Y-%m-%d").to_string())
          .unwrap_or_else(|| "-".to_string());
        println!(
          "  ✓ {}/{} ({}) {} {} {}",
          repo.owner,
          repo.name,
          role,
          sha.get(..7).unwrap_or(sha),
          since,
          repo.message.as_deref().unwrap_or("")
        );
      }
      None => println!("  ✗ {}/{} ({}) not initialized", repo.owner, repo.name, role),
    }
  }

  Ok(())
}
