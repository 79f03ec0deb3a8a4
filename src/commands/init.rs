//! `simple-release init`: register repositories and record their heads

use crate::core::config::{DOCUMENT_FILE, Settings};
use crate::core::error::{ReleaseError, ReleaseResult};
use crate::core::vcs::SystemGit;
use crate::hosting::{GitHubClient, HostingService};
use crate::release::filter::RELEASE_INFO_MESSAGE;
use crate::release::registry::{self, Registry};
use crate::release::state::{ReleaseDocument, Watermarks};
use crate::ui::progress::FetchProgress;
use anyhow::Context;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::{debug, info};

/// What `init` recorded
#[derive(Debug)]
pub struct InitSummary {
  pub releases: Watermarks,
  /// Existing watermarks were kept instead of fetching heads
  pub adopted: bool,
  /// The pushed "release info" commit
  pub head: String,
}

/// Run the init command
///
/// A document that already has release entries is left untouched so that
/// watermarks can never be reset by accident. The one exception is a
/// document whose watermarks have no registry yet: `--main` then records
/// the registry next to the existing watermarks.
pub fn run_init(settings: &Settings, main: Option<String>, deps: Vec<String>) -> ReleaseResult<()> {
  let document = ReleaseDocument::load(&settings.document_path())?;
  let section = document.section()?;
  if !section.releases.is_empty() && (!section.config.is_empty() || main.is_none()) {
    println!("Already initialized.");
    if section.config.is_empty() {
      println!("   No repositories are recorded yet. Pass --main OWNER/NAME (and --dep) to add them.");
    }
    return Ok(());
  }

  let registry = resolve_registry(&document, main, &deps)?;
  let git = SystemGit::open(settings.project_root())?;
  debug!(work_tree = %git.work_tree().display(), "opened main repository");
  let host = GitHubClient::new(settings)?;

  if section.releases.is_empty() {
    println!("🔍 Recording the latest commit of {} repositories", registry.repos().len());
  }
  let summary = init(&host, &git, settings, document, &registry)?;

  for repo in registry.repos() {
    if let Some(watermark) = summary.releases.get(&repo.name) {
      let marker = if repo.is_main { " (main)" } else { "" };
      println!("   {}{} @ {}", repo, marker, short_sha(&watermark.last_sha));
    }
  }
  if summary.adopted {
    println!("   Kept the existing watermarks");
  }
  println!("   Pushed {} to {}/{}", short_sha(&summary.head), settings.remote, settings.branch);

  println!("✅ Initialized {}", settings.document_path().display());
  Ok(())
}

/// Record the registry and its watermarks, then commit and push the document
///
/// Watermarks already in the document are kept, provided every registered
/// repository has one. Otherwise each repository's current head is fetched;
/// a single failed lookup aborts before anything is written.
pub fn init<H>(
  host: &H,
  git: &SystemGit,
  settings: &Settings,
  mut document: ReleaseDocument,
  registry: &Registry,
) -> ReleaseResult<InitSummary>
where
  H: HostingService + ?Sized,
{
  let mut section = document.section()?;
  let adopted = !section.releases.is_empty();

  if adopted {
    registry.clone().with_watermarks(&section.releases)?;
  } else {
    let progress = FetchProgress::new(registry.repos().len(), "Fetching heads");
    section.releases = registry::initialize(host, registry, &progress)?;
  }

  section.config = registry.descriptors();
  document.set_section(&section)?;
  document.save()?;
  info!(repos = registry.repos().len(), adopted, "recorded release info");

  git.add(Path::new(DOCUMENT_FILE))?;
  git.commit(RELEASE_INFO_MESSAGE)?;
  let head = git.head_commit()?;
  git.push_branch(&settings.remote, &settings.branch)?;

  Ok(InitSummary {
    releases: section.releases,
    adopted,
    head,
  })
}

/// Registry from flags, then the document's config, then stdin
fn resolve_registry(document: &ReleaseDocument, main: Option<String>, deps: &[String]) -> ReleaseResult<Registry> {
  if let Some(main) = main {
    return Registry::from_specs(&main, deps);
  }
  if !deps.is_empty() {
    return Err(ReleaseError::with_help(
      "--dep needs a main repository",
      "Pass --main OWNER/NAME alongside --dep.",
    ));
  }

  let section = document.section()?;
  if !section.config.is_empty() {
    return Registry::from_descriptors(&section.config);
  }

  Ok(prompt_registry(io::stdin().lock())?)
}

/// Ask for the main repository, then dependents until an empty line
fn prompt_registry(input: impl BufRead) -> anyhow::Result<Registry> {
  let mut lines = input.lines();

  print!("Main repository (owner/name): ");
  io::stdout().flush()?;
  let main = lines
    .next()
    .context("No main repository given")?
    .context("Failed to read main repository")?;

  let mut deps = Vec::new();
  loop {
    print!("Dependent repository (owner/name, empty to finish): ");
    io::stdout().flush()?;
    match lines.next() {
      Some(line) => {
        let line = line.context("Failed to read dependent repository")?;
        if line.trim().is_empty() {
          break;
        }
        deps.push(line);
      }
      None => break,
    }
  }
  println!();

  Ok(Registry::from_specs(&main, &deps)?)
}

fn short_sha(sha: &str) -> &str {
  sha.get(..7).unwrap_or(sha)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::error::ConfigError;
  use crate::hosting::{Commit, CommitQuery, HostError, HostResult, NewRelease, PublishedRelease};
  use chrono::{TimeZone, Utc};
  use serde_json::Value;
  use std::fs;
  use std::process::Command;
  use tempfile::TempDir;

  /// Answers head lookups with `<repo>-head`; `missing` is a 404
  struct HeadsHost;

  impl HostingService for HeadsHost {
    fn list_commits(&self, _owner: &str, repo: &str, query: &CommitQuery) -> HostResult<Vec<Commit>> {
      assert_eq!(query.per_page, 1);
      if repo == "missing" {
        return Err(HostError::Status {
          status: 404,
          message: "Not Found".to_string(),
        });
      }
      Ok(vec![Commit {
        sha: format!("{}-head", repo),
        author_login: "octocat".to_string(),
        message: format!("Latest {}", repo),
        authored_at: Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
      }])
    }

    fn create_release(&self, _: &str, _: &str, _: &NewRelease) -> HostResult<PublishedRelease> {
      unreachable!("init never creates releases")
    }
  }

  fn git(cwd: &Path, args: &[&str]) -> String {
    let output = Command::new("git").current_dir(cwd).args(args).output().unwrap();
    assert!(
      output.status.success(),
      "git {:?} failed: {}",
      args,
      String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
  }

  const PLAIN_DOC: &str = r#"{
  "name": "web",
  "version": "2.3.4",
  "scripts": {
    "build": "vite build"
  }
}
"#;

  const TOP_LEVEL_DOC: &str = r#"{
  "name": "web",
  "version": "2.3.4",
  "releases": {
    "web": { "lastSHA": "AAA", "since": "2024-01-01T00:00:00Z", "message": "Initial" },
    "api": { "lastSHA": "BBB", "since": "2024-01-02T00:00:00Z", "message": "Start" }
  }
}
"#;

  /// Checkout holding `package.json`, pushed to a bare remote on `main`
  struct Checkout {
    work: TempDir,
    remote: TempDir,
    settings: Settings,
  }

  impl Checkout {
    fn new(document: &str) -> Self {
      let remote = TempDir::new().unwrap();
      git(remote.path(), &["init", "--bare", "--initial-branch=main"]);

      let work = TempDir::new().unwrap();
      git(work.path(), &["init", "--initial-branch=main"]);
      git(work.path(), &["config", "user.name", "Release Bot"]);
      git(work.path(), &["config", "user.email", "bot@example.com"]);
      git(work.path(), &["config", "commit.gpgsign", "false"]);
      git(work.path(), &["remote", "add", "origin", remote.path().to_str().unwrap()]);
      fs::write(work.path().join("package.json"), document).unwrap();
      git(work.path(), &["add", "."]);
      git(work.path(), &["commit", "-m", "Initial"]);
      git(work.path(), &["push", "origin", "main"]);

      let settings = Settings::new(work.path()).with_branch("main");
      Self { work, remote, settings }
    }

    fn run(&self, registry: &Registry) -> ReleaseResult<InitSummary> {
      let git = SystemGit::open(self.work.path()).unwrap();
      let document = ReleaseDocument::load(&self.settings.document_path()).unwrap();
      init(&HeadsHost, &git, &self.settings, document, registry)
    }

    fn raw_document(&self) -> String {
      fs::read_to_string(self.settings.document_path()).unwrap()
    }

    fn remote_log(&self) -> Vec<String> {
      git(self.remote.path(), &["log", "--format=%s", "main"])
        .lines()
        .map(str::to_string)
        .collect()
    }
  }

  fn web_and_api() -> Registry {
    Registry::from_specs("acme/web", &["acme/api".to_string()]).unwrap()
  }

  #[test]
  fn test_init_records_heads_and_pushes() {
    let checkout = Checkout::new(PLAIN_DOC);
    let summary = checkout.run(&web_and_api()).unwrap();

    assert!(!summary.adopted);
    assert_eq!(summary.releases["web"].last_sha, "web-head");
    assert_eq!(summary.releases["api"].message, "Latest api");

    let written: Value = serde_json::from_str(&checkout.raw_document()).unwrap();
    assert_eq!(written["version"], "2.3.4");
    assert_eq!(written["scripts"]["build"], "vite build");
    let section = &written["simple-release"];
    assert_eq!(section["config"][0]["user"], "acme");
    assert_eq!(section["config"][0]["main"], true);
    assert_eq!(section["config"][1]["name"], "api");
    assert_eq!(section["releases"]["web"]["lastSHA"], "web-head");
    assert_eq!(section["releases"]["api"]["since"], "2024-06-01T08:00:00Z");

    assert_eq!(checkout.remote_log(), vec!["Update package with release info", "Initial"]);
    assert_eq!(git(checkout.remote.path(), &["rev-parse", "main"]), summary.head);
  }

  #[test]
  fn test_init_lookup_failure_writes_nothing() {
    let checkout = Checkout::new(PLAIN_DOC);
    let registry = Registry::from_specs("acme/web", &["acme/missing".to_string()]).unwrap();

    let err = checkout.run(&registry).unwrap_err();
    assert!(matches!(err, ReleaseError::Fetch(ref e) if e.repo == "acme/missing"));
    assert_eq!(checkout.raw_document(), PLAIN_DOC);
    assert_eq!(checkout.remote_log(), vec!["Initial"]);
  }

  #[test]
  fn test_init_keeps_top_level_watermarks() {
    let checkout = Checkout::new(TOP_LEVEL_DOC);
    let summary = checkout.run(&web_and_api()).unwrap();

    assert!(summary.adopted);
    assert_eq!(summary.releases["web"].last_sha, "AAA");
    assert_eq!(summary.releases["api"].last_sha, "BBB");

    let written: Value = serde_json::from_str(&checkout.raw_document()).unwrap();
    assert!(written.get("releases").is_none());
    assert_eq!(written["simple-release"]["releases"]["api"]["lastSHA"], "BBB");
    assert_eq!(written["simple-release"]["config"][0]["name"], "web");
    assert_eq!(checkout.remote_log(), vec!["Update package with release info", "Initial"]);
  }

  #[test]
  fn test_init_adoption_needs_a_watermark_per_repository() {
    let checkout = Checkout::new(TOP_LEVEL_DOC);
    let registry = Registry::from_specs("acme/web", &["acme/api".to_string(), "acme/docs".to_string()]).unwrap();

    let err = checkout.run(&registry).unwrap_err();
    assert!(matches!(err, ReleaseError::Config(ConfigError::NotInitialized { ref repo }) if repo == "acme/docs"));
    assert_eq!(checkout.raw_document(), TOP_LEVEL_DOC);
  }

  #[test]
  fn test_run_init_leaves_top_level_watermarks_without_main() {
    let checkout = Checkout::new(TOP_LEVEL_DOC);
    run_init(&checkout.settings, None, Vec::new()).unwrap();

    assert_eq!(checkout.raw_document(), TOP_LEVEL_DOC);
    assert_eq!(checkout.remote_log(), vec!["Initial"]);
  }

  fn document(json: &str) -> ReleaseDocument {
    ReleaseDocument::parse(Path::new("package.json"), json).unwrap()
  }

  #[test]
  fn test_flags_win_over_document_config() {
    let doc = document(r#"{"simple-release": {"config": [{"user": "old", "name": "x", "main": true}]}}"#);
    let registry = resolve_registry(&doc, Some("acme/web".to_string()), &["acme/api".to_string()]).unwrap();
    assert_eq!(registry.main().slug(), "acme/web");
    assert_eq!(registry.repos().len(), 2);
  }

  #[test]
  fn test_document_config_used_without_flags() {
    let doc = document(r#"{"simple-release": {"config": [{"user": "old", "name": "x", "main": true}]}}"#);
    let registry = resolve_registry(&doc, None, &[]).unwrap();
    assert_eq!(registry.main().slug(), "old/x");
  }

  #[test]
  fn test_dep_without_main_rejected() {
    let doc = document("{}");
    assert!(resolve_registry(&doc, None, &["acme/api".to_string()]).is_err());
  }

  #[test]
  fn test_prompt_registry() {
    let registry = prompt_registry("acme/web\nacme/api\n\nignored/after\n".as_bytes()).unwrap();
    let slugs: Vec<_> = registry.repos().iter().map(|r| r.slug()).collect();
    assert_eq!(slugs, vec!["acme/web", "acme/api"]);
    assert!(registry.repos()[0].is_main);
  }

  #[test]
  fn test_prompt_registry_needs_main() {
    assert!(prompt_registry("".as_bytes()).is_err());
  }

  #[test]
  fn test_short_sha() {
    assert_eq!(short_sha("6dcb09b5b57875f334f61aebed695e2e4193db5e"), "6dcb09b");
    assert_eq!(short_sha("abc"), "abc");
  }
}
