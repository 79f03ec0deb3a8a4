//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Hosting API endpoint nothing listens on
pub const UNREACHABLE_API: &str = "http://127.0.0.1:1";

/// Document with a registry but no release entries yet
pub const CONFIGURED_DOCUMENT: &str = r#"{
  "name": "web",
  "version": "1.0.0",
  "simple-release": {
    "config": [
      { "user": "acme", "name": "web", "main": true },
      { "user": "acme", "name": "api" }
    ]
  }
}
"#;

/// Document ready for a release
pub const INITIALIZED_DOCUMENT: &str = r#"{
  "name": "web",
  "version": "1.0.0",
  "private": true,
  "simple-release": {
    "config": [
      { "user": "acme", "name": "web", "main": true },
      { "user": "acme", "name": "api" }
    ],
    "releases": {
      "web": { "lastSHA": "1111111111111111111111111111111111111111", "since": "2024-01-01T00:00:00Z", "message": "Initial" },
      "api": { "lastSHA": "2222222222222222222222222222222222222222", "since": "2024-01-02T00:00:00Z", "message": "Add endpoint" }
    }
  }
}
"#;

/// A main-repository checkout with a bare remote, both on branch `main`
pub struct TestProject {
  _root: TempDir,
  pub path: PathBuf,
  pub remote: PathBuf,
}

impl TestProject {
  /// Create a project whose package.json holds `document`
  pub fn new(document: &str) -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().join("web");
    let remote = root.path().join("web.git");
    std::fs::create_dir_all(&path)?;
    std::fs::create_dir_all(&remote)?;

    git(&remote, &["init", "--bare", "--initial-branch=main"])?;

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    git(&path, &["config", "commit.gpgsign", "false"])?;
    git(&path, &["remote", "add", "origin", &remote.to_string_lossy()])?;

    std::fs::write(path.join("package.json"), document)?;
    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial project setup"])?;
    git(&path, &["push", "origin", "main"])?;

    Ok(Self {
      _root: root,
      path,
      remote,
    })
  }

  /// Project directory without package.json
  pub fn without_document() -> Result<Self> {
    let project = Self::new("{}\n")?;
    std::fs::remove_file(project.path.join("package.json"))?;
    Ok(project)
  }

  /// Run simple-release against this project with an unreachable hosting API
  pub fn run(&self, args: &[&str]) -> Result<Output> {
    let mut full_args = vec!["--project", self.path.to_str().context("non-UTF-8 temp path")?, "--branch", "main"];
    full_args.extend_from_slice(args);
    run_simple_release(&self.path, &full_args)
  }

  pub fn document(&self) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join("package.json"))?)
  }

  /// Commit subjects, newest first
  pub fn git_log(&self) -> Result<Vec<String>> {
    let output = git(&self.path, &["log", "--format=%s"])?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect(),
    )
  }

  pub fn tags(&self) -> Result<String> {
    let output = git(&self.path, &["tag", "--list"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run the simple-release binary; the caller inspects the exit status
pub fn run_simple_release(cwd: &Path, args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_simple-release");

  Command::new(bin)
    .current_dir(cwd)
    .args(args)
    .env_remove("GITHUB_TOKEN")
    .env_remove("SIMPLE_RELEASE_PROJECT")
    .env_remove("SIMPLE_RELEASE_REMOTE")
    .env_remove("SIMPLE_RELEASE_BRANCH")
    .env_remove("RUST_LOG")
    .env("SIMPLE_RELEASE_API_URL", UNREACHABLE_API)
    .output()
    .context("Failed to run simple-release")
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).to_string()
}
