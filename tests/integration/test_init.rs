//! Tests for the `init` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_init_is_noop_when_already_initialized() -> Result<()> {
  let project = TestProject::new(INITIALIZED_DOCUMENT)?;

  let output = project.run(&["init", "--main", "acme/other"])?;

  assert!(output.status.success(), "stderr: {}", stderr(&output));
  assert!(stdout(&output).contains("Already initialized."));
  assert_eq!(project.document()?, INITIALIZED_DOCUMENT);
  assert_eq!(project.git_log()?, vec!["Initial project setup"]);

  Ok(())
}

const TOP_LEVEL_DOCUMENT: &str = r#"{
  "name": "web",
  "version": "1.0.0",
  "releases": {
    "web": { "lastSHA": "1111111111111111111111111111111111111111", "message": "Initial" }
  }
}
"#;

#[test]
fn test_init_is_noop_for_top_level_releases() -> Result<()> {
  let project = TestProject::new(TOP_LEVEL_DOCUMENT)?;

  let output = project.run(&["init"])?;

  assert!(output.status.success(), "stderr: {}", stderr(&output));
  assert!(stdout(&output).contains("Already initialized."));
  assert!(stdout(&output).contains("--main OWNER/NAME"));
  assert_eq!(project.document()?, TOP_LEVEL_DOCUMENT);
  assert_eq!(project.git_log()?, vec!["Initial project setup"]);

  Ok(())
}

#[test]
fn test_release_on_top_level_releases_points_at_init() -> Result<()> {
  let project = TestProject::new(TOP_LEVEL_DOCUMENT)?;

  let output = project.run(&["release"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("simple-release init --main"), "stderr: {}", stderr(&output));
  assert_eq!(project.document()?, TOP_LEVEL_DOCUMENT);

  Ok(())
}

#[test]
fn test_init_fetch_failure_writes_nothing() -> Result<()> {
  let project = TestProject::new(CONFIGURED_DOCUMENT)?;

  let output = project.run(&["init"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("Failed to fetch commits"), "stderr: {}", stderr(&output));
  assert_eq!(project.document()?, CONFIGURED_DOCUMENT);
  assert_eq!(project.git_log()?, vec!["Initial project setup"]);

  Ok(())
}

#[test]
fn test_init_rejects_malformed_repository() -> Result<()> {
  let project = TestProject::new("{\"version\": \"0.1.0\"}\n")?;

  let output = project.run(&["init", "--main", "acme"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("not an owner/name repository spec"));
  assert_eq!(project.document()?, "{\"version\": \"0.1.0\"}\n");

  Ok(())
}

#[test]
fn test_init_rejects_duplicate_names() -> Result<()> {
  let project = TestProject::new("{\"version\": \"0.1.0\"}\n")?;

  let output = project.run(&["init", "--main", "acme/web", "--dep", "other/web"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("used more than once"));

  Ok(())
}

#[test]
fn test_init_without_registry_needs_input() -> Result<()> {
  let project = TestProject::new("{\"version\": \"0.1.0\"}\n")?;

  // stdin is closed, so the prompt gets nothing
  let output = project.run(&["init"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("No main repository given"));

  Ok(())
}

#[test]
fn test_init_without_document() -> Result<()> {
  let project = TestProject::without_document()?;

  let output = project.run(&["init", "--main", "acme/web"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("Release document not found"));

  Ok(())
}
