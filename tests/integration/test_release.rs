//! Integration tests for `simple-release release`

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_unsupported_release_type_changes_nothing() -> Result<()> {
  let project = TestProject::new(INITIALIZED_DOCUMENT)?;

  let output = project.run(&["release", "badtype"])?;

  assert!(output.status.success(), "stderr: {}", stderr(&output));
  assert_eq!(stdout(&output).trim(), "Release type not supported.");
  assert_eq!(project.document()?, INITIALIZED_DOCUMENT);
  assert_eq!(project.git_log()?, vec!["Initial project setup"]);
  assert_eq!(project.tags()?, "");

  Ok(())
}

#[test]
fn test_unsupported_release_type_checked_before_document() -> Result<()> {
  let project = TestProject::without_document()?;

  let output = project.run(&["release", "mega"])?;

  assert!(output.status.success());
  assert_eq!(stdout(&output).trim(), "Release type not supported.");

  Ok(())
}

#[test]
fn test_release_requires_initialization() -> Result<()> {
  let project = TestProject::new(CONFIGURED_DOCUMENT)?;

  let output = project.run(&["release", "minor"])?;

  assert_eq!(output.status.code(), Some(1));
  let err = stderr(&output);
  assert!(err.contains("has no release entry"), "stderr: {}", err);
  assert!(err.contains("simple-release init"));
  assert_eq!(project.document()?, CONFIGURED_DOCUMENT);

  Ok(())
}

#[test]
fn test_release_fetch_failure_changes_nothing() -> Result<()> {
  let project = TestProject::new(INITIALIZED_DOCUMENT)?;

  let output = project.run(&["release"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("Failed to fetch commits"), "stderr: {}", stderr(&output));
  assert_eq!(project.document()?, INITIALIZED_DOCUMENT);
  assert_eq!(project.git_log()?, vec!["Initial project setup"]);
  assert_eq!(project.tags()?, "");

  let remote_log = git(&project.remote, &["log", "--format=%s", "main"])?;
  assert_eq!(String::from_utf8_lossy(&remote_log.stdout).trim(), "Initial project setup");

  Ok(())
}

#[test]
fn test_dry_run_fetch_failure_changes_nothing() -> Result<()> {
  let project = TestProject::new(INITIALIZED_DOCUMENT)?;

  let output = project.run(&["release", "prerelease", "--preid", "beta", "--dry-run"])?;

  assert_eq!(output.status.code(), Some(1));
  assert_eq!(project.document()?, INITIALIZED_DOCUMENT);

  Ok(())
}

#[test]
fn test_release_without_document() -> Result<()> {
  let project = TestProject::without_document()?;

  let output = project.run(&["release", "patch"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("Release document not found"));

  Ok(())
}
