//! Tests for the `status` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_status_lists_watermarks() -> Result<()> {
  let project = TestProject::new(INITIALIZED_DOCUMENT)?;

  let output = project.run(&["status"])?;

  assert!(output.status.success(), "stderr: {}", stderr(&output));
  let out = stdout(&output);
  assert!(out.contains("Version 1.0.0"));
  assert!(out.contains("acme/web (main) 1111111 2024-01-01 Initial"));
  assert!(out.contains("acme/api (dependent) 2222222 2024-01-02 Add endpoint"));

  Ok(())
}

#[test]
fn test_status_json() -> Result<()> {
  let project = TestProject::new(CONFIGURED_DOCUMENT)?;

  let output = project.run(&["status", "--json"])?;

  assert!(output.status.success(), "stderr: {}", stderr(&output));
  let status: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(status["version"], "1.0.0");
  assert_eq!(status["initialized"], false);
  assert_eq!(status["repositories"][0]["name"], "web");
  assert_eq!(status["repositories"][0]["main"], true);
  assert!(status["repositories"][1]["last_sha"].is_null());

  Ok(())
}

#[test]
fn test_status_without_registry() -> Result<()> {
  let project = TestProject::new("{\"version\": \"0.3.0\"}\n")?;

  let output = project.run(&["status"])?;

  assert!(output.status.success());
  assert!(stdout(&output).contains("No repositories configured"));

  Ok(())
}
