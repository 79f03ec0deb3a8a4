//! Tests for argument handling

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_help_lists_subcommands() -> Result<()> {
  let dir = tempfile::TempDir::new()?;
  let output = run_simple_release(dir.path(), &["--help"])?;

  assert!(output.status.success());
  let out = stdout(&output);
  assert!(out.contains("init"));
  assert!(out.contains("release"));
  assert!(out.contains("status"));

  Ok(())
}

#[test]
fn test_short_help() -> Result<()> {
  let dir = tempfile::TempDir::new()?;
  let output = run_simple_release(dir.path(), &["release", "-h"])?;

  assert!(output.status.success());
  assert!(stdout(&output).contains("--dry-run"));

  Ok(())
}

#[test]
fn test_unknown_flag_not_recognized() -> Result<()> {
  let dir = tempfile::TempDir::new()?;
  let output = run_simple_release(dir.path(), &["release", "--bogus"])?;

  assert_eq!(output.status.code(), Some(1));
  assert_eq!(stdout(&output).trim(), "Option not recognized.");

  Ok(())
}

#[test]
fn test_unknown_subcommand_not_recognized() -> Result<()> {
  let dir = tempfile::TempDir::new()?;
  let output = run_simple_release(dir.path(), &["publish"])?;

  assert_eq!(output.status.code(), Some(1));
  assert_eq!(stdout(&output).trim(), "Option not recognized.");

  Ok(())
}

#[test]
fn test_no_subcommand_not_recognized() -> Result<()> {
  let dir = tempfile::TempDir::new()?;
  let output = run_simple_release(dir.path(), &[])?;

  assert_eq!(output.status.code(), Some(1));
  assert_eq!(stdout(&output).trim(), "Option not recognized.");

  Ok(())
}
