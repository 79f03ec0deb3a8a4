//! `simple-release release [TYPE]`: bump, tag, publish and record watermarks

use crate::core::config::Settings;
use crate::core::error::ReleaseResult;
use crate::core::vcs::SystemGit;
use crate::hosting::GitHubClient;
use crate::release::pipeline::{self, ReleaseOptions, ReleaseOutcome, ReleasePreview, ReleaseSummary};
use crate::release::version::ReleaseType;
use tracing::debug;

/// Release type from the positional argument
///
/// Absent or empty means patch; anything unknown is `None`.
pub fn parse_release_type(raw: Option<&str>) -> Option<ReleaseType> {
  match raw.map(str::trim) {
    None | Some("") => Some(ReleaseType::default()),
    Some(value) => value.parse().ok(),
  }
}

/// Run the release command
pub fn run_release(
  settings: &Settings,
  release_type: Option<String>,
  preid: Option<String>,
  dry_run: bool,
) -> ReleaseResult<()> {
  let Some(release_type) = parse_release_type(release_type.as_deref()) else {
    println!("Release type not supported.");
    return Ok(());
  };
  let options = ReleaseOptions { release_type, preid };

  let host = GitHubClient::new(settings)?;
  let outcome = if dry_run {
    pipeline::preview(&host, settings, &options)?
  } else {
    let git = SystemGit::open(settings.project_root())?;
    debug!(work_tree = %git.work_tree().display(), "opened main repository");
    pipeline::run(&host, &git, settings, &options)?
  };

  match outcome {
    ReleaseOutcome::NoUpdates => println!("No updates available"),
    ReleaseOutcome::Preview(preview) => print_preview(&preview),
    ReleaseOutcome::Released(summary) => print_summary(&summary, settings),
  }

  Ok(())
}

fn print_preview(preview: &ReleasePreview) {
  println!("📦 Release plan");
  println!();
  println!("  Current:  {}", preview.previous_version);
  println!("  Proposed: {}", preview.version);
  println!();
  print!("{}", preview.changelog.to_markdown());
  println!("🔍 Dry-run mode (no changes applied)");
}

fn print_summary(summary: &ReleaseSummary, settings: &Settings) {
  println!("✅ Released {} (was {})", summary.version, summary.previous_version);
  println!("   Tagged {} and pushed to {}/{}", summary.tag, settings.remote, settings.branch);

  match (&summary.release, &summary.release_error) {
    (Some(release), _) => println!("   Release notes: {}", release.html_url),
    (None, Some(reason)) => println!("⚠️  Release {} was not created: {}", summary.tag, reason),
    (None, None) => {}
  }

  println!(
    "   {} changes across {} repositories",
    summary.changelog.entry_count(),
    summary.changelog.sections.len()
  );
  for (name, watermark) in &summary.watermarks {
    println!("   {} now at {}", name, watermark.last_sha.get(..7).unwrap_or(&watermark.last_sha));
  }
}
