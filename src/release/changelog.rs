//! Changelog rendering
//!
//! One section per repository that still has commits after filtering, one
//! bullet per commit in fetch order (newest first). Output depends only on
//! the input, so the same filtered commits always render the same body.

use crate::release::fetch::RepoCommits;
use std::fmt::Write;

/// A single changelog line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
  pub message: String,
  pub author: String,
  pub sha: String,
}

/// Entries for one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogSection {
  pub owner: String,
  pub name: String,
  pub entries: Vec<ChangelogEntry>,
}

/// Release notes grouped by repository
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changelog {
  pub sections: Vec<ChangelogSection>,
}

impl Changelog {
  /// Build from filtered commits, skipping repositories with nothing left
  pub fn build(filtered: &[RepoCommits]) -> Self {
    let sections = filtered
      .iter()
      .filter(|r| !r.is_empty())
      .map(|r| ChangelogSection {
        owner: r.repo.owner.clone(),
        name: r.repo.name.clone(),
        entries: r
          .commits
          .iter()
          .map(|c| ChangelogEntry {
            message: c.first_line().to_string(),
            author: c.author_login.clone(),
            sha: c.sha.clone(),
          })
          .collect(),
      })
      .collect();

    Self { sections }
  }

  pub fn entry_count(&self) -> usize {
    self.sections.iter().map(|s| s.entries.len()).sum()
  }

  /// Render as markdown
  pub fn to_markdown(&self) -> String {
    let mut output = String::new();

    for section in &self.sections {
      writeln!(output, "## {}", section.name).ok();
      for entry in &section.entries {
        writeln!(
          output,
          "- {} - @{} ({}/{}@{})",
          entry.message, entry.author, section.owner, section.name, entry.sha
        )
        .ok();
      }
      output.push('\n');
    }

    output
  }
}
