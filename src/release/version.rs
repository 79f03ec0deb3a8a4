//! Semantic version bumps
//!
//! Increments follow the usual npm rules: a plain bump of a pre-release
//! version first "graduates" it (`1.2.4-0` + patch = `1.2.4`), and the
//! `pre*` types start or advance a numeric pre-release counter, optionally
//! under a named identifier (`--preid beta`).

use crate::core::error::{ReleaseError, ReleaseResult};
use semver::{BuildMetadata, Prerelease, Version};
use std::fmt;
use std::str::FromStr;

/// Release type accepted by `release [TYPE]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReleaseType {
  Major,
  Premajor,
  Minor,
  Preminor,
  #[default]
  Patch,
  Prepatch,
  Prerelease,
}

impl ReleaseType {
  pub const ALL: [ReleaseType; 7] = [
    ReleaseType::Major,
    ReleaseType::Premajor,
    ReleaseType::Minor,
    ReleaseType::Preminor,
    ReleaseType::Patch,
    ReleaseType::Prepatch,
    ReleaseType::Prerelease,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      ReleaseType::Major => "major",
      ReleaseType::Premajor => "premajor",
      ReleaseType::Minor => "minor",
      ReleaseType::Preminor => "preminor",
      ReleaseType::Patch => "patch",
      ReleaseType::Prepatch => "prepatch",
      ReleaseType::Prerelease => "prerelease",
    }
  }

  /// Next version after `current`
  pub fn apply(&self, current: &Version, preid: Option<&str>) -> ReleaseResult<Version> {
    let preid = preid.map(str::trim).filter(|p| !p.is_empty());
    let is_pre = !current.pre.is_empty();
    let mut next = Version::new(current.major, current.minor, current.patch);

    match self {
      ReleaseType::Major => {
        if current.minor != 0 || current.patch != 0 || !is_pre {
          next = Version::new(increment(current.major, current)?, 0, 0);
        }
      }
      ReleaseType::Minor => {
        if current.patch != 0 || !is_pre {
          next = Version::new(current.major, increment(current.minor, current)?, 0);
        }
      }
      ReleaseType::Patch => {
        if !is_pre {
          next.patch = increment(next.patch, current)?;
        }
      }
      ReleaseType::Premajor => {
        next = Version::new(increment(current.major, current)?, 0, 0);
        next.pre = next_prerelease(&[], preid, current)?;
      }
      ReleaseType::Preminor => {
        next = Version::new(current.major, increment(current.minor, current)?, 0);
        next.pre = next_prerelease(&[], preid, current)?;
      }
      ReleaseType::Prepatch => {
        next.patch = increment(next.patch, current)?;
        next.pre = next_prerelease(&[], preid, current)?;
      }
      ReleaseType::Prerelease => {
        let existing = if is_pre {
          identifiers(&current.pre)
        } else {
          next.patch = increment(next.patch, current)?;
          Vec::new()
        };
        next.pre = next_prerelease(&existing, preid, current)?;
      }
    }

    next.build = BuildMetadata::EMPTY;
    Ok(next)
  }
}

impl fmt::Display for ReleaseType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Unknown release type token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedReleaseType(pub String);

impl fmt::Display for UnsupportedReleaseType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "unsupported release type '{}'", self.0)
  }
}

impl std::error::Error for UnsupportedReleaseType {}

impl FromStr for ReleaseType {
  type Err = UnsupportedReleaseType;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    ReleaseType::ALL
      .into_iter()
      .find(|t| t.as_str() == s)
      .ok_or_else(|| UnsupportedReleaseType(s.to_string()))
  }
}

/// Parse `current` and bump it
pub fn bump(current: &str, release_type: ReleaseType, preid: Option<&str>) -> ReleaseResult<Version> {
  let version = Version::parse(current).map_err(|e| ReleaseError::invalid_version(current, e))?;
  release_type.apply(&version, preid)
}

/// `n + 1`, or an error when `current` is already at the numeric limit
fn increment(n: u64, current: &Version) -> ReleaseResult<u64> {
  n.checked_add(1).ok_or_else(|| ReleaseError::invalid_version(current.to_string(), format!("{} cannot be incremented", n)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Identifier {
  Numeric(u64),
  Alpha(String),
}

impl fmt::Display for Identifier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Identifier::Numeric(n) => write!(f, "{}", n),
      Identifier::Alpha(s) => f.write_str(s),
    }
  }
}

fn identifiers(pre: &Prerelease) -> Vec<Identifier> {
  pre
    .as_str()
    .split('.')
    .map(|part| match part.parse::<u64>() {
      Ok(n) => Identifier::Numeric(n),
      Err(_) => Identifier::Alpha(part.to_string()),
    })
    .collect()
}

/// Advance a pre-release: bump the last numeric identifier, or append `0`
///
/// A `preid` different from the current leading identifier restarts the
/// counter under that identifier.
fn next_prerelease(existing: &[Identifier], preid: Option<&str>, current: &Version) -> ReleaseResult<Prerelease> {
  let mut ids = existing.to_vec();

  let last_numeric = ids.iter().rposition(|id| matches!(id, Identifier::Numeric(_)));
  match last_numeric {
    Some(i) => {
      if let Identifier::Numeric(n) = &mut ids[i] {
        *n = increment(*n, current)?;
      }
    }
    None => ids.push(Identifier::Numeric(0)),
  }

  if let Some(preid) = preid {
    let same_lead = matches!(ids.first(), Some(Identifier::Alpha(lead)) if lead == preid);
    let counted = matches!(ids.get(1), Some(Identifier::Numeric(_)));
    if !(same_lead && counted) {
      ids = vec![Identifier::Alpha(preid.to_string()), Identifier::Numeric(0)];
    }
  }

  let text = ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(".");
  Prerelease::new(&text).map_err(|e| ReleaseError::invalid_version(current.to_string(), format!("pre-release '{}': {}", text, e)))
}
