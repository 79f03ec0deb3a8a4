//! Release state persisted in the main repository's package.json
//!
//! Layout (the `simple-release` section):
//!
//! ```json
//! {
//!   "name": "frontend",
//!   "version": "1.4.2",
//!   "simple-release": {
//!     "config": [{ "user": "acme", "name": "frontend", "main": true }],
//!     "releases": {
//!       "frontend": { "lastSHA": "9f2c…", "since": "2024-05-01T09:30:00Z", "message": "Fix login" }
//!     }
//!   }
//! }
//! ```
//!
//! Documents may instead carry the watermarks in a top-level `releases` map
//! with no registry. Those watermarks are read as the section's releases and
//! are moved into the section on the next write.
//!
//! The document is read fresh at the start of every command and rewritten
//! whole. Unrelated keys and key order are preserved, including the order of
//! the `releases` entries. There is no locking: two concurrent runs against
//! the same document will overwrite each other.

use crate::core::error::{ConfigError, ReleaseError, ReleaseResult, ResultExt};
use crate::hosting::Commit;
use crate::release::registry::{Registry, RepoDescriptor};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Key holding this tool's section of the document
pub const SECTION_KEY: &str = "simple-release";

/// Top-level watermark map of documents without a section
pub const TOP_LEVEL_RELEASES_KEY: &str = "releases";

/// Watermarks keyed by repository name, in document order
pub type Watermarks = IndexMap<String, Watermark>;

/// Last released commit of one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watermark {
  #[serde(rename = "lastSHA")]
  pub last_sha: String,
  /// Authored time of `last_sha`; absent in documents written by older versions
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub since: Option<DateTime<Utc>>,
  #[serde(default)]
  pub message: String,
}

impl Watermark {
  pub fn new(last_sha: impl Into<String>, since: Option<DateTime<Utc>>, message: impl Into<String>) -> Self {
    Self {
      last_sha: last_sha.into(),
      since,
      message: message.into(),
    }
  }

  pub fn from_commit(commit: &Commit) -> Self {
    Self::new(&commit.sha, Some(commit.authored_at), commit.first_line())
  }
}

/// This tool's section of the document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseSection {
  #[serde(default)]
  pub config: Vec<RepoDescriptor>,
  #[serde(default)]
  pub releases: Watermarks,
}

/// package.json with typed access to `version` and the release section
#[derive(Debug, Clone)]
pub struct ReleaseDocument {
  path: PathBuf,
  root: Map<String, Value>,
}

impl ReleaseDocument {
  /// Read the document from disk
  pub fn load(path: &Path) -> ReleaseResult<Self> {
    if !path.exists() {
      return Err(ReleaseError::Config(ConfigError::DocumentNotFound {
        path: path.to_path_buf(),
      }));
    }

    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Self::parse(path, &content)
  }

  /// Parse document content (`path` is where `save` will write)
  pub fn parse(path: &Path, content: &str) -> ReleaseResult<Self> {
    let value: Value = serde_json::from_str(content)
      .map_err(|e| ReleaseError::message(format!("Failed to parse {}: {}", path.display(), e)))?;

    match value {
      Value::Object(root) => Ok(Self {
        path: path.to_path_buf(),
        root,
      }),
      _ => Err(ReleaseError::message(format!(
        "{} must contain a JSON object",
        path.display()
      ))),
    }
  }

  /// Raw `version` string
  pub fn version_str(&self) -> ReleaseResult<&str> {
    self
      .root
      .get("version")
      .and_then(Value::as_str)
      .ok_or_else(|| {
        ReleaseError::Config(ConfigError::MissingField {
          field: "version".to_string(),
        })
      })
  }

  /// `version` parsed as semver
  pub fn version(&self) -> ReleaseResult<semver::Version> {
    let raw = self.version_str()?;
    semver::Version::parse(raw).map_err(|e| ReleaseError::invalid_version(raw, e))
  }

  pub fn set_version(&mut self, version: &semver::Version) {
    self.root.insert("version".to_string(), Value::String(version.to_string()));
  }

  /// The release section (empty when absent)
  ///
  /// When the section has no releases, a top-level `releases` map stands in.
  pub fn section(&self) -> ReleaseResult<ReleaseSection> {
    let mut section: ReleaseSection = match self.root.get(SECTION_KEY) {
      None | Some(Value::Null) => ReleaseSection::default(),
      Some(value) => serde_json::from_value(value.clone())
        .map_err(|e| ReleaseError::message(format!("Malformed \"{}\" section: {}", SECTION_KEY, e)))?,
    };

    if section.releases.is_empty()
      && let Some(releases) = self.top_level_releases()?
    {
      section.releases = releases;
    }

    Ok(section)
  }

  /// Store the section, dropping any top-level `releases` it supersedes
  pub fn set_section(&mut self, section: &ReleaseSection) -> ReleaseResult<()> {
    let value = serde_json::to_value(section)?;
    self.root.shift_remove(TOP_LEVEL_RELEASES_KEY);
    self.root.insert(SECTION_KEY.to_string(), value);
    Ok(())
  }

  /// Whether watermarks have already been recorded, in either layout
  pub fn is_initialized(&self) -> ReleaseResult<bool> {
    Ok(!self.section()?.releases.is_empty())
  }

  fn top_level_releases(&self) -> ReleaseResult<Option<Watermarks>> {
    match self.root.get(TOP_LEVEL_RELEASES_KEY) {
      None | Some(Value::Null) => Ok(None),
      Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|e| {
        ReleaseError::message(format!("Malformed top-level \"{}\" map: {}", TOP_LEVEL_RELEASES_KEY, e))
      }),
    }
  }

  /// Registry with every repository's watermark attached
  ///
  /// This is the release precondition: a configured registry and a release
  /// entry for each of its repositories.
  pub fn registry(&self) -> ReleaseResult<Registry> {
    let section = self.section()?;
    if section.config.is_empty() {
      return Err(ReleaseError::Config(ConfigError::MissingField {
        field: format!("{}.config", SECTION_KEY),
      }));
    }

    Registry::from_descriptors(&section.config)?.with_watermarks(&section.releases)
  }

  /// Render the document (2-space indent, trailing newline)
  pub fn render(&self) -> ReleaseResult<String> {
    let mut out = serde_json::to_string_pretty(&self.root)?;
    out.push('\n');
    Ok(out)
  }

  /// Rewrite the whole document via a temp file and rename
  pub fn save(&self) -> ReleaseResult<()> {
    let content = self.render()?;

    let mut tmp_name = self
      .path
      .file_name()
      .map(|n| n.to_os_string())
      .unwrap_or_else(|| "package.json".into());
    tmp_name.push(".tmp");
    let tmp_path = self.path.with_file_name(tmp_name);

    fs::write(&tmp_path, content).map_err(|e| ReleaseError::write(&tmp_path, e))?;
    fs::rename(&tmp_path, &self.path).map_err(|e| {
      let _ = fs::remove_file(&tmp_path);
      ReleaseError::write(&self.path, e)
    })?;

    Ok(())
  }
}
