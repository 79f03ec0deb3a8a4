//! Progress indicator for the per-repository fetch fan-out
//!
//! Uses `linya`, whose bars can be driven from rayon workers behind a
//! mutex. Drawing only happens when stderr is a terminal so piped output
//! and CI logs stay clean.

use linya::{Bar, Progress};
use std::io::IsTerminal;
use std::sync::Mutex;

/// Thread-safe progress bar, one tick per repository
pub struct FetchProgress {
  inner: Option<(Mutex<Progress>, Bar)>,
}

impl FetchProgress {
  /// Bar with `total` steps, hidden when stderr is not a terminal
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    if total == 0 || !std::io::stderr().is_terminal() {
      return Self::hidden();
    }

    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self {
      inner: Some((Mutex::new(progress), bar)),
    }
  }

  /// A progress indicator that never draws
  pub fn hidden() -> Self {
    Self { inner: None }
  }

  /// Advance by one step (safe to call from worker threads)
  pub fn inc(&self) {
    if let Some((progress, bar)) = &self.inner
      && let Ok(mut progress) = progress.lock()
    {
      progress.inc_and_draw(bar, 1);
    }
  }
}
