//! Cross-repository release bookkeeping
//!
//! A project tracks one main repository and any number of dependents. Each
//! release:
//!
//! 1. fetches every repository's commits since its watermark
//! 2. drops the watermark commit and this tool's own bookkeeping commits
//! 3. bumps the main project's version, then commits, tags and pushes it
//! 4. creates a hosted release whose body is the changelog
//! 5. records each repository's newest commit as its next watermark
//!
//! Registry and watermarks live in the main repository's package.json
//! (see [`state`]) and are read fresh on every run.

pub mod changelog;
pub mod fetch;
pub mod filter;
pub mod pipeline;
pub mod registry;
pub mod state;
pub mod version;
