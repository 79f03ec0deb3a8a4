//! Core building blocks shared by every command
//!
//! - **config**: Run settings resolved from flags and environment
//! - **error**: Error types with contextual help messages
//! - **vcs**: Git operations abstraction (SystemGit)

pub mod config;
pub mod error;
pub mod vcs;
