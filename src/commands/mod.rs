//! CLI commands for simple-release
//!
//! - **init**: register repositories and record their current heads
//! - **release**: bump, tag and publish a release with a cross-repo changelog
//! - **status**: show the version and each repository's watermark
//!
//! All commands take the `Settings` resolved once in main.rs.

pub mod init;
pub mod release;
pub mod status;

pub use init::run_init;
pub use release::run_release;
pub use status::run_status;
