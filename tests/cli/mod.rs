//! CLI command integration tests
//!
//! These run the `meshcore-sync` binary against fixture workspaces. Sync
//! tests use `--source-dir` so no network access is needed.

pub mod extract_tests;
pub mod sync_tests;
