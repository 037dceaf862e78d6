//! Library-level pipeline tests
//!
//! These drive `SyncPipeline` directly with scripted approvers and stub
//! validators, so every decision path can be exercised without a terminal
//! or a Swift toolchain.

pub mod safety_tests;
pub mod sync_tests;
