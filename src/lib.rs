//! Cachet - Incremental precache manifest engine
//!
//! Builds content-hashed precache manifests from a project's build
//! output, diffs them against the previous snapshot, cascades changes
//! through a route dependency graph, and picks an update strategy for
//! the service worker to stage.

pub mod bounds;
pub mod cli;
pub mod config;
pub mod detect;
pub mod error;
pub mod graph;
pub mod hasher;
pub mod integrity;
pub mod manifest;
pub mod pipeline;
pub mod scan;
pub mod sync;
pub mod ui;
pub mod version;

pub use error::{CachetError, CachetResult};
