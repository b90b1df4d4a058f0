//! crawl benchmarking suite
//!
//! Benchmarks for version selection, registry document parsing and the
//! concurrent traversal, run against synthetic in-memory registries.

pub mod common;
pub mod fixtures;

pub use common::*;
