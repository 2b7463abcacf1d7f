//! Per-article append-only log arena for sitechanges
//!
//! The storage layer owns the history collections: one ordered, immutable
//! entry sequence per article plus the materialized `ArticleState` cache,
//! both behind one per-article lock. It provides the two write primitives
//! the engine builds on (`append_with` for ordinary edits,
//! `compare_and_append` for reverts) and ordered/paged read access.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod log_store;

pub use log_store::LogStore;
