//! Core types and metadata codec for the sitechanges revision log
//!
//! This crate defines the foundational types used throughout the system:
//! - ArticleId / UserId / TagId / FileId / VersionId: identifier newtypes
//! - EntryKind / RevisionMeta: closed tagged union of mutation kinds, with
//!   the codec that (de)serializes stored payload documents against it
//! - LogEntry: the immutable per-mutation record
//! - ArticleState: the derived projection, with the single forward-effect
//!   fold rule shared by replay, live maintenance and revert
//! - VoteSnapshot: immutable rating capture
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entry;
pub mod error;
pub mod meta;
pub mod state;
pub mod types;
pub mod votes;

// Re-export commonly used types
pub use entry::LogEntry;
pub use error::{Error, Result};
pub use meta::{
    decode_meta, encode_meta, EntryKind, FileDelta, FileRef, FileRename, NameMeta, NewMeta,
    ParentMeta, RevertMeta, RevisionMeta, SourceMeta, TagRef, TagsMeta, TitleMeta, ALL_KINDS,
};
pub use state::ArticleState;
pub use types::{ArticleId, FileId, TagId, UserId, VersionId};
pub use votes::{RatingMode, RatingValue, Vote, VoteSnapshot};
