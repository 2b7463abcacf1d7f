//! Projection and revert engine for the sitechanges revision log
//!
//! Three layers over the storage arena:
//! - [`Projector`]: reconstructs an article's state as of any index by
//!   folding its log forward
//! - [`RevertEngine`]: computes and appends revert entries
//! - [`RevisionLog`]: the typed recording facade callers go through

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod projector;
pub mod recorder;
pub mod revert;

pub use projector::Projector;
pub use recorder::RevisionLog;
pub use revert::RevertEngine;
