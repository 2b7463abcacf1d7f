//! Error types for the revision log
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! The taxonomy separates three situations a caller must handle differently.
//! Data problems (`SchemaViolation`, `UnknownEntryType`, `InconsistentHistory`,
//! `UnknownRevisionIndex`) are surfaced and never silently coerced or
//! auto-repaired. Caller misuse (`NonRevertibleType`, `EmptySubtypeSet`) is
//! rejected outright. Expected races (`ConcurrentHeadMismatch`) are recovered
//! by retrying with a freshly computed delta.

use crate::meta::EntryKind;
use crate::types::ArticleId;
use thiserror::Error;

/// Result type alias for revision log operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the revision log
#[derive(Debug, Error)]
pub enum Error {
    /// A metadata payload is malformed or does not match its declared kind
    #[error("schema violation for {kind:?} payload: {reason}")]
    SchemaViolation {
        /// Declared entry kind the payload was decoded against
        kind: EntryKind,
        /// What failed to decode
        reason: String,
    },

    /// An entry type tag outside the closed set of kinds
    #[error("unknown entry type tag: {0:?}")]
    UnknownEntryType(String),

    /// A revision index that does not exist for the article
    #[error("unknown revision index {index} for article {article_id} (head: {head:?})")]
    UnknownRevisionIndex {
        /// Article whose log was addressed
        article_id: ArticleId,
        /// The index that was requested
        index: u64,
        /// Highest recorded index, if the article has any entries
        head: Option<u64>,
    },

    /// The log contradicts itself (e.g. renaming a file that was never added)
    ///
    /// Indicates corruption; surfaced as fatal for that article's operation
    /// and never auto-repaired.
    #[error("inconsistent history: {0}")]
    InconsistentHistory(String),

    /// A revert was requested for a kind that cannot be reverted
    #[error("entry kind {0:?} is not revertible")]
    NonRevertibleType(EntryKind),

    /// A revert was requested with no subtypes
    #[error("revert requires at least one subtype")]
    EmptySubtypeSet,

    /// The article's head index advanced between snapshot and append
    ///
    /// An expected race; the caller retries with a recomputed delta.
    #[error("concurrent head mismatch: expected {expected:?}, actual {actual:?}")]
    ConcurrentHeadMismatch {
        /// Head index the caller computed its delta against
        expected: Option<u64>,
        /// Head index found at append time
        actual: Option<u64>,
    },
}
