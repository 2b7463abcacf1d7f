//! Article state projector
//!
//! Reconstructs the state of an article as of any recorded revision index by
//! folding its log forward from empty. Replay is deterministic: the same log
//! always yields the same `ArticleState`.
//!
//! The live materialized state the store maintains is a cache of the same
//! fold; `project` at the head index must always equal it.

use sitechanges_core::{ArticleId, ArticleState, Error, Result};
use sitechanges_storage::LogStore;
use std::sync::Arc;
use tracing::warn;

/// Read-side projection over a [`LogStore`]
///
/// Cheap to clone; safe to run concurrently with writers (each fold reads a
/// consistent snapshot of the article's log).
#[derive(Clone)]
pub struct Projector {
    store: Arc<LogStore>,
}

impl Projector {
    /// Create a projector over a store
    pub fn new(store: Arc<LogStore>) -> Self {
        Self { store }
    }

    /// Reconstruct the article's state as of `up_to_index`
    ///
    /// Folds every entry with `revision_index <= up_to_index` in ascending
    /// order.
    ///
    /// # Errors
    /// `UnknownRevisionIndex` if `up_to_index` exceeds the article's head;
    /// `InconsistentHistory` if replay hits an entry that contradicts the
    /// folded state (corrupted log, surfaced for operator attention).
    pub fn project(&self, article_id: ArticleId, up_to_index: u64) -> Result<ArticleState> {
        let entries = self.store.entries_up_to(article_id, up_to_index)?;
        let mut state = ArticleState::default();
        for entry in &entries {
            if let Err(e) = state.apply(&entry.meta) {
                warn!(
                    target: "sitechanges::projector",
                    article_id = %article_id,
                    revision_index = entry.revision_index,
                    error = %e,
                    "log replay failed; history is corrupted"
                );
                return Err(e);
            }
        }
        Ok(state)
    }

    /// The article's current state (materialized cache)
    ///
    /// # Errors
    /// `UnknownRevisionIndex` if the article has no entries.
    pub fn current(&self, article_id: ArticleId) -> Result<ArticleState> {
        self.store
            .current_state(article_id)
            .ok_or(Error::UnknownRevisionIndex {
                article_id,
                index: 0,
                head: None,
            })
    }
}
