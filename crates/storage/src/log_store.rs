//! Per-article append-only log arena
//!
//! ## Design
//!
//! - DashMap keyed by `ArticleId`: different articles never contend.
//! - One `RwLock<ArticleLog>` per article: all appends for an article
//!   serialize through its write lock, so `revision_index` assignment is
//!   race-free and gapless. The entry vector's position IS the revision
//!   index, so gaplessness is structural, not checked.
//! - The materialized `ArticleState` lives in the same lock as the entry
//!   vector and is updated in the same critical section as the append.
//!   A reader holding the read lock can never observe a partially-written
//!   entry or a state that disagrees with the log.
//! - `compare_and_append` is the transactional compare-and-append the
//!   revert engine builds on: the caller names the head index it computed
//!   its delta against, and the append fails with `ConcurrentHeadMismatch`
//!   if another writer got there first.

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use sitechanges_core::{ArticleId, ArticleState, Error, LogEntry, Result, RevisionMeta, UserId};
use std::sync::Arc;
use tracing::{debug, warn};

/// One article's ordered history plus its materialized state
#[derive(Debug, Default)]
struct ArticleLog {
    /// Entries in index order; `entries[i].revision_index == i`
    entries: Vec<LogEntry>,
    /// Materialized fold of `entries`, kept in lockstep with appends
    current: ArticleState,
}

impl ArticleLog {
    fn head_index(&self) -> Option<u64> {
        self.entries.len().checked_sub(1).map(|i| i as u64)
    }
}

/// Append-only log arena, partitioned by article
///
/// # Example
///
/// ```
/// use sitechanges_storage::LogStore;
/// use sitechanges_core::{ArticleId, UserId, RevisionMeta, NewMeta, VersionId};
///
/// let store = LogStore::new();
/// let article = ArticleId::new();
/// let actor = UserId::new();
///
/// let entry = store
///     .append_with(article, actor, None, |_head, _state| {
///         Ok(RevisionMeta::New(NewMeta {
///             version_id: VersionId(1),
///             title: "A".to_string(),
///         }))
///     })
///     .unwrap();
/// assert_eq!(entry.revision_index, 0);
/// assert_eq!(store.head_index(article), Some(0));
/// ```
#[derive(Default)]
pub struct LogStore {
    logs: DashMap<ArticleId, Arc<RwLock<ArticleLog>>>,
}

impl LogStore {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    fn log_for(&self, article_id: ArticleId) -> Arc<RwLock<ArticleLog>> {
        self.logs.entry(article_id).or_default().clone()
    }

    fn existing(&self, article_id: ArticleId) -> Option<Arc<RwLock<ArticleLog>>> {
        self.logs.get(&article_id).map(|l| l.clone())
    }

    // ========== Append ==========

    /// Append an entry, building its metadata against the live state
    ///
    /// The `build` closure runs inside the article's exclusive critical
    /// section and receives the current head index and materialized state,
    /// so `prev_*` values it captures cannot go stale before the append.
    /// Append and state update commit together; if the closure or the fold
    /// fails, nothing is written.
    pub fn append_with<F>(
        &self,
        article_id: ArticleId,
        user_id: UserId,
        comment: Option<String>,
        build: F,
    ) -> Result<LogEntry>
    where
        F: FnOnce(Option<u64>, &ArticleState) -> Result<RevisionMeta>,
    {
        let log = self.log_for(article_id);
        let mut guard = log.write();

        let meta = build(guard.head_index(), &guard.current)?;
        Self::append_locked(&mut guard, article_id, user_id, meta, comment)
    }

    /// Append an entry only if the head index is still `expected_head`
    ///
    /// # Errors
    /// `ConcurrentHeadMismatch` if another append won the race since the
    /// caller snapshotted the head. The caller retries with a freshly
    /// computed delta; blind retry with the stale metadata is not valid.
    pub fn compare_and_append(
        &self,
        article_id: ArticleId,
        expected_head: Option<u64>,
        user_id: UserId,
        meta: RevisionMeta,
        comment: Option<String>,
    ) -> Result<LogEntry> {
        let log = self.log_for(article_id);
        let mut guard = log.write();

        let actual = guard.head_index();
        if actual != expected_head {
            debug!(
                target: "sitechanges::log",
                article_id = %article_id,
                expected = ?expected_head,
                actual = ?actual,
                "compare_and_append lost the race"
            );
            return Err(Error::ConcurrentHeadMismatch {
                expected: expected_head,
                actual,
            });
        }

        Self::append_locked(&mut guard, article_id, user_id, meta, comment)
    }

    fn append_locked(
        guard: &mut ArticleLog,
        article_id: ArticleId,
        user_id: UserId,
        meta: RevisionMeta,
        comment: Option<String>,
    ) -> Result<LogEntry> {
        // Fold first: a rejected fold must not leave a half-written entry.
        if let Err(e) = guard.current.apply(&meta) {
            warn!(
                target: "sitechanges::log",
                article_id = %article_id,
                error = %e,
                "rejected append that contradicts article state"
            );
            return Err(e);
        }

        let revision_index = guard.entries.len() as u64;

        // created_at is non-decreasing with revision_index even if the
        // wall clock steps backwards between appends.
        let mut created_at = Utc::now();
        if let Some(last) = guard.entries.last() {
            created_at = created_at.max(last.created_at);
        }

        let entry = LogEntry {
            article_id,
            user_id,
            revision_index,
            meta,
            created_at,
            comment,
        };
        guard.entries.push(entry.clone());

        debug!(
            target: "sitechanges::log",
            article_id = %article_id,
            revision_index,
            kind = %entry.kind(),
            "appended log entry"
        );
        Ok(entry)
    }

    // ========== Reads ==========
    //
    // A slot whose first append failed stays in the map but holds no
    // entries; every read treats it the same as an absent article.

    /// Highest recorded index for an article, if it has any entries
    pub fn head_index(&self, article_id: ArticleId) -> Option<u64> {
        self.existing(article_id)
            .and_then(|log| log.read().head_index())
    }

    /// Number of entries for an article
    pub fn len(&self, article_id: ArticleId) -> u64 {
        self.existing(article_id)
            .map(|log| log.read().entries.len() as u64)
            .unwrap_or(0)
    }

    /// Whether the article has no entries
    pub fn is_empty(&self, article_id: ArticleId) -> bool {
        self.len(article_id) == 0
    }

    /// Read a single entry by revision index
    pub fn entry(&self, article_id: ArticleId, index: u64) -> Result<LogEntry> {
        let log = self
            .existing(article_id)
            .ok_or(Error::UnknownRevisionIndex {
                article_id,
                index,
                head: None,
            })?;
        let guard = log.read();
        guard
            .entries
            .get(index as usize)
            .cloned()
            .ok_or(Error::UnknownRevisionIndex {
                article_id,
                index,
                head: guard.head_index(),
            })
    }

    /// Read all entries with `revision_index <= up_to`, in ascending order
    ///
    /// # Errors
    /// `UnknownRevisionIndex` if `up_to` exceeds the article's head.
    pub fn entries_up_to(&self, article_id: ArticleId, up_to: u64) -> Result<Vec<LogEntry>> {
        let log = self
            .existing(article_id)
            .ok_or(Error::UnknownRevisionIndex {
                article_id,
                index: up_to,
                head: None,
            })?;
        let guard = log.read();
        let head = guard.head_index();
        if head.map_or(true, |h| up_to > h) {
            return Err(Error::UnknownRevisionIndex {
                article_id,
                index: up_to,
                head,
            });
        }
        Ok(guard.entries[..=up_to as usize].to_vec())
    }

    /// Newest-first page of entries plus the total count
    ///
    /// `from`/`to` address the newest-first listing (`from = 0` is the head
    /// entry); `all` ignores the window and returns everything. Out-of-range
    /// windows clamp to the available entries.
    pub fn entries_paged(
        &self,
        article_id: ArticleId,
        from: usize,
        to: usize,
        all: bool,
    ) -> (Vec<LogEntry>, u64) {
        let Some(log) = self.existing(article_id) else {
            return (Vec::new(), 0);
        };
        let guard = log.read();
        let total = guard.entries.len() as u64;

        let newest_first = guard.entries.iter().rev();
        let page: Vec<LogEntry> = if all {
            newest_first.cloned().collect()
        } else if from >= to {
            Vec::new()
        } else {
            newest_first.skip(from).take(to - from).cloned().collect()
        };
        (page, total)
    }

    /// Clone of the materialized current state, if the article exists
    ///
    /// Always equal to folding the article's entries from empty; the two are
    /// updated in one critical section.
    pub fn current_state(&self, article_id: ArticleId) -> Option<ArticleState> {
        self.existing(article_id).and_then(|log| {
            let guard = log.read();
            if guard.entries.is_empty() {
                None
            } else {
                Some(guard.current.clone())
            }
        })
    }
}
