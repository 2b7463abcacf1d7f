//! Typed recording facade
//!
//! `RevisionLog` is the front door for everything that mutates an article's
//! history. Each `record_*` method builds the correctly shaped metadata for
//! one entry kind inside the article's critical section, so callers cannot
//! append a payload that mismatches its kind and `prev_*` values cannot go
//! stale between read and append.
//!
//! Consistency guards run at record time against the live state (renaming a
//! file that is not attached is rejected here, not discovered at replay),
//! mirroring the checks the log fold itself enforces.

use crate::projector::Projector;
use crate::revert::RevertEngine;
use sitechanges_core::{
    ArticleId, ArticleState, EntryKind, Error, FileId, FileRef, FileRename, LogEntry, NameMeta,
    NewMeta, ParentMeta, Result, RevisionMeta, SourceMeta, TagRef, TagsMeta, TitleMeta, UserId,
    VersionId, VoteSnapshot,
};
use sitechanges_storage::LogStore;
use std::sync::Arc;

/// High-level interface to one store's revision logs
///
/// # Example
///
/// ```
/// use sitechanges_engine::RevisionLog;
/// use sitechanges_core::{ArticleId, UserId, VersionId, EntryKind};
///
/// let log = RevisionLog::new();
/// let article = ArticleId::new();
/// let editor = UserId::new();
///
/// log.create(article, editor, VersionId(1), "A", None).unwrap();
/// log.record_title(article, editor, "B", None).unwrap();
/// assert_eq!(log.current_state(article).unwrap().title, "B");
///
/// // Undo is a forward entry, not history editing.
/// log.revert(article, 0, &[EntryKind::Title], editor, None).unwrap();
/// assert_eq!(log.current_state(article).unwrap().title, "A");
/// assert_eq!(log.head_index(article), Some(2));
/// ```
#[derive(Clone)]
pub struct RevisionLog {
    store: Arc<LogStore>,
    projector: Projector,
    revert_engine: RevertEngine,
}

impl Default for RevisionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl RevisionLog {
    /// Create a revision log over a fresh in-memory store
    pub fn new() -> Self {
        Self::with_store(Arc::new(LogStore::new()))
    }

    /// Create a revision log over an existing store
    pub fn with_store(store: Arc<LogStore>) -> Self {
        let projector = Projector::new(store.clone());
        let revert_engine = RevertEngine::new(store.clone());
        Self {
            store,
            projector,
            revert_engine,
        }
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<LogStore> {
        &self.store
    }

    fn require_created(
        article_id: ArticleId,
        head: Option<u64>,
    ) -> Result<()> {
        match head {
            Some(_) => Ok(()),
            None => Err(Error::UnknownRevisionIndex {
                article_id,
                index: 0,
                head: None,
            }),
        }
    }

    // ========== Recording ==========

    /// Record the creation entry (`New`), index 0 of every article
    pub fn create(
        &self,
        article_id: ArticleId,
        user_id: UserId,
        version_id: VersionId,
        title: &str,
        comment: Option<String>,
    ) -> Result<LogEntry> {
        self.store.append_with(article_id, user_id, comment, |head, _| {
            if head.is_some() {
                return Err(Error::InconsistentHistory(format!(
                    "article {article_id} already has a creation entry"
                )));
            }
            Ok(RevisionMeta::New(NewMeta {
                version_id,
                title: title.to_string(),
            }))
        })
    }

    /// Record a new stored source version
    pub fn record_source(
        &self,
        article_id: ArticleId,
        user_id: UserId,
        version_id: VersionId,
        comment: Option<String>,
    ) -> Result<LogEntry> {
        self.store.append_with(article_id, user_id, comment, |head, _| {
            Self::require_created(article_id, head)?;
            Ok(RevisionMeta::Source(SourceMeta { version_id }))
        })
    }

    /// Record a title change; the previous title is captured from live state
    pub fn record_title(
        &self,
        article_id: ArticleId,
        user_id: UserId,
        title: &str,
        comment: Option<String>,
    ) -> Result<LogEntry> {
        self.store.append_with(article_id, user_id, comment, |head, state| {
            Self::require_created(article_id, head)?;
            Ok(RevisionMeta::Title(TitleMeta {
                title: title.to_string(),
                prev_title: state.title.clone(),
            }))
        })
    }

    /// Record an alias change
    pub fn record_name(
        &self,
        article_id: ArticleId,
        user_id: UserId,
        name: &str,
        comment: Option<String>,
    ) -> Result<LogEntry> {
        self.store.append_with(article_id, user_id, comment, |head, state| {
            Self::require_created(article_id, head)?;
            Ok(RevisionMeta::Name(NameMeta {
                name: name.to_string(),
                prev_name: state.alias.clone(),
            }))
        })
    }

    /// Record a tag change toward the desired full tag set
    ///
    /// The entry carries the delta against the live set; tags already
    /// present are untouched. An unchanged set records an empty delta.
    pub fn record_tags(
        &self,
        article_id: ArticleId,
        user_id: UserId,
        tags: &[TagRef],
        comment: Option<String>,
    ) -> Result<LogEntry> {
        self.store.append_with(article_id, user_id, comment, |head, state| {
            Self::require_created(article_id, head)?;
            Ok(RevisionMeta::Tags(desired_tag_delta(state, tags)))
        })
    }

    /// Record a parent change; `parent` is `(id, display_name)` or `None`
    pub fn record_parent(
        &self,
        article_id: ArticleId,
        user_id: UserId,
        parent: Option<(ArticleId, String)>,
        comment: Option<String>,
    ) -> Result<LogEntry> {
        self.store.append_with(article_id, user_id, comment, |head, state| {
            Self::require_created(article_id, head)?;
            let (parent_id, parent_name) = match parent {
                Some((id, name)) => (Some(id), Some(name)),
                None => (None, None),
            };
            Ok(RevisionMeta::Parent(ParentMeta {
                parent: parent_name,
                prev_parent: state.parent.clone(),
                parent_id,
                prev_parent_id: state.parent_id,
            }))
        })
    }

    /// Record a file attachment
    pub fn record_file_added(
        &self,
        article_id: ArticleId,
        user_id: UserId,
        file_id: FileId,
        name: &str,
        comment: Option<String>,
    ) -> Result<LogEntry> {
        self.store.append_with(article_id, user_id, comment, |head, state| {
            Self::require_created(article_id, head)?;
            if state.file_set.contains_key(&file_id) {
                return Err(Error::InconsistentHistory(format!(
                    "file {file_id} is already attached"
                )));
            }
            Ok(RevisionMeta::FileAdded(FileRef {
                id: file_id,
                name: name.to_string(),
            }))
        })
    }

    /// Record a file deletion; the name is captured from live state
    pub fn record_file_deleted(
        &self,
        article_id: ArticleId,
        user_id: UserId,
        file_id: FileId,
        comment: Option<String>,
    ) -> Result<LogEntry> {
        self.store.append_with(article_id, user_id, comment, |head, state| {
            Self::require_created(article_id, head)?;
            let name = state.file_set.get(&file_id).ok_or_else(|| {
                Error::InconsistentHistory(format!("file {file_id} is not attached"))
            })?;
            Ok(RevisionMeta::FileDeleted(FileRef {
                id: file_id,
                name: name.clone(),
            }))
        })
    }

    /// Record a file rename; the previous name is captured from live state
    pub fn record_file_renamed(
        &self,
        article_id: ArticleId,
        user_id: UserId,
        file_id: FileId,
        name: &str,
        comment: Option<String>,
    ) -> Result<LogEntry> {
        self.store.append_with(article_id, user_id, comment, |head, state| {
            Self::require_created(article_id, head)?;
            let prev_name = state.file_set.get(&file_id).ok_or_else(|| {
                Error::InconsistentHistory(format!("file {file_id} is not attached"))
            })?;
            Ok(RevisionMeta::FileRenamed(FileRename {
                id: file_id,
                name: name.to_string(),
                prev_name: prev_name.clone(),
            }))
        })
    }

    /// Record a vote deletion, embedding the discarded snapshot
    ///
    /// # Errors
    /// `SchemaViolation` if the snapshot carries a non-finite float; JSON
    /// cannot store one losslessly, so it is rejected before it can enter
    /// the log.
    pub fn record_votes_deleted(
        &self,
        article_id: ArticleId,
        user_id: UserId,
        snapshot: VoteSnapshot,
        comment: Option<String>,
    ) -> Result<LogEntry> {
        if !snapshot.is_finite() {
            return Err(Error::SchemaViolation {
                kind: EntryKind::VotesDeleted,
                reason: "non-finite float in vote snapshot".to_string(),
            });
        }
        self.store.append_with(article_id, user_id, comment, |head, _| {
            Self::require_created(article_id, head)?;
            Ok(RevisionMeta::VotesDeleted(snapshot))
        })
    }

    /// Record a historical-import marker
    pub fn record_wikidot(
        &self,
        article_id: ArticleId,
        user_id: UserId,
        comment: Option<String>,
    ) -> Result<LogEntry> {
        self.store.append_with(article_id, user_id, comment, |head, _| {
            Self::require_created(article_id, head)?;
            Ok(RevisionMeta::Wikidot)
        })
    }

    /// Revert the requested subtypes to their values at `target_index`
    ///
    /// See [`RevertEngine::revert`].
    pub fn revert(
        &self,
        article_id: ArticleId,
        target_index: u64,
        subtypes: &[EntryKind],
        actor: UserId,
        comment: Option<String>,
    ) -> Result<LogEntry> {
        self.revert_engine
            .revert(article_id, target_index, subtypes, actor, comment)
    }

    // ========== Reads ==========

    /// The article's state as of `up_to_index`
    pub fn project(&self, article_id: ArticleId, up_to_index: u64) -> Result<ArticleState> {
        self.projector.project(article_id, up_to_index)
    }

    /// The article's current materialized state
    pub fn current_state(&self, article_id: ArticleId) -> Result<ArticleState> {
        self.projector.current(article_id)
    }

    /// Highest recorded index, if the article exists
    pub fn head_index(&self, article_id: ArticleId) -> Option<u64> {
        self.store.head_index(article_id)
    }

    /// One entry by revision index
    pub fn entry(&self, article_id: ArticleId, index: u64) -> Result<LogEntry> {
        self.store.entry(article_id, index)
    }

    /// Newest-first page of the article's log plus the total count
    pub fn log_entries_paged(
        &self,
        article_id: ArticleId,
        from: usize,
        to: usize,
        all: bool,
    ) -> (Vec<LogEntry>, u64) {
        self.store.entries_paged(article_id, from, to, all)
    }
}

/// Delta between the live tag set and the caller's desired full set
fn desired_tag_delta(state: &ArticleState, desired: &[TagRef]) -> TagsMeta {
    let added_tags = desired
        .iter()
        .filter(|t| !state.tag_set.contains_key(&t.id))
        .cloned()
        .collect();
    let removed_tags = state
        .tag_set
        .iter()
        .filter(|(id, _)| !desired.iter().any(|t| t.id == **id))
        .map(|(&id, name)| TagRef {
            id,
            name: name.clone(),
        })
        .collect();
    TagsMeta {
        added_tags,
        removed_tags,
    }
}
