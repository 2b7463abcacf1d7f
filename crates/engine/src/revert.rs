//! Revert engine
//!
//! ## Design
//!
//! A revert is never destructive: it is a new forward entry at the next
//! index whose payload snapshots the concrete post-revert values for each
//! reverted subtype. Later replay folds the `Revert` entry from its own
//! payload and never re-resolves historical state ("revert-as-fold", not
//! "revert-as-pointer").
//!
//! ## Algorithm
//!
//! 1. Validate the subtype set and target index.
//! 2. Project the article at its head (live state) and at the target.
//! 3. Per requested subtype, compute the delta that moves the live fields
//!    back to their target values.
//! 4. Assemble one `Revert` entry carrying the deltas.
//! 5. Compare-and-append at the snapshotted head; a racing writer surfaces
//!    as `ConcurrentHeadMismatch` and the caller recomputes.
//! 6. The store folds the entry into the live state in the same critical
//!    section as the append.

use crate::projector::Projector;
use sitechanges_core::{
    ArticleId, ArticleState, EntryKind, Error, FileDelta, FileRef, FileRename, LogEntry, NameMeta,
    ParentMeta, Result, RevertMeta, RevisionMeta, SourceMeta, TagRef, TagsMeta, TitleMeta, UserId,
};
use sitechanges_storage::LogStore;
use std::sync::Arc;
use tracing::info;

/// Computes and appends revert entries
#[derive(Clone)]
pub struct RevertEngine {
    store: Arc<LogStore>,
    projector: Projector,
}

impl RevertEngine {
    /// Create a revert engine over a store
    pub fn new(store: Arc<LogStore>) -> Self {
        let projector = Projector::new(store.clone());
        Self { store, projector }
    }

    /// Revert the requested subtypes to their values at `target_index`
    ///
    /// Appends one `Revert` entry and applies it to the live state. If the
    /// article was already in the target state for a subtype, the entry
    /// still records an identity delta for it (re-reverting is a logged
    /// no-op, not an error).
    ///
    /// # Errors
    /// - `EmptySubtypeSet` if no subtypes are requested
    /// - `NonRevertibleType` for `New`, `Wikidot` or `Revert` subtypes
    /// - `UnknownRevisionIndex` if `target_index` does not exist or is not
    ///   strictly below the article's head
    /// - `ConcurrentHeadMismatch` if another append raced in; retry with a
    ///   fresh call, never with the stale delta
    pub fn revert(
        &self,
        article_id: ArticleId,
        target_index: u64,
        subtypes: &[EntryKind],
        actor: UserId,
        comment: Option<String>,
    ) -> Result<LogEntry> {
        if subtypes.is_empty() {
            return Err(Error::EmptySubtypeSet);
        }
        if let Some(kind) = subtypes.iter().find(|k| !k.is_revertible()) {
            return Err(Error::NonRevertibleType(*kind));
        }

        let head = self
            .store
            .head_index(article_id)
            .ok_or(Error::UnknownRevisionIndex {
                article_id,
                index: target_index,
                head: None,
            })?;
        // The target must be a real prior revision, strictly below the head.
        if target_index >= head {
            return Err(Error::UnknownRevisionIndex {
                article_id,
                index: target_index,
                head: Some(head),
            });
        }

        let state_before = self.projector.project(article_id, head)?;
        let state_at_target = self.projector.project(article_id, target_index)?;

        let meta = compute_revert(target_index, subtypes, &state_before, &state_at_target)?;

        let entry = self.store.compare_and_append(
            article_id,
            Some(head),
            actor,
            RevisionMeta::Revert(meta),
            comment,
        )?;

        info!(
            target: "sitechanges::revert",
            article_id = %article_id,
            target_index,
            revision_index = entry.revision_index,
            "reverted article"
        );
        Ok(entry)
    }
}

/// Compute the revert payload moving `before`'s requested fields back to
/// their values in `target`
fn compute_revert(
    target_index: u64,
    subtypes: &[EntryKind],
    before: &ArticleState,
    target: &ArticleState,
) -> Result<RevertMeta> {
    let mut meta = RevertMeta {
        subtypes: Vec::new(),
        rev_number: target_index,
        source: None,
        title: None,
        name: None,
        tags: None,
        parent: None,
        files: None,
        votes: None,
    };

    for &subtype in subtypes {
        // Duplicate requests collapse to one sub-object.
        if !meta.subtypes.contains(&subtype) {
            meta.subtypes.push(subtype);
        }
        match subtype {
            EntryKind::Source => {
                let version_id =
                    target
                        .current_version_id
                        .ok_or_else(|| Error::InconsistentHistory(
                            "no source version at revert target".to_string(),
                        ))?;
                meta.source = Some(SourceMeta { version_id });
            }
            EntryKind::Title => {
                meta.title = Some(TitleMeta {
                    title: target.title.clone(),
                    prev_title: before.title.clone(),
                });
            }
            EntryKind::Name => {
                meta.name = Some(NameMeta {
                    name: target.alias.clone(),
                    prev_name: before.alias.clone(),
                });
            }
            EntryKind::Tags => {
                meta.tags = Some(tag_delta(before, target));
            }
            EntryKind::Parent => {
                meta.parent = Some(ParentMeta {
                    parent: target.parent.clone(),
                    prev_parent: before.parent.clone(),
                    parent_id: target.parent_id,
                    prev_parent_id: before.parent_id,
                });
            }
            EntryKind::FileAdded | EntryKind::FileDeleted | EntryKind::FileRenamed => {
                if meta.files.is_none() {
                    meta.files = Some(file_delta(before, target));
                }
            }
            EntryKind::VotesDeleted => {
                // Capture the live snapshot being discarded, symmetric to
                // VotesDeleted; audit data, not a replayable ledger.
                meta.votes = Some(before.rating.clone());
            }
            EntryKind::New | EntryKind::Wikidot | EntryKind::Revert => {
                return Err(Error::NonRevertibleType(subtype));
            }
        }
    }

    Ok(meta)
}

/// Tags present at the target but absent now are added back; tags present
/// now but absent at the target are removed.
fn tag_delta(before: &ArticleState, target: &ArticleState) -> TagsMeta {
    let added_tags = target
        .tag_set
        .iter()
        .filter(|(id, _)| !before.tag_set.contains_key(id))
        .map(|(&id, name)| TagRef {
            id,
            name: name.clone(),
        })
        .collect();
    let removed_tags = before
        .tag_set
        .iter()
        .filter(|(id, _)| !target.tag_set.contains_key(id))
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

/// Membership and name diff of the file sets between now and the target
fn file_delta(before: &ArticleState, target: &ArticleState) -> FileDelta {
    let mut delta = FileDelta::default();
    for (&id, name) in &target.file_set {
        match before.file_set.get(&id) {
            None => delta.added.push(FileRef {
                id,
                name: name.clone(),
            }),
            Some(current) if current != name => delta.renamed.push(FileRename {
                id,
                name: name.clone(),
                prev_name: current.clone(),
            }),
            Some(_) => {}
        }
    }
    for (&id, name) in &before.file_set {
        if !target.file_set.contains_key(&id) {
            delta.deleted.push(FileRef {
                id,
                name: name.clone(),
            });
        }
    }
    delta
}
