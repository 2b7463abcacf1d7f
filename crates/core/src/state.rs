//! Article state projection
//!
//! `ArticleState` is the materialized view of an article: scalar fields,
//! tag set, file set and rating, as of some revision index. It is derived
//! data; the log is the source of truth, and any `ArticleState` must be
//! reconstructible by replaying the log from empty.
//!
//! The single forward-effect rule for every entry kind lives here, in
//! [`ArticleState::apply`]. Replay (the projector), live-state maintenance
//! (the log store) and revert folding all go through it, so the three can
//! never drift apart.

use crate::error::{Error, Result};
use crate::meta::{FileDelta, RevisionMeta, TagsMeta};
use crate::types::{ArticleId, FileId, TagId, VersionId};
use crate::votes::VoteSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Materialized view of an article at a point in its history
///
/// Mutated only by folding log entries in index order via [`apply`], never
/// directly.
///
/// [`apply`]: ArticleState::apply
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArticleState {
    /// Current title
    pub title: String,
    /// Current alias (full name incl. category prefix)
    pub alias: String,
    /// Current parent display name, if any
    pub parent: Option<String>,
    /// Current parent id, if any
    pub parent_id: Option<ArticleId>,
    /// Current tag set with display names
    pub tag_set: BTreeMap<TagId, String>,
    /// Stored document version currently rendered
    pub current_version_id: Option<VersionId>,
    /// Attached files, id to current name
    pub file_set: BTreeMap<FileId, String>,
    /// Current rating aggregate
    pub rating: VoteSnapshot,
}

impl ArticleState {
    /// Fold one entry's forward effect into the state
    ///
    /// All-or-nothing per entry: on error the state is left untouched.
    ///
    /// # Errors
    /// `InconsistentHistory` when the entry contradicts the state it is
    /// folded onto (file operations on ids the state does not hold, or
    /// duplicate file ids). Indicates a corrupted log, never auto-repaired.
    pub fn apply(&mut self, meta: &RevisionMeta) -> Result<()> {
        let mut next = self.clone();
        next.apply_in_place(meta)?;
        *self = next;
        Ok(())
    }

    fn apply_in_place(&mut self, meta: &RevisionMeta) -> Result<()> {
        match meta {
            RevisionMeta::Source(m) => {
                self.current_version_id = Some(m.version_id);
            }
            RevisionMeta::Title(m) => {
                self.title = m.title.clone();
            }
            RevisionMeta::Name(m) => {
                self.alias = m.name.clone();
            }
            RevisionMeta::Tags(m) => {
                self.apply_tags(m);
            }
            RevisionMeta::New(m) => {
                self.title = m.title.clone();
                self.current_version_id = Some(m.version_id);
            }
            RevisionMeta::Parent(m) => {
                self.parent = m.parent.clone();
                self.parent_id = m.parent_id;
            }
            RevisionMeta::FileAdded(f) => {
                self.add_file(f.id, &f.name)?;
            }
            RevisionMeta::FileDeleted(f) => {
                self.remove_file(f.id)?;
            }
            RevisionMeta::FileRenamed(f) => {
                self.rename_file(f.id, &f.name)?;
            }
            RevisionMeta::VotesDeleted(snapshot) => {
                // The snapshot is retained in the entry for display; the
                // live rating resets to empty in the captured mode.
                self.rating = VoteSnapshot::empty(snapshot.rating_mode);
            }
            RevisionMeta::Wikidot => {}
            RevisionMeta::Revert(m) => {
                // A revert folds exactly like the kinds it reverted, using
                // the values captured in its own payload.
                if let Some(source) = &m.source {
                    self.current_version_id = Some(source.version_id);
                }
                if let Some(title) = &m.title {
                    self.title = title.title.clone();
                }
                if let Some(name) = &m.name {
                    self.alias = name.name.clone();
                }
                if let Some(tags) = &m.tags {
                    self.apply_tags(tags);
                }
                if let Some(parent) = &m.parent {
                    self.parent = parent.parent.clone();
                    self.parent_id = parent.parent_id;
                }
                if let Some(files) = &m.files {
                    self.apply_file_delta(files)?;
                }
                if m.votes.is_some() {
                    self.rating = VoteSnapshot::empty(self.rating.rating_mode);
                }
            }
        }
        Ok(())
    }

    fn apply_tags(&mut self, delta: &TagsMeta) {
        for tag in &delta.added_tags {
            self.tag_set.insert(tag.id, tag.name.clone());
        }
        for tag in &delta.removed_tags {
            self.tag_set.remove(&tag.id);
        }
    }

    fn apply_file_delta(&mut self, delta: &FileDelta) -> Result<()> {
        for file in &delta.added {
            self.add_file(file.id, &file.name)?;
        }
        for file in &delta.deleted {
            self.remove_file(file.id)?;
        }
        for file in &delta.renamed {
            self.rename_file(file.id, &file.name)?;
        }
        Ok(())
    }

    fn add_file(&mut self, id: FileId, name: &str) -> Result<()> {
        if self.file_set.contains_key(&id) {
            return Err(Error::InconsistentHistory(format!(
                "file {id} added twice"
            )));
        }
        self.file_set.insert(id, name.to_string());
        Ok(())
    }

    fn remove_file(&mut self, id: FileId) -> Result<()> {
        if self.file_set.remove(&id).is_none() {
            return Err(Error::InconsistentHistory(format!(
                "delete of unknown file {id}"
            )));
        }
        Ok(())
    }

    fn rename_file(&mut self, id: FileId, name: &str) -> Result<()> {
        match self.file_set.get_mut(&id) {
            Some(current) => {
                *current = name.to_string();
                Ok(())
            }
            None => Err(Error::InconsistentHistory(format!(
                "rename of unknown file {id}"
            ))),
        }
    }
}
