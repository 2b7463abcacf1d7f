//! Log entries
//!
//! A `LogEntry` is one immutable record of a single mutation to an article.
//! Entries are owned by the article's history collection, appended at the
//! next sequential index and never edited or deleted afterwards; any
//! correction is expressed as a new forward entry.

use crate::meta::{EntryKind, RevisionMeta};
use crate::types::{ArticleId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One immutable record of a single mutation to an article
///
/// Invariants maintained by the log store:
/// - `revision_index` values per article are exactly `0..N`, gapless;
/// - `created_at` is non-decreasing with `revision_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Subject article (opaque foreign key)
    pub article_id: ArticleId,
    /// Actor (opaque foreign key, authorized upstream)
    pub user_id: UserId,
    /// Per-article monotonic position, starting at 0 for the creation entry
    pub revision_index: u64,
    /// Tagged metadata variant; its kind is the entry type
    pub meta: RevisionMeta,
    /// When the entry was appended
    pub created_at: DateTime<Utc>,
    /// Optional free-text note from the actor
    pub comment: Option<String>,
}

impl LogEntry {
    /// The entry's kind (derived from the metadata variant)
    pub fn kind(&self) -> EntryKind {
        self.meta.kind()
    }

    /// Human-readable summary shown by the UI when `comment` is empty
    ///
    /// Uses only data carried in the entry itself; no further lookups.
    pub fn default_comment(&self) -> String {
        match &self.meta {
            RevisionMeta::Source(_) => "Edited page source".to_string(),
            RevisionMeta::Title(m) => {
                format!("Changed title from \"{}\" to \"{}\"", m.prev_title, m.title)
            }
            RevisionMeta::Name(m) => {
                format!("Renamed page from \"{}\" to \"{}\"", m.prev_name, m.name)
            }
            RevisionMeta::Tags(m) => {
                let mut parts = Vec::new();
                if !m.added_tags.is_empty() {
                    let names: Vec<&str> =
                        m.added_tags.iter().map(|t| t.name.as_str()).collect();
                    parts.push(format!("added {}", names.join(", ")));
                }
                if !m.removed_tags.is_empty() {
                    let names: Vec<&str> =
                        m.removed_tags.iter().map(|t| t.name.as_str()).collect();
                    parts.push(format!("removed {}", names.join(", ")));
                }
                if parts.is_empty() {
                    "Tags unchanged".to_string()
                } else {
                    format!("Tags changed: {}", parts.join("; "))
                }
            }
            RevisionMeta::New(_) => "Created page".to_string(),
            RevisionMeta::Parent(m) => match (&m.prev_parent, &m.parent) {
                (None, Some(new)) => format!("Set parent to \"{new}\""),
                (Some(old), None) => format!("Removed parent \"{old}\""),
                (Some(old), Some(new)) => {
                    format!("Changed parent from \"{old}\" to \"{new}\"")
                }
                (None, None) => "Parent unchanged".to_string(),
            },
            RevisionMeta::FileAdded(f) => format!("Added file \"{}\"", f.name),
            RevisionMeta::FileDeleted(f) => format!("Deleted file \"{}\"", f.name),
            RevisionMeta::FileRenamed(f) => {
                format!("Renamed file \"{}\" to \"{}\"", f.prev_name, f.name)
            }
            RevisionMeta::VotesDeleted(snapshot) => {
                format!("Deleted {} votes", snapshot.votes_count)
            }
            RevisionMeta::Wikidot => "Imported from Wikidot".to_string(),
            RevisionMeta::Revert(m) => format!("Reverted to revision {}", m.rev_number),
        }
    }
}
