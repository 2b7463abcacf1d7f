//! Revision metadata codec
//!
//! ## Design Principles
//!
//! 1. **Closed tagged union**: `EntryKind` + `RevisionMeta` form a closed sum
//!    type with one case per mutation kind. Every place that must handle all
//!    kinds (codec, projector, revert engine) gets exhaustiveness checking.
//!
//! 2. **Tag stored alongside**: the persisted representation is a
//!    self-describing JSON document plus the `EntryKind` tag stored next to
//!    it. The tag fully determines which variant to decode; payload shape is
//!    never sniffed.
//!
//! 3. **Strict both ways**: a payload missing a required field, carrying a
//!    mistyped one, or carrying fields its declared kind does not define,
//!    fails with `SchemaViolation`. A tag outside the closed set fails with
//!    `UnknownEntryType`. Encoding rejects values that cannot survive a JSON
//!    round trip (non-finite floats). Nothing is silently coerced.
//!
//! ## Wire tags
//!
//! These strings are part of the stored format and MUST NOT change:
//! `source`, `title`, `name`, `tags`, `new`, `parent`, `file_added`,
//! `file_deleted`, `file_renamed`, `votes_deleted`, `wikidot`, `revert`.

use crate::error::{Error, Result};
use crate::types::{ArticleId, FileId, TagId, VersionId};
use crate::votes::VoteSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of mutation kinds recorded in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// New source version stored for the article
    Source,
    /// Title changed
    Title,
    /// Alias (full name incl. category prefix) changed
    Name,
    /// Tags added and/or removed
    Tags,
    /// Creation marker; first entry of every article
    New,
    /// Parent article changed
    Parent,
    /// File attached
    FileAdded,
    /// File detached
    FileDeleted,
    /// Attached file renamed
    FileRenamed,
    /// All votes deleted; entry embeds the discarded snapshot
    VotesDeleted,
    /// Historical-import marker; no functional effect
    Wikidot,
    /// Composite entry reversing earlier entries
    Revert,
}

/// All kinds, in declaration order
pub const ALL_KINDS: [EntryKind; 12] = [
    EntryKind::Source,
    EntryKind::Title,
    EntryKind::Name,
    EntryKind::Tags,
    EntryKind::New,
    EntryKind::Parent,
    EntryKind::FileAdded,
    EntryKind::FileDeleted,
    EntryKind::FileRenamed,
    EntryKind::VotesDeleted,
    EntryKind::Wikidot,
    EntryKind::Revert,
];

impl EntryKind {
    /// Stable string tag stored alongside the payload document
    pub fn as_tag(&self) -> &'static str {
        match self {
            EntryKind::Source => "source",
            EntryKind::Title => "title",
            EntryKind::Name => "name",
            EntryKind::Tags => "tags",
            EntryKind::New => "new",
            EntryKind::Parent => "parent",
            EntryKind::FileAdded => "file_added",
            EntryKind::FileDeleted => "file_deleted",
            EntryKind::FileRenamed => "file_renamed",
            EntryKind::VotesDeleted => "votes_deleted",
            EntryKind::Wikidot => "wikidot",
            EntryKind::Revert => "revert",
        }
    }

    /// Resolve a stored tag back to a kind
    ///
    /// # Errors
    /// `UnknownEntryType` if the tag is outside the closed set.
    pub fn from_tag(tag: &str) -> Result<Self> {
        ALL_KINDS
            .iter()
            .copied()
            .find(|k| k.as_tag() == tag)
            .ok_or_else(|| Error::UnknownEntryType(tag.to_string()))
    }

    /// Whether this kind may appear in a revert's subtype set
    ///
    /// `New` is the terminal creation marker, `Wikidot` is a historical
    /// import marker, and reverting a `Revert` is expressed by reverting to
    /// an earlier index instead.
    pub fn is_revertible(&self) -> bool {
        !matches!(
            self,
            EntryKind::New | EntryKind::Wikidot | EntryKind::Revert
        )
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// A tag with its display name, so the UI never needs a second lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagRef {
    /// Tag row id
    pub id: TagId,
    /// Display name at the time of the mutation
    pub name: String,
}

/// An attached file with its display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileRef {
    /// File row id
    pub id: FileId,
    /// File name at the time of the mutation
    pub name: String,
}

/// A file rename: the id keeps its identity, the name changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileRename {
    /// File row id
    pub id: FileId,
    /// Name after the rename
    pub name: String,
    /// Name before the rename
    pub prev_name: String,
}

/// Payload of a `Source` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceMeta {
    /// The stored document version now current
    pub version_id: VersionId,
}

/// Payload of a `Title` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TitleMeta {
    /// Title after the change
    pub title: String,
    /// Title before the change
    pub prev_title: String,
}

/// Payload of a `Name` entry (alias includes the category prefix)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NameMeta {
    /// Alias after the change
    pub name: String,
    /// Alias before the change
    pub prev_name: String,
}

/// Payload of a `Tags` entry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagsMeta {
    /// Tags added by this mutation
    #[serde(default)]
    pub added_tags: Vec<TagRef>,
    /// Tags removed by this mutation
    #[serde(default)]
    pub removed_tags: Vec<TagRef>,
}

impl TagsMeta {
    /// Whether the mutation changed anything
    pub fn is_empty(&self) -> bool {
        self.added_tags.is_empty() && self.removed_tags.is_empty()
    }
}

/// Payload of a `New` entry (creation marker)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewMeta {
    /// Initial stored document version
    pub version_id: VersionId,
    /// Initial title
    pub title: String,
}

/// Payload of a `Parent` entry
///
/// Carries both display names and ids; `None` means "no parent". All four
/// keys are required in the stored document (they may be null).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParentMeta {
    /// Parent display name after the change
    pub parent: Option<String>,
    /// Parent display name before the change
    pub prev_parent: Option<String>,
    /// Parent id after the change
    pub parent_id: Option<ArticleId>,
    /// Parent id before the change
    pub prev_parent_id: Option<ArticleId>,
}

/// File-set delta embedded in a `Revert` entry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileDelta {
    /// Files re-attached by the revert
    #[serde(default)]
    pub added: Vec<FileRef>,
    /// Files detached by the revert
    #[serde(default)]
    pub deleted: Vec<FileRef>,
    /// Files renamed back by the revert
    #[serde(default)]
    pub renamed: Vec<FileRename>,
}

impl FileDelta {
    /// Whether the delta changes anything
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty() && self.renamed.is_empty()
    }
}

/// Payload of a `Revert` entry
///
/// Snapshots the concrete post-revert values per subtype at creation time,
/// so later replay never re-resolves historical state. One sub-object is
/// populated per reverted subtype; all file kinds share the `files` delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RevertMeta {
    /// Which kinds were reverted, as requested by the caller
    pub subtypes: Vec<EntryKind>,
    /// The target revision index the article was reverted to
    pub rev_number: u64,
    /// Post-revert source version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceMeta>,
    /// Post-revert title (with the replaced live title as `prev_title`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<TitleMeta>,
    /// Post-revert alias
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<NameMeta>,
    /// Tag delta moving the live set back to the target set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<TagsMeta>,
    /// Post-revert parent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentMeta>,
    /// File delta moving the live set back to the target set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<FileDelta>,
    /// The live vote snapshot discarded by the revert (audit-only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<VoteSnapshot>,
}

/// Tagged metadata variant of a log entry
///
/// One case per kind in the closed set; the shape of each payload is fixed
/// by its kind and validated on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RevisionMeta {
    /// See [`SourceMeta`]
    Source(SourceMeta),
    /// See [`TitleMeta`]
    Title(TitleMeta),
    /// See [`NameMeta`]
    Name(NameMeta),
    /// See [`TagsMeta`]
    Tags(TagsMeta),
    /// See [`NewMeta`]
    New(NewMeta),
    /// See [`ParentMeta`]
    Parent(ParentMeta),
    /// See [`FileRef`]
    FileAdded(FileRef),
    /// See [`FileRef`]
    FileDeleted(FileRef),
    /// See [`FileRename`]
    FileRenamed(FileRename),
    /// Embeds the discarded [`VoteSnapshot`]
    VotesDeleted(VoteSnapshot),
    /// No payload beyond the entry comment
    Wikidot,
    /// See [`RevertMeta`]
    Revert(RevertMeta),
}

impl RevisionMeta {
    /// The kind tag of this variant
    pub fn kind(&self) -> EntryKind {
        match self {
            RevisionMeta::Source(_) => EntryKind::Source,
            RevisionMeta::Title(_) => EntryKind::Title,
            RevisionMeta::Name(_) => EntryKind::Name,
            RevisionMeta::Tags(_) => EntryKind::Tags,
            RevisionMeta::New(_) => EntryKind::New,
            RevisionMeta::Parent(_) => EntryKind::Parent,
            RevisionMeta::FileAdded(_) => EntryKind::FileAdded,
            RevisionMeta::FileDeleted(_) => EntryKind::FileDeleted,
            RevisionMeta::FileRenamed(_) => EntryKind::FileRenamed,
            RevisionMeta::VotesDeleted(_) => EntryKind::VotesDeleted,
            RevisionMeta::Wikidot => EntryKind::Wikidot,
            RevisionMeta::Revert(_) => EntryKind::Revert,
        }
    }
}

/// Encode a metadata variant to its stored payload document
///
/// Returns the kind tag (stored alongside, never inferred back from shape)
/// and the self-describing JSON document.
///
/// # Errors
/// `SchemaViolation` if the value cannot be stored losslessly. JSON has no
/// NaN or infinity, and serde_json writes non-finite floats as `null`, so a
/// vote snapshot carrying one would encode fine and fail on decode; it is
/// rejected here instead.
pub fn encode_meta(meta: &RevisionMeta) -> Result<(EntryKind, serde_json::Value)> {
    let kind = meta.kind();
    let payload = match meta {
        RevisionMeta::Source(m) => to_document(kind, m)?,
        RevisionMeta::Title(m) => to_document(kind, m)?,
        RevisionMeta::Name(m) => to_document(kind, m)?,
        RevisionMeta::Tags(m) => to_document(kind, m)?,
        RevisionMeta::New(m) => to_document(kind, m)?,
        RevisionMeta::Parent(m) => to_document(kind, m)?,
        RevisionMeta::FileAdded(m) => to_document(kind, m)?,
        RevisionMeta::FileDeleted(m) => to_document(kind, m)?,
        RevisionMeta::FileRenamed(m) => to_document(kind, m)?,
        RevisionMeta::VotesDeleted(m) => {
            check_snapshot_finite(kind, m)?;
            to_document(kind, m)?
        }
        RevisionMeta::Wikidot => serde_json::Value::Object(serde_json::Map::new()),
        RevisionMeta::Revert(m) => {
            if let Some(snapshot) = &m.votes {
                check_snapshot_finite(kind, snapshot)?;
            }
            to_document(kind, m)?
        }
    };
    Ok((kind, payload))
}

/// Decode a stored payload document against its declared kind
///
/// The kind tag fully determines which variant to expect.
///
/// # Errors
/// `SchemaViolation` if required fields are missing, mistyped, or not part
/// of the declared kind's schema, including a payload whose shape belongs to
/// a different kind.
pub fn decode_meta(kind: EntryKind, payload: &serde_json::Value) -> Result<RevisionMeta> {
    match kind {
        EntryKind::Source => from_document(kind, payload).map(RevisionMeta::Source),
        EntryKind::Title => from_document(kind, payload).map(RevisionMeta::Title),
        EntryKind::Name => from_document(kind, payload).map(RevisionMeta::Name),
        EntryKind::Tags => from_document(kind, payload).map(RevisionMeta::Tags),
        EntryKind::New => from_document(kind, payload).map(RevisionMeta::New),
        EntryKind::Parent => from_document(kind, payload).map(RevisionMeta::Parent),
        EntryKind::FileAdded => from_document(kind, payload).map(RevisionMeta::FileAdded),
        EntryKind::FileDeleted => from_document(kind, payload).map(RevisionMeta::FileDeleted),
        EntryKind::FileRenamed => from_document(kind, payload).map(RevisionMeta::FileRenamed),
        EntryKind::VotesDeleted => from_document(kind, payload).map(RevisionMeta::VotesDeleted),
        EntryKind::Wikidot => {
            // No required fields; anything but an object is still malformed.
            if payload.is_object() || payload.is_null() {
                Ok(RevisionMeta::Wikidot)
            } else {
                Err(Error::SchemaViolation {
                    kind,
                    reason: "expected an object payload".to_string(),
                })
            }
        }
        EntryKind::Revert => from_document(kind, payload).map(RevisionMeta::Revert),
    }
}

fn to_document<T: Serialize>(kind: EntryKind, value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| Error::SchemaViolation {
        kind,
        reason: e.to_string(),
    })
}

fn check_snapshot_finite(kind: EntryKind, snapshot: &VoteSnapshot) -> Result<()> {
    if snapshot.is_finite() {
        Ok(())
    } else {
        Err(Error::SchemaViolation {
            kind,
            reason: "non-finite float in vote snapshot".to_string(),
        })
    }
}

fn from_document<T: for<'de> Deserialize<'de>>(
    kind: EntryKind,
    payload: &serde_json::Value,
) -> Result<T> {
    serde_json::from_value(payload.clone()).map_err(|e| Error::SchemaViolation {
        kind,
        reason: e.to_string(),
    })
}
