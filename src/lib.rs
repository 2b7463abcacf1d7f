//! sitechanges - append-only revision history and revert engine for wiki articles
//!
//! Every mutation to an article (content version, title, alias, tags,
//! parent, attached files, votes) is recorded as one immutable, typed log
//! entry at the next per-article index. "Undo" is a [`RevisionLog::revert`]:
//! a new forward entry that snapshots the post-revert values per reverted
//! kind, so history is never rewritten and replay never re-resolves old
//! state.
//!
//! # Quick Start
//!
//! ```
//! use sitechanges::{RevisionLog, ArticleId, UserId, VersionId, EntryKind};
//!
//! let log = RevisionLog::new();
//! let article = ArticleId::new();
//! let editor = UserId::new();
//!
//! log.create(article, editor, VersionId(1), "Theme Park", None)?;
//! log.record_title(article, editor, "Abandoned Theme Park", None)?;
//!
//! // State as of any revision:
//! assert_eq!(log.project(article, 0)?.title, "Theme Park");
//!
//! // Undo the title change with a forward entry:
//! log.revert(article, 0, &[EntryKind::Title], editor, None)?;
//! assert_eq!(log.current_state(article)?.title, "Theme Park");
//! # Ok::<(), sitechanges::Error>(())
//! ```

pub use sitechanges_core::*;
pub use sitechanges_engine::{Projector, RevertEngine, RevisionLog};
pub use sitechanges_storage::LogStore;
