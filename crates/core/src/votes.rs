//! Vote snapshots
//!
//! A `VoteSnapshot` is an immutable capture of an article's rating state at a
//! point in time: the rating mode, the aggregate score, the vote count, the
//! derived popularity metric, and the full per-user vote ledger.
//!
//! Snapshots are embedded in `VotesDeleted` and `Revert` log entries. They are
//! audit data: folding either entry kind clears the live rating, and no vote
//! row is ever replayed back into a live voting table.

use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rating scheme an article is voted under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingMode {
    /// +1 / -1 votes, integer aggregate
    UpDown,
    /// star-scale votes, floating point aggregate
    Stars,
    /// voting disabled for the article's category
    Disabled,
}

/// Aggregate rating value
///
/// Integer for up/down mode, floating point for star mode. Serialized as the
/// bare number so stored documents read naturally.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RatingValue {
    /// Signed sum of up/down votes
    Int(i64),
    /// Mean star rating
    Float(f64),
}

impl RatingValue {
    /// Zero value appropriate for the given mode
    pub fn zero(mode: RatingMode) -> Self {
        match mode {
            RatingMode::Stars => RatingValue::Float(0.0),
            RatingMode::UpDown | RatingMode::Disabled => RatingValue::Int(0),
        }
    }

    /// Whether the value can survive a JSON round trip
    ///
    /// JSON has no NaN or infinity; serde_json writes them as `null`, which
    /// then fails to decode. Non-finite values are rejected before encoding.
    pub fn is_finite(&self) -> bool {
        match self {
            RatingValue::Int(_) => true,
            RatingValue::Float(f) => f.is_finite(),
        }
    }
}

/// A single vote row at capture time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Vote {
    /// Voter
    pub user_id: UserId,
    /// Vote value (+1/-1 for up/down, star count otherwise)
    pub value: f64,
    /// Visual group the voter belonged to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_group_id: Option<u64>,
    /// When the vote was cast
    pub date: DateTime<Utc>,
}

/// Immutable point-in-time capture of an article's rating state
///
/// Captured whenever votes are deleted or reverted. The `votes` ledger is
/// ordered and complete; once embedded in a log entry it is never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoteSnapshot {
    /// Rating scheme at capture time
    pub rating_mode: RatingMode,
    /// Aggregate value at capture time
    pub rating: RatingValue,
    /// Number of votes at capture time
    pub votes_count: u64,
    /// Derived popularity metric (percentage of positive votes)
    pub popularity: f64,
    /// Full per-user vote ledger
    pub votes: Vec<Vote>,
}

impl VoteSnapshot {
    /// The empty rating state for a mode (post-`VotesDeleted`)
    pub fn empty(mode: RatingMode) -> Self {
        Self {
            rating_mode: mode,
            rating: RatingValue::zero(mode),
            votes_count: 0,
            popularity: 0.0,
            votes: Vec::new(),
        }
    }

    /// Whether any votes are captured
    pub fn is_empty(&self) -> bool {
        self.votes_count == 0 && self.votes.is_empty()
    }

    /// Whether every float in the snapshot can survive a JSON round trip
    ///
    /// Checked before a snapshot is accepted into a log entry; see
    /// [`RatingValue::is_finite`].
    pub fn is_finite(&self) -> bool {
        self.rating.is_finite()
            && self.popularity.is_finite()
            && self.votes.iter().all(|v| v.value.is_finite())
    }
}

impl Default for VoteSnapshot {
    fn default() -> Self {
        Self::empty(RatingMode::UpDown)
    }
}
