//! Revision log integration tests
//!
//! End-to-end coverage of the log, projector and revert engine through the
//! public `sitechanges` facade:
//! - the documented edit/revert scenarios
//! - revert policies (identity re-revert, rejections)
//! - concurrency properties (gapless indices, CAS retry)

mod concurrent;
mod revert;
mod scenarios;
