//! Documented end-to-end scenarios

use chrono::Utc;
use sitechanges::{
    ArticleId, EntryKind, RatingMode, RatingValue, RevisionLog, RevisionMeta, TagId, TagRef,
    UserId, VersionId, Vote, VoteSnapshot,
};

fn created(title: &str) -> (RevisionLog, ArticleId, UserId) {
    let log = RevisionLog::new();
    let article = ArticleId::new();
    let editor = UserId::new();
    log.create(article, editor, VersionId(1), title, None).unwrap();
    (log, article, editor)
}

#[test]
fn title_edit_then_revert() {
    let (log, article, editor) = created("A");

    log.record_title(article, editor, "B", None).unwrap();
    assert_eq!(log.project(article, 1).unwrap().title, "B");

    let entry = log
        .revert(article, 0, &[EntryKind::Title], editor, None)
        .unwrap();
    assert_eq!(entry.revision_index, 2);
    match &entry.meta {
        RevisionMeta::Revert(m) => {
            assert_eq!(m.rev_number, 0);
            let title = m.title.as_ref().unwrap();
            assert_eq!(title.title, "A");
            assert_eq!(title.prev_title, "B");
        }
        other => panic!("unexpected meta: {other:?}"),
    }
    assert_eq!(log.project(article, 2).unwrap().title, "A");
}

#[test]
fn tags_add_then_full_revert() {
    let (log, article, editor) = created("A");

    log.record_tags(
        article,
        editor,
        &[
            TagRef { id: TagId(1), name: "foo".to_string() },
            TagRef { id: TagId(2), name: "bar".to_string() },
        ],
        None,
    )
    .unwrap();
    assert_eq!(log.current_state(article).unwrap().tag_set.len(), 2);

    let entry = log
        .revert(article, 0, &[EntryKind::Tags], editor, None)
        .unwrap();
    match &entry.meta {
        RevisionMeta::Revert(m) => {
            let tags = m.tags.as_ref().unwrap();
            assert!(tags.added_tags.is_empty());
            let removed: Vec<TagId> = tags.removed_tags.iter().map(|t| t.id).collect();
            assert_eq!(removed, vec![TagId(1), TagId(2)]);
        }
        other => panic!("unexpected meta: {other:?}"),
    }
    assert!(log.current_state(article).unwrap().tag_set.is_empty());
}

#[test]
fn votes_deleted_snapshot_fidelity() {
    let (log, article, editor) = created("A");

    let voters = [UserId::new(), UserId::new(), UserId::new()];
    let snapshot = VoteSnapshot {
        rating_mode: RatingMode::UpDown,
        rating: RatingValue::Int(7),
        votes_count: 3,
        popularity: 66.7,
        votes: vec![
            Vote { user_id: voters[0], value: 5.0, visual_group_id: None, date: Utc::now() },
            Vote { user_id: voters[1], value: 1.0, visual_group_id: Some(1), date: Utc::now() },
            Vote { user_id: voters[2], value: 1.0, visual_group_id: None, date: Utc::now() },
        ],
    };

    let entry = log
        .record_votes_deleted(article, editor, snapshot.clone(), None)
        .unwrap();
    match &entry.meta {
        RevisionMeta::VotesDeleted(captured) => {
            assert_eq!(captured.votes_count, 3);
            assert_eq!(captured.rating, RatingValue::Int(7));
            assert_eq!(captured.votes.len(), 3);
            for (vote, voter) in captured.votes.iter().zip(voters) {
                assert_eq!(vote.user_id, voter);
            }
        }
        other => panic!("unexpected meta: {other:?}"),
    }

    // The live rating resets; the ledger survives only inside the entry.
    assert!(log.current_state(article).unwrap().rating.is_empty());
}

#[test]
fn source_edits_and_projection_as_of() {
    let (log, article, editor) = created("A");

    log.record_source(article, editor, VersionId(2), Some("typo fix".to_string()))
        .unwrap();
    log.record_source(article, editor, VersionId(3), None).unwrap();

    assert_eq!(
        log.project(article, 0).unwrap().current_version_id,
        Some(VersionId(1))
    );
    assert_eq!(
        log.project(article, 1).unwrap().current_version_id,
        Some(VersionId(2))
    );
    assert_eq!(
        log.current_state(article).unwrap().current_version_id,
        Some(VersionId(3))
    );
}

#[test]
fn paged_listing_matches_original_shape() {
    let (log, article, editor) = created("A");
    for i in 2..=6u64 {
        log.record_source(article, editor, VersionId(i), None).unwrap();
    }

    let (page, total) = log.log_entries_paged(article, 0, 25, false);
    assert_eq!(total, 6);
    assert_eq!(page.len(), 6);
    assert_eq!(page[0].revision_index, 5);
    assert_eq!(page[5].revision_index, 0);
    assert_eq!(page[5].default_comment(), "Created page");
}

#[test]
fn wikidot_marker_has_no_state_effect() {
    let (log, article, editor) = created("A");
    let before = log.current_state(article).unwrap();

    log.record_wikidot(article, editor, Some("imported".to_string()))
        .unwrap();
    assert_eq!(log.current_state(article).unwrap(), before);
}
