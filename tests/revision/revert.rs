//! Revert engine policies and multi-subtype reverts

use sitechanges::{
    ArticleId, EntryKind, Error, FileId, RevisionLog, RevisionMeta, TagId, TagRef, UserId,
    VersionId,
};

fn created(title: &str) -> (RevisionLog, ArticleId, UserId) {
    let log = RevisionLog::new();
    let article = ArticleId::new();
    let editor = UserId::new();
    log.create(article, editor, VersionId(1), title, None).unwrap();
    (log, article, editor)
}

#[test]
fn non_revertible_subtypes_rejected_for_any_target() {
    let (log, article, editor) = created("A");
    log.record_title(article, editor, "B", None).unwrap();

    for kind in [EntryKind::New, EntryKind::Wikidot, EntryKind::Revert] {
        let err = log.revert(article, 0, &[kind], editor, None).unwrap_err();
        assert!(
            matches!(err, Error::NonRevertibleType(k) if k == kind),
            "{kind} must be rejected"
        );
        // Rejected even when bundled with a valid subtype.
        let err = log
            .revert(article, 0, &[EntryKind::Title, kind], editor, None)
            .unwrap_err();
        assert!(matches!(err, Error::NonRevertibleType(_)));
    }
}

#[test]
fn empty_subtype_set_rejected() {
    let (log, article, editor) = created("A");
    log.record_title(article, editor, "B", None).unwrap();
    let err = log.revert(article, 0, &[], editor, None).unwrap_err();
    assert!(matches!(err, Error::EmptySubtypeSet));
}

#[test]
fn second_revert_to_same_target_is_identity() {
    let (log, article, editor) = created("A");
    log.record_title(article, editor, "B", None).unwrap();

    let first = log
        .revert(article, 0, &[EntryKind::Title], editor, None)
        .unwrap();
    let second = log
        .revert(article, 0, &[EntryKind::Title], editor, None)
        .unwrap();

    // Two distinct forward entries...
    assert_eq!(first.revision_index, 2);
    assert_eq!(second.revision_index, 3);

    // ...but the second carries an identity delta: nothing changed since
    // the first revert, so old and new values coincide.
    match &second.meta {
        RevisionMeta::Revert(m) => {
            let title = m.title.as_ref().unwrap();
            assert_eq!(title.title, title.prev_title);
            assert_eq!(title.title, "A");
        }
        other => panic!("unexpected meta: {other:?}"),
    }
    assert_eq!(log.current_state(article).unwrap().title, "A");
}

#[test]
fn multi_subtype_revert_restores_files_source_and_tags() {
    let (log, article, editor) = created("A");

    // Build up state: tag, two files, one renamed, then a source edit.
    log.record_tags(
        article,
        editor,
        &[TagRef { id: TagId(1), name: "foo".to_string() }],
        None,
    )
    .unwrap();
    log.record_file_added(article, editor, FileId(1), "keep.png", None)
        .unwrap();
    log.record_file_added(article, editor, FileId(2), "temp.png", None)
        .unwrap();
    let checkpoint = log.head_index(article).unwrap();

    // Diverge from the checkpoint.
    log.record_file_renamed(article, editor, FileId(1), "kept-live.png", None)
        .unwrap();
    log.record_file_deleted(article, editor, FileId(2), None).unwrap();
    log.record_file_added(article, editor, FileId(3), "late.png", None)
        .unwrap();
    log.record_source(article, editor, VersionId(9), None).unwrap();
    log.record_tags(article, editor, &[], None).unwrap();

    let entry = log
        .revert(
            article,
            checkpoint,
            &[
                EntryKind::FileAdded,
                EntryKind::FileRenamed,
                EntryKind::Source,
                EntryKind::Tags,
            ],
            editor,
            None,
        )
        .unwrap();

    match &entry.meta {
        RevisionMeta::Revert(m) => {
            assert_eq!(m.rev_number, checkpoint);
            let files = m.files.as_ref().unwrap();
            assert_eq!(files.added.len(), 1); // temp.png comes back
            assert_eq!(files.added[0].id, FileId(2));
            assert_eq!(files.deleted.len(), 1); // late.png goes away
            assert_eq!(files.deleted[0].id, FileId(3));
            assert_eq!(files.renamed.len(), 1); // keep.png gets its name back
            assert_eq!(files.renamed[0].name, "keep.png");
            assert_eq!(m.source.unwrap().version_id, VersionId(1));
            let tags = m.tags.as_ref().unwrap();
            assert_eq!(tags.added_tags.len(), 1);
            assert_eq!(tags.added_tags[0].name, "foo");
        }
        other => panic!("unexpected meta: {other:?}"),
    }

    let state = log.current_state(article).unwrap();
    assert_eq!(state.file_set.get(&FileId(1)).unwrap(), "keep.png");
    assert_eq!(state.file_set.get(&FileId(2)).unwrap(), "temp.png");
    assert!(!state.file_set.contains_key(&FileId(3)));
    assert_eq!(state.current_version_id, Some(VersionId(1)));
    assert!(state.tag_set.contains_key(&TagId(1)));
}

#[test]
fn unrequested_subtypes_are_untouched() {
    let (log, article, editor) = created("A");
    log.record_title(article, editor, "B", None).unwrap();
    log.record_source(article, editor, VersionId(2), None).unwrap();

    // Revert only the title; the newer source version must survive.
    log.revert(article, 0, &[EntryKind::Title], editor, None)
        .unwrap();
    let state = log.current_state(article).unwrap();
    assert_eq!(state.title, "A");
    assert_eq!(state.current_version_id, Some(VersionId(2)));
}

#[test]
fn revert_target_must_be_prior_revision() {
    let (log, article, editor) = created("A");
    log.record_title(article, editor, "B", None).unwrap();

    // Head itself is not a valid target.
    let err = log
        .revert(article, 1, &[EntryKind::Title], editor, None)
        .unwrap_err();
    assert!(matches!(err, Error::UnknownRevisionIndex { index: 1, .. }));

    // Neither is anything beyond it.
    let err = log
        .revert(article, 42, &[EntryKind::Title], editor, None)
        .unwrap_err();
    assert!(matches!(err, Error::UnknownRevisionIndex { index: 42, .. }));
}

#[test]
fn revert_entry_survives_codec_roundtrip() {
    let (log, article, editor) = created("A");
    log.record_title(article, editor, "B", None).unwrap();
    let entry = log
        .revert(article, 0, &[EntryKind::Title], editor, None)
        .unwrap();

    let (kind, payload) = sitechanges::encode_meta(&entry.meta).unwrap();
    assert_eq!(kind, EntryKind::Revert);
    assert_eq!(payload.get("rev_number").unwrap().as_u64(), Some(0));
    let restored = sitechanges::decode_meta(kind, &payload).unwrap();
    assert_eq!(restored, entry.meta);
}

#[test]
fn votes_revert_embeds_discarded_snapshot() {
    use chrono::Utc;
    use sitechanges::{RatingMode, RatingValue, Vote, VoteSnapshot};

    let (log, article, editor) = created("A");
    let snapshot = VoteSnapshot {
        rating_mode: RatingMode::UpDown,
        rating: RatingValue::Int(2),
        votes_count: 2,
        popularity: 100.0,
        votes: vec![
            Vote { user_id: UserId::new(), value: 1.0, visual_group_id: None, date: Utc::now() },
            Vote { user_id: UserId::new(), value: 1.0, visual_group_id: None, date: Utc::now() },
        ],
    };
    log.record_votes_deleted(article, editor, snapshot, None).unwrap();

    let entry = log
        .revert(article, 0, &[EntryKind::VotesDeleted], editor, None)
        .unwrap();
    match &entry.meta {
        RevisionMeta::Revert(m) => {
            // The live rating was already empty, and that is what the entry
            // captures; the rows live only in history.
            let votes = m.votes.as_ref().unwrap();
            assert!(votes.is_empty());
        }
        other => panic!("unexpected meta: {other:?}"),
    }
    assert!(log.current_state(article).unwrap().rating.is_empty());
}
