use rowreview::csv_codec::parse;
use rowreview::session::{Navigation, ReviewForm, ReviewSession, SessionState, UnreviewedRows};
use rowreview::store::{MemoryStore, CSV_DATA_KEY, REVIEWED_DATA_KEY};
use std::sync::Arc;

fn session(raw: &str) -> (ReviewSession, MemoryStore) {
    let store = MemoryStore::new();
    let table = parse(raw).expect("parse");
    (ReviewSession::new(table, Arc::new(store.clone())), store)
}

#[test]
fn campaign_profile_review_exports_scores_and_responses() {
    let (mut session, _) = session("Campaign,Profile\nC1,P1\nC2,P2\n");
    let mut form = ReviewForm::new("8", "good fit");
    assert_eq!(session.next(&mut form), Navigation::Moved { from: 0, to: 1 });
    assert_eq!(form, ReviewForm::default());

    form = ReviewForm::new("3", "poor fit");
    assert_eq!(session.next(&mut form), Navigation::Completed);
    assert!(session.is_complete());
    assert_eq!(session.state(), SessionState::Complete);

    assert_eq!(
        session.export_csv(UnreviewedRows::Blank),
        "Campaign,Profile,Score,Response\nC1,P1,8,good fit\nC2,P2,3,poor fit"
    );
}

#[test]
fn completion_happens_on_exactly_the_last_next() {
    let (mut session, _) = session("h\na\nb\nc\nd\n");
    let mut form = ReviewForm::default();
    for expected_index in 1..4 {
        assert!(!session.is_complete());
        session.next(&mut form);
        assert_eq!(session.current_index(), expected_index);
    }
    assert!(!session.is_complete());
    assert_eq!(session.next(&mut form), Navigation::Completed);
    assert!(session.is_complete());
    assert_eq!(session.current_index(), 3);
    assert_eq!(session.next(&mut form), Navigation::Ignored);
}

#[test]
fn single_row_table_completes_on_first_next() {
    let (mut session, _) = session("h\nonly\n");
    assert!(session.is_last_row());
    assert_eq!(session.next(&mut ReviewForm::new("1", "")), Navigation::Completed);
}

#[test]
fn guarded_moves_leave_cursor_and_annotations_untouched() {
    let (mut session, store) = session("h\na\nb\nc\n");
    let mut form = ReviewForm::new("typed", "but unsaved");

    assert_eq!(session.previous(&mut form), Navigation::Ignored);
    for bad in ["0", "4", "-1", "two", "", "1.5", "99999999999999999999"] {
        assert_eq!(session.go_to(bad, &mut form), Navigation::Ignored, "{bad:?}");
    }
    assert_eq!(session.current_index(), 0);
    assert_eq!(session.reviewed_count(), 0);
    assert_eq!(store.raw(REVIEWED_DATA_KEY), None);
    assert_eq!(form, ReviewForm::new("typed", "but unsaved"));
}

#[test]
fn go_to_saves_then_jumps_and_loads_prior_values() {
    let (mut session, _) = session("h\na\nb\nc\n");
    let mut form = ReviewForm::new("5", "first");
    assert_eq!(session.go_to(" 3 ", &mut form), Navigation::Moved { from: 0, to: 2 });
    assert_eq!(form, ReviewForm::default());

    form = ReviewForm::new("7", "third");
    assert_eq!(session.go_to("1", &mut form), Navigation::Moved { from: 2, to: 0 });
    assert_eq!(form, ReviewForm::new("5", "first"));
    assert_eq!(session.annotation(2).map(|a| a.score.as_str()), Some("7"));
}

#[test]
fn saving_twice_overwrites_the_row() {
    let (mut session, _) = session("h\na\nb\n");
    assert!(session.save_current("1", "draft"));
    assert!(session.save_current("2", "final"));
    assert_eq!(session.reviewed_count(), 1);
    let annotation = session.annotation(0).expect("saved");
    assert_eq!((annotation.score.as_str(), annotation.response.as_str()), ("2", "final"));
    assert_eq!(annotation.row_data, vec!["a".to_string()]);
}

#[test]
fn previous_saves_the_form_before_moving_back() {
    let (mut session, _) = session("h\na\nb\n");
    let mut form = ReviewForm::new("1", "one");
    session.next(&mut form);
    form = ReviewForm::new("2", "two");
    assert_eq!(session.previous(&mut form), Navigation::Moved { from: 1, to: 0 });
    assert_eq!(form, ReviewForm::new("1", "one"));
    assert_eq!(session.load_form(1), ReviewForm::new("2", "two"));
}

#[test]
fn resume_restores_saved_annotations() {
    let (mut session, store) = session("h\na\nb\n");
    let mut form = ReviewForm::new("4", "kept");
    session.next(&mut form);
    rowreview::store::save(&store, CSV_DATA_KEY, session.table()).expect("table");

    let resumed = ReviewSession::resume(Arc::new(store.clone())).expect("resume");
    assert_eq!(resumed.current_index(), 0);
    assert_eq!(resumed.reviewed_count(), 1);
    assert_eq!(resumed.load_form(0), ReviewForm::new("4", "kept"));
    assert!(!resumed.is_complete());
}

#[test]
fn export_can_omit_unreviewed_rows_or_use_custom_columns() {
    let (mut session, _) = session("a,b\n1,x\n2,y\n3,z\n");
    let mut form = ReviewForm::default();
    session.go_to("2", &mut form);
    session.save_current("10", "line one\nline two");

    assert_eq!(
        session.export_csv(UnreviewedRows::Omit),
        "a,b,Score,Response\n1,x,,\n2,y,10,\"line one\nline two\""
    );
    assert_eq!(
        session.export_csv(UnreviewedRows::Blank),
        "a,b,Score,Response\n1,x,,\n2,y,10,\"line one\nline two\"\n3,z,,"
    );
    let custom = session.export_csv_with(&["Verdict"], UnreviewedRows::Omit, |annotation| {
        vec![annotation.map(|a| format!("score={}", a.score)).unwrap_or_default()]
    });
    assert_eq!(custom, "a,b,Verdict\n1,x,score=\n2,y,score=10");
}
