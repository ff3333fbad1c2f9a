use super::common::*;
use crate::eligibility::domain::{
    AssessmentType, ExceptionalCircumstances, NstbApproval, ReviewOutcome, StudentTrack,
};
use crate::eligibility::evaluation::{review, WorkflowError};

fn pending_case() -> ExceptionalCircumstances {
    engine()
        .evaluate(draft(
            AssessmentType::Daeu,
            StudentTrack::Science,
            scenario_b_subjects(),
        ))
        .exceptional_circumstances
}

#[test]
fn review_records_decision_and_reviewer() {
    let mut circumstances = pending_case();

    review(
        &mut circumstances,
        ReviewOutcome::Approved,
        "nstb-board-01",
        "Strong sciences, remedial French plan agreed".to_string(),
        review_time(),
    )
    .expect("pending case can be reviewed");

    assert_eq!(circumstances.nstb_approval, NstbApproval::Approved);
    assert_eq!(circumstances.reviewed_by.as_deref(), Some("nstb-board-01"));
    assert_eq!(circumstances.review_date, Some(review_time()));
    assert!(circumstances
        .approval_notes
        .as_deref()
        .unwrap_or_default()
        .contains("remedial French"));
}

#[test]
fn blank_notes_are_not_stored() {
    let mut circumstances = pending_case();
    review(
        &mut circumstances,
        ReviewOutcome::Rejected,
        "nstb-board-01",
        "   ".to_string(),
        review_time(),
    )
    .expect("pending case can be reviewed");

    assert_eq!(circumstances.nstb_approval, NstbApproval::Rejected);
    assert!(circumstances.approval_notes.is_none());
}

#[test]
fn decided_cases_cannot_be_reviewed_again() {
    let mut circumstances = pending_case();
    review(
        &mut circumstances,
        ReviewOutcome::Rejected,
        "nstb-board-01",
        String::new(),
        review_time(),
    )
    .expect("first review succeeds");

    let second = review(
        &mut circumstances,
        ReviewOutcome::Approved,
        "nstb-board-02",
        String::new(),
        review_time(),
    );

    assert_eq!(
        second,
        Err(WorkflowError::AlreadyDecided(NstbApproval::Rejected))
    );
    assert_eq!(circumstances.nstb_approval, NstbApproval::Rejected);
    assert_eq!(circumstances.reviewed_by.as_deref(), Some("nstb-board-01"));
}

#[test]
fn non_exceptional_cases_reject_review() {
    let mut circumstances = engine()
        .evaluate(draft(
            AssessmentType::Daeu,
            StudentTrack::Science,
            scenario_a_subjects(),
        ))
        .exceptional_circumstances;

    let outcome = review(
        &mut circumstances,
        ReviewOutcome::Approved,
        "nstb-board-01",
        String::new(),
        review_time(),
    );

    assert_eq!(outcome, Err(WorkflowError::NotExceptional));
    assert_eq!(circumstances, ExceptionalCircumstances::default());
}

#[test]
fn pending_flag_resets_when_case_stops_being_exceptional() {
    let engine = engine();
    let mut record = engine.evaluate(draft(
        AssessmentType::Daeu,
        StudentTrack::Science,
        scenario_b_subjects(),
    ));
    assert_eq!(
        record.exceptional_circumstances.nstb_approval,
        NstbApproval::Pending
    );

    record.subjects_enrolled[0].score = 11.0;
    let record = engine.evaluate(record);

    assert!(!record.assessment_results.is_exceptional_case);
    assert!(!record.exceptional_circumstances.has_exceptional_case);
    assert_eq!(
        record.exceptional_circumstances.nstb_approval,
        NstbApproval::NotApplicable
    );
    assert!(record.exceptional_circumstances.average_score.is_none());
    assert!(record.assessment_results.eligible_for_scholarship);
}

#[test]
fn decided_case_keeps_audit_trail_after_scores_change() {
    let engine = engine();
    let mut record = engine.evaluate(draft(
        AssessmentType::Daeu,
        StudentTrack::Science,
        scenario_b_subjects(),
    ));
    review(
        &mut record.exceptional_circumstances,
        ReviewOutcome::Rejected,
        "nstb-board-01",
        String::new(),
        review_time(),
    )
    .expect("review succeeds");
    let record = engine.evaluate(record);
    assert!(!record.assessment_results.eligible_for_scholarship);

    let mut improved = record;
    improved.subjects_enrolled[0].score = 12.0;
    let improved = engine.evaluate(improved);

    assert!(!improved.exceptional_circumstances.has_exceptional_case);
    assert_eq!(
        improved.exceptional_circumstances.nstb_approval,
        NstbApproval::Rejected
    );
    assert!(improved.assessment_results.meets_minimum_criteria);
    assert!(improved.assessment_results.eligible_for_scholarship);
}

#[test]
fn reflagged_case_needs_a_fresh_review() {
    let engine = engine();
    let mut record = engine.evaluate(draft(
        AssessmentType::Daeu,
        StudentTrack::Science,
        scenario_b_subjects(),
    ));
    review(
        &mut record.exceptional_circumstances,
        ReviewOutcome::Approved,
        "nstb-board-01",
        "first session".to_string(),
        review_time(),
    )
    .expect("review succeeds");
    let mut record = engine.evaluate(record);
    assert!(record.assessment_results.eligible_for_scholarship);

    record.subjects_enrolled[0].score = 12.0;
    let mut record = engine.evaluate(record);
    assert!(!record.exceptional_circumstances.has_exceptional_case);
    assert_eq!(
        record.exceptional_circumstances.nstb_approval,
        NstbApproval::Approved
    );

    record.subjects_enrolled[0].score = 5.0;
    record.subjects_enrolled[2].score = 20.0;
    let mut record = engine.evaluate(record);

    let circumstances = &record.exceptional_circumstances;
    assert!(record.assessment_results.is_exceptional_case);
    assert_eq!(circumstances.nstb_approval, NstbApproval::Pending);
    assert_eq!(circumstances.french_score, Some(5.0));
    assert_eq!(circumstances.reviewed_by, None);
    assert_eq!(circumstances.approval_notes, None);
    assert!(!record.assessment_results.meets_minimum_criteria);
    assert!(!record.assessment_results.eligible_for_scholarship);

    assert_eq!(circumstances.superseded_reviews.len(), 1);
    let superseded = &circumstances.superseded_reviews[0];
    assert_eq!(superseded.decision, NstbApproval::Approved);
    assert_eq!(superseded.french_score, Some(8.0));
    assert_eq!(superseded.average_score, Some(14.0));
    assert_eq!(superseded.reviewed_by.as_deref(), Some("nstb-board-01"));
    assert_eq!(superseded.approval_notes.as_deref(), Some("first session"));

    review(
        &mut record.exceptional_circumstances,
        ReviewOutcome::Rejected,
        "nstb-board-01",
        String::new(),
        review_time(),
    )
    .expect("new case can be reviewed");
    let record = engine.evaluate(record);
    assert_eq!(
        record.exceptional_circumstances.nstb_approval,
        NstbApproval::Rejected
    );
    assert!(!record.assessment_results.eligible_for_scholarship);
}
