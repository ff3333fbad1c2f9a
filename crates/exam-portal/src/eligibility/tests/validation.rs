use super::common::*;
use crate::eligibility::domain::{AssessmentId, AssessmentType, NstbApproval, StudentId};
use crate::eligibility::validation::{check_academic_year, AssessmentGuard, ValidationError};

fn guard() -> AssessmentGuard {
    AssessmentGuard::default()
}

fn pending_id() -> AssessmentId {
    AssessmentId("asm-pending".to_string())
}

#[test]
fn guard_builds_unevaluated_record() {
    let mut submission = submission("S1", " 2024 ", AssessmentType::Bts, scenario_a_subjects());
    submission.exceptional_justification = Some("family relocation".to_string());
    submission.acceptance_details = Some("Lycée Henri IV".to_string());

    let record = guard()
        .assessment_from_submission(pending_id(), submission)
        .expect("valid submission");

    assert_eq!(record.academic_year, "2024");
    assert_eq!(record.overall_performance.total_coefficients, 0.0);
    assert!(!record.assessment_results.eligible_for_scholarship);
    assert_eq!(record.advanced_programme.programme_type, "N/A");
    assert_eq!(
        record.advanced_programme.acceptance_details.as_deref(),
        Some("Lycée Henri IV")
    );
    assert_eq!(
        record.exceptional_circumstances.justification.as_deref(),
        Some("family relocation")
    );
    assert_eq!(
        record.exceptional_circumstances.nstb_approval,
        NstbApproval::NotApplicable
    );
}

#[test]
fn guard_requires_student_id() {
    let mut submission = submission("S1", "2024", AssessmentType::Daeu, scenario_a_subjects());
    submission.student_id = StudentId("   ".to_string());

    match guard().assessment_from_submission(pending_id(), submission) {
        Err(ValidationError::MissingStudentId) => {}
        other => panic!("expected missing student id, got {other:?}"),
    }
}

#[test]
fn guard_trims_student_id() {
    let submission = submission(" S1 ", "2024", AssessmentType::Daeu, scenario_a_subjects());

    let record = guard()
        .assessment_from_submission(pending_id(), submission)
        .expect("submission accepted");

    assert_eq!(record.student_id, StudentId("S1".to_string()));
}

#[test]
fn guard_requires_subjects() {
    let submission = submission("S1", "2024", AssessmentType::Daeu, Vec::new());

    match guard().assessment_from_submission(pending_id(), submission) {
        Err(ValidationError::NoSubjects) => {}
        other => panic!("expected no subjects, got {other:?}"),
    }
}

#[test]
fn guard_rejects_blank_subject_names() {
    let subjects = vec![subject("French", 12.0, 1.0), subject("  ", 14.0, 1.0)];

    match guard().check_subjects(&subjects) {
        Err(ValidationError::BlankSubjectName { index }) => assert_eq!(index, 1),
        other => panic!("expected blank subject name, got {other:?}"),
    }
}

#[test]
fn guard_accepts_scale_bounds_and_rejects_beyond() {
    let guard = guard();
    assert_eq!(guard.max_score(), 20.0);

    let bounds = vec![subject("French", 0.0, 1.0), subject("Math", 20.0, 1.0)];
    assert!(guard.check_subjects(&bounds).is_ok());

    match guard.check_subjects(&[subject("Math", -0.5, 1.0)]) {
        Err(ValidationError::ScoreOutOfRange { subject, max, .. }) => {
            assert_eq!(subject, "Math");
            assert_eq!(max, 20.0);
        }
        other => panic!("expected out of range score, got {other:?}"),
    }

    assert!(matches!(
        guard.check_subjects(&[subject("Math", f64::NAN, 1.0)]),
        Err(ValidationError::ScoreOutOfRange { .. })
    ));
}

#[test]
fn guard_rejects_non_positive_coefficients() {
    match guard().check_subjects(&[subject("Physics", 14.0, 0.0)]) {
        Err(ValidationError::InvalidCoefficient {
            subject,
            coefficient,
        }) => {
            assert_eq!(subject, "Physics");
            assert_eq!(coefficient, 0.0);
        }
        other => panic!("expected invalid coefficient, got {other:?}"),
    }
}

#[test]
fn academic_year_accepts_single_and_consecutive_years() {
    assert!(check_academic_year("2024").is_ok());
    assert!(check_academic_year("2023-2024").is_ok());
    assert!(check_academic_year(" 2024-2025 ").is_ok());
}

#[test]
fn academic_year_rejects_malformed_values() {
    for raw in ["", "24", "2024-2026", "2024-2023", "2024/2025", "abcd", "2024-"] {
        assert_eq!(
            check_academic_year(raw),
            Err(ValidationError::InvalidAcademicYear(raw.to_string())),
            "{raw} should be rejected"
        );
    }
}
