use crate::infra::{
    parse_date, InMemoryAssessmentRepository, InMemoryGradeHistory, InMemoryOverseasRepository,
    InMemoryScholarshipRepository,
};
use chrono::{Local, NaiveDate, Utc};
use clap::Args;
use exam_portal::eligibility::{
    AcademicCriteria, Actor, ApplicationWindow, Assessment, AssessmentGuard, AssessmentId,
    AssessmentRegistry, AssessmentService, AssessmentServiceError, AssessmentSubmission,
    AssessmentType, AverageBasis, EligibilityCriteria, EvaluationConfig, EvaluationEngine,
    ExaminationResultsUpdate, ExceptionalCaseReview, GradeRecord, LinkedAssessment, NstbApproval,
    OverseasStudentRegistration, OverseasStudentService, ReviewOutcome, Role,
    ScholarshipRegistration, ScholarshipService, StudentId, StudentTrack, SubjectScore,
};
use exam_portal::error::AppError;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Path to an assessment submission encoded as JSON
    #[arg(long)]
    pub(crate) submission: PathBuf,
    /// Average used for the threshold rules: simple or weighted
    #[arg(long, default_value = "simple", value_parser = parse_basis)]
    pub(crate) average_basis: AverageBasis,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Academic year recorded on the sample assessments
    #[arg(long, default_value = "2024")]
    pub(crate) academic_year: String,
    /// Reference date for scholarship application windows (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Average used for the threshold rules: simple or weighted
    #[arg(long, default_value = "simple", value_parser = parse_basis)]
    pub(crate) average_basis: AverageBasis,
}

fn parse_basis(raw: &str) -> Result<AverageBasis, String> {
    AverageBasis::parse(raw).ok_or_else(|| format!("unknown average basis '{raw}'"))
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.submission)?;
    let submission: AssessmentSubmission = serde_json::from_str(&raw)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;

    let record = AssessmentGuard::default()
        .assessment_from_submission(AssessmentId("preview".to_string()), submission)
        .map_err(AssessmentServiceError::from)?;
    let engine =
        EvaluationEngine::new(EvaluationConfig::standard().with_average_basis(args.average_basis));
    let evaluated = engine.evaluate(record);

    render_assessment(&evaluated);
    let rendered = serde_json::to_string_pretty(&evaluated.summary_view())
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
    println!("{rendered}");
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        academic_year,
        today,
        average_basis,
    } = args;
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    let teacher = Actor::new("teacher-demo", Role::Teacher);
    let board = Actor::new("nstb-board-demo", Role::Administrator);

    let assessments_store = Arc::new(InMemoryAssessmentRepository::default());
    let assessments = AssessmentService::new(
        assessments_store.clone(),
        EvaluationConfig::standard().with_average_basis(average_basis),
    );

    println!("Scholarship eligibility demo ({academic_year}, {average_basis:?} average)");

    println!("\nScenario A: balanced science profile");
    let scenario_a = assessments.create(
        &teacher,
        sample_submission(
            "DEMO-A",
            &academic_year,
            AssessmentType::Daeu,
            vec![
                SubjectScore::new("French", 12.0, 1.0),
                SubjectScore::new("Mathematics", 15.0, 1.0),
                SubjectScore::new("History", 13.0, 1.0),
            ],
        ),
    )?;
    render_assessment(&scenario_a);

    println!("\nScenario B: strong average, failing French");
    let scenario_b = assessments.create(
        &teacher,
        sample_submission(
            "DEMO-B",
            &academic_year,
            AssessmentType::Cpge,
            vec![
                SubjectScore::new("French", 8.0, 1.0),
                SubjectScore::new("Math", 18.0, 2.0),
                SubjectScore::new("Physics", 16.0, 1.0),
            ],
        ),
    )?;
    render_assessment(&scenario_b);

    let pending = assessments.exceptional_cases(NstbApproval::Pending)?;
    println!("  exceptional cases awaiting review: {}", pending.len());
    let reviewed = assessments.review_exceptional_case(
        &board,
        &scenario_b.id,
        ExceptionalCaseReview {
            approval: ReviewOutcome::Approved,
            notes: "Approved at demo board session".to_string(),
        },
        Utc::now(),
    )?;
    println!("  after NSTB approval:");
    render_assessment(&reviewed);

    println!("\nScenario C: priority programme placement");
    let scenario_c = assessments.create(
        &teacher,
        sample_submission(
            "DEMO-C",
            &academic_year,
            AssessmentType::Bts,
            vec![
                SubjectScore::new("French", 12.0, 1.0),
                SubjectScore::new("Mathematics", 15.0, 1.0),
                SubjectScore::new("History", 13.0, 1.0),
            ],
        ),
    )?;
    render_assessment(&scenario_c);
    let priority = assessments.priority_students(Some(academic_year.clone()))?;
    println!("  priority students: {}", priority.len());
    for record in &priority {
        println!(
            "    - {} ({}) weighted {:.2}",
            record.student_id,
            record.advanced_programme.programme_type,
            record.overall_performance.weighted_average
        );
    }

    println!("\nScenario D: overseas applicant");
    let overseas = OverseasStudentService::new(
        Arc::new(InMemoryOverseasRepository::default()),
        AssessmentRegistry::for_repository(assessments_store),
    );
    let applicant = overseas.register(OverseasStudentRegistration {
        student_id: StudentId("DEMO-A".to_string()),
        full_name: "Demo Applicant".to_string(),
        country_of_residence: "Madagascar".to_string(),
        examination_centre: Some("Antananarivo".to_string()),
    })?;
    println!(
        "  on registration: {}",
        applicant.scholarship_application.eligibility_status.label()
    );
    let linked = overseas.record_results(
        &teacher,
        &applicant.id,
        ExaminationResultsUpdate {
            received_on: today,
            linked_assessment: LinkedAssessment::new(
                scenario_a.assessment_type,
                scenario_a.id.clone(),
            ),
        },
        Utc::now(),
    )?;
    println!(
        "  after results: {} ({})",
        linked.scholarship_application.eligibility_status.label(),
        linked
            .scholarship_application
            .eligibility_reason
            .as_deref()
            .unwrap_or_default()
    );

    println!("\nScenario E: duplicate submission");
    match assessments.create(
        &teacher,
        sample_submission(
            "DEMO-A",
            &academic_year,
            AssessmentType::Daeu,
            vec![SubjectScore::new("French", 10.0, 1.0)],
        ),
    ) {
        Err(error @ AssessmentServiceError::DuplicateRecord { .. }) => {
            println!("  rejected: {error}");
        }
        Err(error) => return Err(error.into()),
        Ok(record) => println!("  unexpectedly stored {}", record.id),
    }

    println!("\nScholarship matching");
    run_scholarship_matching(&board, today)?;

    Ok(())
}

fn run_scholarship_matching(board: &Actor, today: NaiveDate) -> Result<(), AppError> {
    let grades = Arc::new(InMemoryGradeHistory::default());
    let student = StudentId("DEMO-A".to_string());
    for (subject, percentage, gpa) in [("Mathematics", 81.0, 3.4), ("French", 66.0, 2.7)] {
        grades
            .record(
                &student,
                GradeRecord {
                    subject: subject.to_string(),
                    percentage: Some(percentage),
                    gpa: Some(gpa),
                },
            )
            .map_err(AssessmentServiceError::from)?;
    }

    let scholarships = ScholarshipService::new(
        Arc::new(InMemoryScholarshipRepository::default()),
        grades,
    );
    let window = ApplicationWindow {
        opens_on: today - chrono::Duration::days(30),
        closes_on: today + chrono::Duration::days(60),
    };

    let mut registered = Vec::new();
    for (name, minimum_gpa, minimum_percentage) in [
        ("Regional merit award", Some(3.0), Some(70.0)),
        ("National excellence grant", Some(3.5), None),
    ] {
        registered.push(scholarships.register(
            board,
            ScholarshipRegistration {
                name: name.to_string(),
                provider: Some("Ministry of Education".to_string()),
                academic_criteria: AcademicCriteria {
                    minimum_gpa,
                    minimum_percentage,
                },
                eligibility_criteria: EligibilityCriteria::default(),
                application_window: window,
            },
        )?);
    }

    for scholarship in &registered {
        let outcome = scholarships.check(&scholarship.id, &student)?;
        let verdict = if outcome.eligible { "eligible" } else { "not eligible" };
        println!("  {}: {verdict}", scholarship.name);
        for reason in &outcome.reasons {
            println!("    - {reason}");
        }
    }

    let open = scholarships.eligible_scholarships(&student, today)?;
    println!("  open scholarships for {student}: {}", open.len());
    Ok(())
}

fn sample_submission(
    student_id: &str,
    academic_year: &str,
    assessment_type: AssessmentType,
    subjects: Vec<SubjectScore>,
) -> AssessmentSubmission {
    AssessmentSubmission {
        student_id: StudentId(student_id.to_string()),
        academic_year: academic_year.to_string(),
        assessment_type,
        student_track: StudentTrack::Science,
        subjects_enrolled: subjects,
        exceptional_justification: None,
        acceptance_details: None,
    }
}

fn render_assessment(record: &Assessment) {
    let performance = &record.overall_performance;
    println!(
        "  {} {} [{}] average {:.2}, weighted {:.2}",
        record.student_id,
        record.academic_year,
        record.assessment_type.label(),
        performance.average_score,
        performance.weighted_average
    );
    println!(
        "  French {} | Mathematics {}",
        format_score(record.french_score),
        format_score(record.mathematics_score)
    );
    println!(
        "  eligible: {} | priority: {} ({}) | NSTB: {}",
        record.assessment_results.eligible_for_scholarship,
        record.advanced_programme.is_priority,
        record.advanced_programme.programme_type,
        record.exceptional_circumstances.nstb_approval
    );
    println!("  {}", record.eligibility_rationale());
}

fn format_score(score: Option<f64>) -> String {
    score
        .map(|value| format!("{value:.2}"))
        .unwrap_or_else(|| "missing".to_string())
}
