use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::eligibility::domain::{
    Actor, Assessment, AssessmentId, AssessmentSubmission, AssessmentType, Role, StudentId,
    StudentTrack, SubjectScore,
};
use crate::eligibility::evaluation::{EvaluationConfig, EvaluationEngine};
use crate::eligibility::overseas::{
    AssessmentRegistry, OverseasStudent, OverseasStudentId, OverseasStudentService,
};
use crate::eligibility::repository::{
    AssessmentFilter, AssessmentRepository, GradeHistory, OverseasStudentRepository,
    RepositoryError, ScholarshipRepository,
};
use crate::eligibility::scholarship::{
    AcademicCriteria, ApplicationWindow, GradeRecord, ScholarshipCriteria, ScholarshipId,
    ScholarshipRegistration, ScholarshipService,
};
use crate::eligibility::service::AssessmentService;
use crate::eligibility::validation::AssessmentGuard;

pub(super) fn admin() -> Actor {
    Actor::new("nstb-board-01", Role::Administrator)
}

pub(super) fn teacher() -> Actor {
    Actor::new("teacher-07", Role::Teacher)
}

pub(super) fn student() -> Actor {
    Actor::new("student-42", Role::Student)
}

pub(super) fn review_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 15, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn subject(name: &str, score: f64, coefficient: f64) -> SubjectScore {
    SubjectScore::new(name, score, coefficient)
}

/// French 12, Math 15, History 13 on the science track.
pub(super) fn scenario_a_subjects() -> Vec<SubjectScore> {
    vec![
        subject("French", 12.0, 1.0),
        subject("Mathematics", 15.0, 1.0),
        subject("History", 13.0, 1.0),
    ]
}

/// French 8, Math 18 (coefficient 2), Physics 16: simple average 14, weighted 15.
pub(super) fn scenario_b_subjects() -> Vec<SubjectScore> {
    vec![
        subject("French", 8.0, 1.0),
        subject("Math", 18.0, 2.0),
        subject("Physics", 16.0, 1.0),
    ]
}

pub(super) fn submission(
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

/// Validated but not yet evaluated record.
pub(super) fn draft(
    assessment_type: AssessmentType,
    track: StudentTrack,
    subjects: Vec<SubjectScore>,
) -> Assessment {
    let mut submission = submission("S-draft", "2024", assessment_type, subjects);
    submission.student_track = track;
    AssessmentGuard::default()
        .assessment_from_submission(AssessmentId("asm-draft".to_string()), submission)
        .expect("draft submission is valid")
}

pub(super) fn engine() -> EvaluationEngine {
    EvaluationEngine::new(EvaluationConfig::standard())
}

pub(super) fn approx(left: f64, right: f64) -> bool {
    (left - right).abs() < 1e-9
}

pub(super) fn build_service() -> (AssessmentService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = AssessmentService::new(repository.clone(), EvaluationConfig::standard());
    (service, repository)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<AssessmentId, Assessment>>>,
}

impl AssessmentRepository for MemoryRepository {
    fn insert(&self, record: Assessment) -> Result<Assessment, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: Assessment) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &AssessmentId) -> Result<Option<Assessment>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find_by_student_year(
        &self,
        student_id: &StudentId,
        academic_year: &str,
    ) -> Result<Option<Assessment>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .find(|record| {
                record.student_id == *student_id && record.academic_year == academic_year
            })
            .cloned())
    }

    fn list(&self, filter: &AssessmentFilter) -> Result<Vec<Assessment>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    fn delete(&self, id: &AssessmentId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}

pub(super) struct UnavailableRepository;

impl AssessmentRepository for UnavailableRepository {
    fn insert(&self, _record: Assessment) -> Result<Assessment, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: Assessment) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &AssessmentId) -> Result<Option<Assessment>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_by_student_year(
        &self,
        _student_id: &StudentId,
        _academic_year: &str,
    ) -> Result<Option<Assessment>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _filter: &AssessmentFilter) -> Result<Vec<Assessment>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &AssessmentId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryOverseasRepository {
    records: Arc<Mutex<HashMap<OverseasStudentId, OverseasStudent>>>,
}

impl OverseasStudentRepository for MemoryOverseasRepository {
    fn insert(&self, record: OverseasStudent) -> Result<OverseasStudent, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: OverseasStudent) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &OverseasStudentId) -> Result<Option<OverseasStudent>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

pub(super) fn build_overseas_service() -> (
    OverseasStudentService<MemoryOverseasRepository>,
    AssessmentService<MemoryRepository>,
    Arc<MemoryOverseasRepository>,
) {
    let (assessments, repository) = build_service();
    let overseas = Arc::new(MemoryOverseasRepository::default());
    let service = OverseasStudentService::new(
        overseas.clone(),
        AssessmentRegistry::for_repository(repository),
    );
    (service, assessments, overseas)
}

#[derive(Default, Clone)]
pub(super) struct MemoryScholarships {
    records: Arc<Mutex<Vec<ScholarshipCriteria>>>,
}

impl MemoryScholarships {
    pub(super) fn deactivate(&self, id: &ScholarshipId) {
        let mut guard = self.records.lock().expect("scholarship mutex poisoned");
        if let Some(record) = guard.iter_mut().find(|record| record.id == *id) {
            record.is_active = false;
        }
    }
}

impl ScholarshipRepository for MemoryScholarships {
    fn insert(&self, record: ScholarshipCriteria) -> Result<ScholarshipCriteria, RepositoryError> {
        let mut guard = self.records.lock().expect("scholarship mutex poisoned");
        guard.push(record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ScholarshipId) -> Result<Option<ScholarshipCriteria>, RepositoryError> {
        let guard = self.records.lock().expect("scholarship mutex poisoned");
        Ok(guard.iter().find(|record| record.id == *id).cloned())
    }

    fn active(&self) -> Result<Vec<ScholarshipCriteria>, RepositoryError> {
        let guard = self.records.lock().expect("scholarship mutex poisoned");
        Ok(guard.iter().filter(|record| record.is_active).cloned().collect())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryGrades {
    grades: Arc<Mutex<HashMap<StudentId, Vec<GradeRecord>>>>,
}

impl MemoryGrades {
    pub(super) fn record(&self, student_id: &str, subject: &str, percentage: f64, gpa: f64) {
        self.grades
            .lock()
            .expect("grade mutex poisoned")
            .entry(StudentId(student_id.to_string()))
            .or_default()
            .push(GradeRecord {
                subject: subject.to_string(),
                percentage: Some(percentage),
                gpa: Some(gpa),
            });
    }
}

impl GradeHistory for MemoryGrades {
    fn grades_for(&self, student_id: &StudentId) -> Result<Vec<GradeRecord>, RepositoryError> {
        let guard = self.grades.lock().expect("grade mutex poisoned");
        Ok(guard.get(student_id).cloned().unwrap_or_default())
    }
}

pub(super) fn build_scholarship_service() -> (
    ScholarshipService<MemoryScholarships, MemoryGrades>,
    Arc<MemoryScholarships>,
    Arc<MemoryGrades>,
) {
    let scholarships = Arc::new(MemoryScholarships::default());
    let grades = Arc::new(MemoryGrades::default());
    let service = ScholarshipService::new(scholarships.clone(), grades.clone());
    (service, scholarships, grades)
}

pub(super) fn academic_year_window() -> ApplicationWindow {
    ApplicationWindow {
        opens_on: NaiveDate::from_ymd_opt(2024, 9, 1).expect("valid"),
        closes_on: NaiveDate::from_ymd_opt(2025, 3, 31).expect("valid"),
    }
}

pub(super) fn scholarship_registration(
    name: &str,
    minimum_gpa: Option<f64>,
    minimum_percentage: Option<f64>,
) -> ScholarshipRegistration {
    ScholarshipRegistration {
        name: name.to_string(),
        provider: Some("Ministry of Education".to_string()),
        academic_criteria: AcademicCriteria {
            minimum_gpa,
            minimum_percentage,
        },
        eligibility_criteria: Default::default(),
        application_window: academic_year_window(),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
