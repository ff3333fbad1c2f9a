use chrono::NaiveDate;
use exam_portal::eligibility::{
    Assessment, AssessmentFilter, AssessmentId, AssessmentRepository, GradeHistory, GradeRecord,
    OverseasStudent, OverseasStudentId, OverseasStudentRepository, RepositoryError,
    ScholarshipCriteria, ScholarshipId, ScholarshipRepository, StudentId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, store: &str) -> Result<MutexGuard<'a, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable(format!("{store} lock poisoned")))
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAssessmentRepository {
    records: Arc<Mutex<HashMap<AssessmentId, Assessment>>>,
}

impl AssessmentRepository for InMemoryAssessmentRepository {
    fn insert(&self, record: Assessment) -> Result<Assessment, RepositoryError> {
        let mut guard = lock(&self.records, "assessment store")?;
        let duplicate = guard.values().any(|existing| {
            existing.student_id == record.student_id
                && existing.academic_year == record.academic_year
        });
        if duplicate || guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: Assessment) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records, "assessment store")?;
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &AssessmentId) -> Result<Option<Assessment>, RepositoryError> {
        let guard = lock(&self.records, "assessment store")?;
        Ok(guard.get(id).cloned())
    }

    fn find_by_student_year(
        &self,
        student_id: &StudentId,
        academic_year: &str,
    ) -> Result<Option<Assessment>, RepositoryError> {
        let guard = lock(&self.records, "assessment store")?;
        Ok(guard
            .values()
            .find(|record| {
                record.student_id == *student_id && record.academic_year == academic_year
            })
            .cloned())
    }

    fn list(&self, filter: &AssessmentFilter) -> Result<Vec<Assessment>, RepositoryError> {
        let guard = lock(&self.records, "assessment store")?;
        Ok(guard
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    fn delete(&self, id: &AssessmentId) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records, "assessment store")?;
        guard
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryOverseasRepository {
    records: Arc<Mutex<HashMap<OverseasStudentId, OverseasStudent>>>,
}

impl OverseasStudentRepository for InMemoryOverseasRepository {
    fn insert(&self, record: OverseasStudent) -> Result<OverseasStudent, RepositoryError> {
        let mut guard = lock(&self.records, "overseas store")?;
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: OverseasStudent) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records, "overseas store")?;
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &OverseasStudentId) -> Result<Option<OverseasStudent>, RepositoryError> {
        let guard = lock(&self.records, "overseas store")?;
        Ok(guard.get(id).cloned())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryScholarshipRepository {
    records: Arc<Mutex<HashMap<ScholarshipId, ScholarshipCriteria>>>,
}

impl ScholarshipRepository for InMemoryScholarshipRepository {
    fn insert(&self, record: ScholarshipCriteria) -> Result<ScholarshipCriteria, RepositoryError> {
        let mut guard = lock(&self.records, "scholarship store")?;
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ScholarshipId) -> Result<Option<ScholarshipCriteria>, RepositoryError> {
        let guard = lock(&self.records, "scholarship store")?;
        Ok(guard.get(id).cloned())
    }

    fn active(&self) -> Result<Vec<ScholarshipCriteria>, RepositoryError> {
        let guard = lock(&self.records, "scholarship store")?;
        let mut active: Vec<_> = guard
            .values()
            .filter(|record| record.is_active)
            .cloned()
            .collect();
        active.sort_by(|left, right| left.id.0.cmp(&right.id.0));
        Ok(active)
    }
}

/// Grade history owned by the portal's gradebook; kept in memory for the standalone service.
#[derive(Default, Clone)]
pub(crate) struct InMemoryGradeHistory {
    grades: Arc<Mutex<HashMap<StudentId, Vec<GradeRecord>>>>,
}

impl InMemoryGradeHistory {
    pub(crate) fn record(
        &self,
        student_id: &StudentId,
        grade: GradeRecord,
    ) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.grades, "grade history")?;
        guard.entry(student_id.clone()).or_default().push(grade);
        Ok(())
    }
}

impl GradeHistory for InMemoryGradeHistory {
    fn grades_for(&self, student_id: &StudentId) -> Result<Vec<GradeRecord>, RepositoryError> {
        let guard = lock(&self.grades, "grade history")?;
        Ok(guard.get(student_id).cloned().unwrap_or_default())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_portal::eligibility::{AssessmentType, StudentTrack};

    fn record(id: &str, student: &str, year: &str) -> Assessment {
        Assessment {
            id: AssessmentId(id.to_string()),
            student_id: StudentId(student.to_string()),
            academic_year: year.to_string(),
            assessment_type: AssessmentType::Daeu,
            student_track: StudentTrack::General,
            subjects_enrolled: Vec::new(),
            overall_performance: Default::default(),
            french_score: None,
            mathematics_score: None,
            assessment_results: Default::default(),
            advanced_programme: Default::default(),
            exceptional_circumstances: Default::default(),
        }
    }

    #[test]
    fn assessment_store_enforces_student_year_uniqueness() {
        let store = InMemoryAssessmentRepository::default();
        store.insert(record("asm-1", "S1", "2024")).expect("insert");

        assert!(matches!(
            store.insert(record("asm-2", "S1", "2024")),
            Err(RepositoryError::Conflict)
        ));
        store
            .insert(record("asm-3", "S1", "2025"))
            .expect("different year");
    }

    #[test]
    fn updates_require_existing_records() {
        let store = InMemoryAssessmentRepository::default();
        assert!(matches!(
            store.update(record("asm-9", "S9", "2024")),
            Err(RepositoryError::NotFound)
        ));
    }

    #[test]
    fn grade_history_defaults_to_empty() {
        let grades = InMemoryGradeHistory::default();
        let student = StudentId("S1".to_string());
        assert!(grades.grades_for(&student).expect("grades").is_empty());

        grades
            .record(
                &student,
                GradeRecord {
                    subject: "Math".to_string(),
                    percentage: Some(72.0),
                    gpa: None,
                },
            )
            .expect("record");
        assert_eq!(grades.grades_for(&student).expect("grades").len(), 1);
    }

    #[test]
    fn parse_date_reports_invalid_input() {
        assert_eq!(
            parse_date(" 2024-07-01 "),
            Ok(NaiveDate::from_ymd_opt(2024, 7, 1).expect("valid"))
        );
        assert!(parse_date("07/01/2024").is_err());
    }
}
