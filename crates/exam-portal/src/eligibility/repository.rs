use serde::{Deserialize, Serialize};

use super::domain::{Assessment, AssessmentId, AssessmentType, NstbApproval, StudentId};
use super::overseas::{OverseasStudent, OverseasStudentId};
use super::scholarship::{GradeRecord, ScholarshipCriteria, ScholarshipId};

/// Storage abstraction for assessment records so the service can run without a database.
pub trait AssessmentRepository: Send + Sync {
    fn insert(&self, record: Assessment) -> Result<Assessment, RepositoryError>;
    fn update(&self, record: Assessment) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &AssessmentId) -> Result<Option<Assessment>, RepositoryError>;
    fn find_by_student_year(
        &self,
        student_id: &StudentId,
        academic_year: &str,
    ) -> Result<Option<Assessment>, RepositoryError>;
    fn list(&self, filter: &AssessmentFilter) -> Result<Vec<Assessment>, RepositoryError>;
    fn delete(&self, id: &AssessmentId) -> Result<(), RepositoryError>;
}

/// Storage for overseas student applications.
pub trait OverseasStudentRepository: Send + Sync {
    fn insert(&self, record: OverseasStudent) -> Result<OverseasStudent, RepositoryError>;
    fn update(&self, record: OverseasStudent) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &OverseasStudentId) -> Result<Option<OverseasStudent>, RepositoryError>;
}

/// Storage for externally defined scholarship rule sets.
pub trait ScholarshipRepository: Send + Sync {
    fn insert(&self, record: ScholarshipCriteria) -> Result<ScholarshipCriteria, RepositoryError>;
    fn fetch(&self, id: &ScholarshipId) -> Result<Option<ScholarshipCriteria>, RepositoryError>;
    fn active(&self) -> Result<Vec<ScholarshipCriteria>, RepositoryError>;
}

/// Read-only access to a student's grade history, owned by another part of the portal.
pub trait GradeHistory: Send + Sync {
    fn grades_for(&self, student_id: &StudentId) -> Result<Vec<GradeRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub const fn kind(&self) -> &'static str {
        match self {
            RepositoryError::Conflict => "duplicate_record",
            RepositoryError::NotFound => "not_found",
            RepositoryError::Unavailable(_) => "repository_unavailable",
        }
    }
}

/// Query criteria for listing assessments. Every populated field must match.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AssessmentFilter {
    #[serde(default)]
    pub min_average: Option<f64>,
    #[serde(default)]
    pub assessment_type: Option<AssessmentType>,
    #[serde(default)]
    pub eligible_only: bool,
    #[serde(default)]
    pub priority_only: bool,
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default)]
    pub exceptional_status: Option<NstbApproval>,
}

impl AssessmentFilter {
    pub fn priority_students(academic_year: Option<String>) -> Self {
        Self {
            eligible_only: true,
            priority_only: true,
            academic_year,
            ..Self::default()
        }
    }

    pub fn exceptional_cases(status: NstbApproval) -> Self {
        Self {
            exceptional_status: Some(status),
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &Assessment) -> bool {
        if let Some(min_average) = self.min_average {
            if record.overall_performance.weighted_average < min_average {
                return false;
            }
        }

        if let Some(assessment_type) = self.assessment_type {
            if record.assessment_type != assessment_type {
                return false;
            }
        }

        if self.eligible_only && !record.assessment_results.eligible_for_scholarship {
            return false;
        }

        if self.priority_only && !record.advanced_programme.is_priority {
            return false;
        }

        if let Some(year) = &self.academic_year {
            if record.academic_year != *year {
                return false;
            }
        }

        if let Some(status) = self.exceptional_status {
            let circumstances = &record.exceptional_circumstances;
            if !circumstances.has_exceptional_case || circumstances.nstb_approval != status {
                return false;
            }
        }

        true
    }
}
