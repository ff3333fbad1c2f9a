//! Scholarship eligibility engine: assessment evaluation, exceptional-case review,
//! overseas result linkage, and scholarship criteria matching.

pub mod domain;
pub mod evaluation;
pub mod overseas;
pub mod repository;
pub mod router;
pub mod scholarship;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    Actor, AdvancedProgramme, Assessment, AssessmentId, AssessmentResults, AssessmentSubmission,
    AssessmentType, AssessmentUpdate, EligibilitySummaryView, ExceptionalCaseReview,
    ExceptionalCircumstances, NstbApproval, OverallPerformance, ReviewOutcome, Role, StudentId,
    StudentTrack, SubjectScore, SupersededReview,
};
pub use evaluation::{AverageBasis, EvaluationConfig, EvaluationEngine, WorkflowError};
pub use overseas::{
    AssessmentRegistry, EligibilityAggregator, EligibilityDecision, EligibilityStatus,
    ExaminationResults, ExaminationResultsUpdate, LinkedAssessment, LinkedAssessmentSource,
    LinkedEligibility, OverseasServiceError, OverseasStudent, OverseasStudentId,
    OverseasStudentRegistration, OverseasStudentService, ScholarshipApplication,
};
pub use repository::{
    AssessmentFilter, AssessmentRepository, GradeHistory, OverseasStudentRepository,
    RepositoryError, ScholarshipRepository,
};
pub use router::{assessment_router, overseas_router, scholarship_router};
pub use scholarship::{
    AcademicCriteria, AgeRange, ApplicationWindow, EligibilityCriteria, GradeAverages,
    GradeRecord, ScholarshipCriteria, ScholarshipEligibility, ScholarshipId,
    ScholarshipRegistration, ScholarshipService, ScholarshipServiceError,
};
pub use service::{AssessmentService, AssessmentServiceError};
pub use validation::{AssessmentGuard, ValidationError};
