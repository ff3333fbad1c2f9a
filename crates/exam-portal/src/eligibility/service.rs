use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::domain::{
    Actor, Assessment, AssessmentId, AssessmentSubmission, AssessmentUpdate,
    ExceptionalCaseReview, NstbApproval,
};
use super::evaluation::{self, EvaluationConfig, EvaluationEngine, WorkflowError};
use super::repository::{AssessmentFilter, AssessmentRepository, RepositoryError};
use super::validation::{AssessmentGuard, ValidationError};

/// Service composing validation, the evaluation engine, and assessment storage.
pub struct AssessmentService<R> {
    guard: Arc<AssessmentGuard>,
    repository: Arc<R>,
    engine: Arc<EvaluationEngine>,
}

static ASSESSMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_assessment_id() -> AssessmentId {
    let id = ASSESSMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AssessmentId(format!("asm-{id:06}"))
}

impl<R> AssessmentService<R>
where
    R: AssessmentRepository + 'static,
{
    pub fn new(repository: Arc<R>, config: EvaluationConfig) -> Self {
        Self {
            guard: Arc::new(AssessmentGuard::default()),
            repository,
            engine: Arc::new(EvaluationEngine::new(config)),
        }
    }

    pub fn engine(&self) -> &EvaluationEngine {
        &self.engine
    }

    /// Validate, evaluate and store a new assessment. One record per student and year.
    pub fn create(
        &self,
        actor: &Actor,
        submission: AssessmentSubmission,
    ) -> Result<Assessment, AssessmentServiceError> {
        authorize(actor, actor.can_manage_assessments(), "create assessments")?;

        let record = self
            .guard
            .assessment_from_submission(next_assessment_id(), submission)?;

        if self
            .repository
            .find_by_student_year(&record.student_id, &record.academic_year)?
            .is_some()
        {
            return Err(AssessmentServiceError::duplicate(&record));
        }

        let student_id = record.student_id.0.clone();
        let academic_year = record.academic_year.clone();
        let evaluated = self.engine.evaluate(record);
        let stored = self
            .repository
            .insert(evaluated)
            .map_err(|error| match error {
                RepositoryError::Conflict => AssessmentServiceError::DuplicateRecord {
                    student_id,
                    academic_year,
                },
                other => other.into(),
            })?;

        info!(
            assessment_id = %stored.id.0,
            student_id = %stored.student_id.0,
            eligible = stored.assessment_results.eligible_for_scholarship,
            "assessment created"
        );
        if stored.exceptional_circumstances.nstb_approval == NstbApproval::Pending {
            info!(assessment_id = %stored.id.0, "exceptional case flagged for NSTB review");
        }

        Ok(stored)
    }

    /// Merge a partial update and re-run the full evaluation.
    pub fn update(
        &self,
        actor: &Actor,
        id: &AssessmentId,
        update: AssessmentUpdate,
    ) -> Result<Assessment, AssessmentServiceError> {
        authorize(actor, actor.can_manage_assessments(), "update assessments")?;

        let mut record = self.load(id)?;

        if let Some(subjects) = update.subjects_enrolled {
            self.guard.check_subjects(&subjects)?;
            record.subjects_enrolled = subjects;
        }
        if let Some(assessment_type) = update.assessment_type {
            record.assessment_type = assessment_type;
        }
        if let Some(track) = update.student_track {
            record.student_track = track;
        }
        if let Some(justification) = update.exceptional_justification {
            record.exceptional_circumstances.justification = Some(justification);
        }
        if let Some(details) = update.acceptance_details {
            record.advanced_programme.acceptance_details = Some(details);
        }

        let evaluated = self.engine.evaluate(record);
        self.repository.update(evaluated.clone())?;
        Ok(evaluated)
    }

    /// Record the board decision on a pending exceptional case.
    pub fn review_exceptional_case(
        &self,
        actor: &Actor,
        id: &AssessmentId,
        review: ExceptionalCaseReview,
        reviewed_at: DateTime<Utc>,
    ) -> Result<Assessment, AssessmentServiceError> {
        authorize(actor, actor.is_administrator(), "review exceptional cases")?;

        let mut record = self.load(id)?;
        evaluation::review(
            &mut record.exceptional_circumstances,
            review.approval,
            &actor.id,
            review.notes,
            reviewed_at,
        )?;

        let evaluated = self.engine.evaluate(record);
        self.repository.update(evaluated.clone())?;

        info!(
            assessment_id = %evaluated.id.0,
            reviewer = %actor.id,
            decision = evaluated.exceptional_circumstances.nstb_approval.label(),
            "exceptional case reviewed"
        );
        Ok(evaluated)
    }

    pub fn get(&self, id: &AssessmentId) -> Result<Assessment, AssessmentServiceError> {
        self.load(id)
    }

    pub fn delete(&self, actor: &Actor, id: &AssessmentId) -> Result<(), AssessmentServiceError> {
        authorize(actor, actor.is_administrator(), "delete assessments")?;

        match self.repository.delete(id) {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(AssessmentServiceError::NotFound(id.clone())),
            Err(other) => Err(other.into()),
        }
    }

    /// Matching records ordered by weighted average, best first.
    pub fn list(
        &self,
        filter: &AssessmentFilter,
    ) -> Result<Vec<Assessment>, AssessmentServiceError> {
        let mut records = self.repository.list(filter)?;
        records.sort_by(|left, right| {
            right
                .overall_performance
                .weighted_average
                .total_cmp(&left.overall_performance.weighted_average)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(records)
    }

    pub fn priority_students(
        &self,
        academic_year: Option<String>,
    ) -> Result<Vec<Assessment>, AssessmentServiceError> {
        self.list(&AssessmentFilter::priority_students(academic_year))
    }

    pub fn exceptional_cases(
        &self,
        status: NstbApproval,
    ) -> Result<Vec<Assessment>, AssessmentServiceError> {
        self.list(&AssessmentFilter::exceptional_cases(status))
    }

    fn load(&self, id: &AssessmentId) -> Result<Assessment, AssessmentServiceError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| AssessmentServiceError::NotFound(id.clone()))
    }
}

fn authorize(
    actor: &Actor,
    allowed: bool,
    action: &'static str,
) -> Result<(), AssessmentServiceError> {
    if allowed {
        return Ok(());
    }

    warn!(actor = %actor.id, role = ?actor.role, action, "rejected unauthorized request");
    Err(AssessmentServiceError::Unauthorized {
        actor: actor.id.clone(),
        action,
    })
}

/// Error raised by the assessment service.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentServiceError {
    #[error("assessment {0} not found")]
    NotFound(AssessmentId),
    #[error("an assessment already exists for student {student_id} in {academic_year}")]
    DuplicateRecord {
        student_id: String,
        academic_year: String,
    },
    #[error(transparent)]
    InvalidState(#[from] WorkflowError),
    #[error("{actor} is not permitted to {action}")]
    Unauthorized { actor: String, action: &'static str },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AssessmentServiceError {
    fn duplicate(record: &Assessment) -> Self {
        Self::DuplicateRecord {
            student_id: record.student_id.0.clone(),
            academic_year: record.academic_year.clone(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AssessmentServiceError::NotFound(_) => "not_found",
            AssessmentServiceError::DuplicateRecord { .. } => "duplicate_record",
            AssessmentServiceError::InvalidState(_) => "invalid_state",
            AssessmentServiceError::Unauthorized { .. } => "unauthorized",
            AssessmentServiceError::Validation(_) => "validation_error",
            AssessmentServiceError::Repository(error) => error.kind(),
        }
    }
}
