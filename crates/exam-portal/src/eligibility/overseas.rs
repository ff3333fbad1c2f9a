//! Overseas student applications and the linkage between externally received results and
//! the assessment records that decide scholarship eligibility.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{Actor, AssessmentId, AssessmentType, StudentId};
use super::repository::{AssessmentRepository, OverseasStudentRepository, RepositoryError};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OverseasStudentId(pub String);

impl fmt::Display for OverseasStudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Typed pointer to the assessment record holding an overseas student's results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "assessment_type", content = "id")]
pub enum LinkedAssessment {
    #[serde(rename = "DAEU")]
    Daeu(AssessmentId),
    Baccalaureat(AssessmentId),
    #[serde(rename = "BTS")]
    Bts(AssessmentId),
    #[serde(rename = "DUT")]
    Dut(AssessmentId),
    #[serde(rename = "CPGE")]
    Cpge(AssessmentId),
}

impl LinkedAssessment {
    pub fn new(assessment_type: AssessmentType, id: AssessmentId) -> Self {
        match assessment_type {
            AssessmentType::Daeu => LinkedAssessment::Daeu(id),
            AssessmentType::Baccalaureat => LinkedAssessment::Baccalaureat(id),
            AssessmentType::Bts => LinkedAssessment::Bts(id),
            AssessmentType::Dut => LinkedAssessment::Dut(id),
            AssessmentType::Cpge => LinkedAssessment::Cpge(id),
        }
    }

    pub fn assessment_type(&self) -> AssessmentType {
        match self {
            LinkedAssessment::Daeu(_) => AssessmentType::Daeu,
            LinkedAssessment::Baccalaureat(_) => AssessmentType::Baccalaureat,
            LinkedAssessment::Bts(_) => AssessmentType::Bts,
            LinkedAssessment::Dut(_) => AssessmentType::Dut,
            LinkedAssessment::Cpge(_) => AssessmentType::Cpge,
        }
    }

    pub fn id(&self) -> &AssessmentId {
        match self {
            LinkedAssessment::Daeu(id)
            | LinkedAssessment::Baccalaureat(id)
            | LinkedAssessment::Bts(id)
            | LinkedAssessment::Dut(id)
            | LinkedAssessment::Cpge(id) => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EligibilityStatus {
    #[default]
    #[serde(rename = "Pending Results")]
    PendingResults,
    Eligible,
    #[serde(rename = "Not Eligible")]
    NotEligible,
    Conditional,
}

impl EligibilityStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EligibilityStatus::PendingResults => "Pending Results",
            EligibilityStatus::Eligible => "Eligible",
            EligibilityStatus::NotEligible => "Not Eligible",
            EligibilityStatus::Conditional => "Conditional",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExaminationResults {
    pub results_received: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_on: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examination_centre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_assessment: Option<LinkedAssessment>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScholarshipApplication {
    pub eligibility_status: EligibilityStatus,
    pub is_eligible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligibility_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverseasStudent {
    pub id: OverseasStudentId,
    pub student_id: StudentId,
    pub full_name: String,
    pub country_of_residence: String,
    pub examination_results: ExaminationResults,
    pub scholarship_application: ScholarshipApplication,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverseasStudentRegistration {
    pub student_id: StudentId,
    pub full_name: String,
    pub country_of_residence: String,
    #[serde(default)]
    pub examination_centre: Option<String>,
}

/// Results received from an overseas centre together with the record they were entered into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExaminationResultsUpdate {
    pub received_on: NaiveDate,
    pub linked_assessment: LinkedAssessment,
}

/// Eligibility facts exposed by a linked record. `eligible_for_scholarship` may be absent
/// for sources that only track minimum criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedEligibility {
    pub student_id: StudentId,
    pub eligible_for_scholarship: Option<bool>,
    pub meets_minimum_criteria: bool,
}

/// Fetches the eligibility facts of one assessment kind.
pub trait LinkedAssessmentSource: Send + Sync {
    fn resolve(&self, id: &AssessmentId) -> Result<Option<LinkedEligibility>, RepositoryError>;
}

struct RepositoryAssessmentSource<R> {
    repository: Arc<R>,
    expected: AssessmentType,
}

impl<R> LinkedAssessmentSource for RepositoryAssessmentSource<R>
where
    R: AssessmentRepository,
{
    fn resolve(&self, id: &AssessmentId) -> Result<Option<LinkedEligibility>, RepositoryError> {
        let linked = self
            .repository
            .fetch(id)?
            .filter(|record| record.assessment_type == self.expected)
            .map(|record| LinkedEligibility {
                student_id: record.student_id,
                eligible_for_scholarship: Some(record.assessment_results.eligible_for_scholarship),
                meets_minimum_criteria: record.assessment_results.meets_minimum_criteria,
            });
        Ok(linked)
    }
}

/// Maps each assessment tag to the source able to dereference it.
#[derive(Clone, Default)]
pub struct AssessmentRegistry {
    sources: HashMap<AssessmentType, Arc<dyn LinkedAssessmentSource>>,
}

impl AssessmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every tag resolves through the shared assessment store; a stored record of a
    /// different type does not resolve.
    pub fn for_repository<R>(repository: Arc<R>) -> Self
    where
        R: AssessmentRepository + 'static,
    {
        let mut registry = Self::new();
        for assessment_type in AssessmentType::ALL {
            registry.register(
                assessment_type,
                Arc::new(RepositoryAssessmentSource {
                    repository: repository.clone(),
                    expected: assessment_type,
                }),
            );
        }
        registry
    }

    pub fn register(
        &mut self,
        assessment_type: AssessmentType,
        source: Arc<dyn LinkedAssessmentSource>,
    ) {
        self.sources.insert(assessment_type, source);
    }

    pub fn resolve(
        &self,
        link: &LinkedAssessment,
    ) -> Result<Option<LinkedEligibility>, RepositoryError> {
        match self.sources.get(&link.assessment_type()) {
            Some(source) => source.resolve(link.id()),
            None => Ok(None),
        }
    }
}

/// Result of one eligibility check on an overseas application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityDecision {
    pub status: EligibilityStatus,
    pub eligible: bool,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_at: Option<DateTime<Utc>>,
}

impl EligibilityDecision {
    pub fn apply_to(&self, application: &mut ScholarshipApplication) {
        application.eligibility_status = self.status;
        application.is_eligible = self.eligible;
        application.eligibility_reason = Some(self.reason.clone());
        if let Some(checked_at) = self.checked_at {
            application.last_checked = Some(checked_at);
        }
    }
}

pub(crate) const RESULTS_NOT_RECEIVED: &str = "Results not yet received";
pub(crate) const ASSESSMENT_PENDING_REVIEW: &str = "Assessment pending review";

/// Republishes linked assessment eligibility onto overseas applications.
#[derive(Clone)]
pub struct EligibilityAggregator {
    registry: AssessmentRegistry,
}

impl EligibilityAggregator {
    pub fn new(registry: AssessmentRegistry) -> Self {
        Self { registry }
    }

    /// Priority order: missing results, then an unresolved link, then the linked outcome.
    /// A link to another student's record counts as unresolved.
    pub fn assess(
        &self,
        student_id: &StudentId,
        results: &ExaminationResults,
        checked_at: DateTime<Utc>,
    ) -> Result<EligibilityDecision, RepositoryError> {
        if !results.results_received {
            return Ok(EligibilityDecision {
                status: EligibilityStatus::PendingResults,
                eligible: false,
                reason: RESULTS_NOT_RECEIVED.to_string(),
                checked_at: None,
            });
        }

        let resolved = match &results.linked_assessment {
            Some(link) => self
                .registry
                .resolve(link)?
                .filter(|linked| linked.student_id == *student_id),
            None => None,
        };

        let Some(linked) = resolved else {
            return Ok(EligibilityDecision {
                status: EligibilityStatus::Conditional,
                eligible: false,
                reason: ASSESSMENT_PENDING_REVIEW.to_string(),
                checked_at: None,
            });
        };

        let eligible = linked
            .eligible_for_scholarship
            .unwrap_or(linked.meets_minimum_criteria);

        Ok(EligibilityDecision {
            status: if eligible {
                EligibilityStatus::Eligible
            } else {
                EligibilityStatus::NotEligible
            },
            eligible,
            reason: if eligible {
                "Linked assessment meets scholarship criteria".to_string()
            } else {
                "Linked assessment does not meet minimum criteria".to_string()
            },
            checked_at: Some(checked_at),
        })
    }
}

static OVERSEAS_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_overseas_id() -> OverseasStudentId {
    let id = OVERSEAS_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    OverseasStudentId(format!("ovs-{id:06}"))
}

/// Service owning overseas applications and their eligibility status.
pub struct OverseasStudentService<O> {
    repository: Arc<O>,
    aggregator: EligibilityAggregator,
}

impl<O> OverseasStudentService<O>
where
    O: OverseasStudentRepository + 'static,
{
    pub fn new(repository: Arc<O>, registry: AssessmentRegistry) -> Self {
        Self {
            repository,
            aggregator: EligibilityAggregator::new(registry),
        }
    }

    pub fn register(
        &self,
        registration: OverseasStudentRegistration,
    ) -> Result<OverseasStudent, OverseasServiceError> {
        let record = OverseasStudent {
            id: next_overseas_id(),
            student_id: registration.student_id,
            full_name: registration.full_name,
            country_of_residence: registration.country_of_residence,
            examination_results: ExaminationResults {
                examination_centre: registration.examination_centre,
                ..ExaminationResults::default()
            },
            scholarship_application: ScholarshipApplication {
                eligibility_reason: Some(RESULTS_NOT_RECEIVED.to_string()),
                ..ScholarshipApplication::default()
            },
        };

        Ok(self.repository.insert(record)?)
    }

    pub fn get(&self, id: &OverseasStudentId) -> Result<OverseasStudent, OverseasServiceError> {
        self.load(id)
    }

    /// Mark results as received, link them, and refresh eligibility in the same write.
    pub fn record_results(
        &self,
        actor: &Actor,
        id: &OverseasStudentId,
        update: ExaminationResultsUpdate,
        checked_at: DateTime<Utc>,
    ) -> Result<OverseasStudent, OverseasServiceError> {
        if !actor.can_manage_assessments() {
            warn!(actor = %actor.id, role = ?actor.role, "rejected results entry");
            return Err(OverseasServiceError::Unauthorized {
                actor: actor.id.clone(),
            });
        }

        let mut record = self.load(id)?;
        record.examination_results.results_received = true;
        record.examination_results.received_on = Some(update.received_on);
        record.examination_results.linked_assessment = Some(update.linked_assessment);

        self.refresh(record, checked_at)
    }

    pub fn assess(
        &self,
        id: &OverseasStudentId,
        checked_at: DateTime<Utc>,
    ) -> Result<OverseasStudent, OverseasServiceError> {
        let record = self.load(id)?;
        self.refresh(record, checked_at)
    }

    fn refresh(
        &self,
        mut record: OverseasStudent,
        checked_at: DateTime<Utc>,
    ) -> Result<OverseasStudent, OverseasServiceError> {
        let decision = self
            .aggregator
            .assess(&record.student_id, &record.examination_results, checked_at)?;
        decision.apply_to(&mut record.scholarship_application);
        self.repository.update(record.clone())?;

        info!(
            overseas_student_id = %record.id,
            status = decision.status.label(),
            "overseas eligibility assessed"
        );
        Ok(record)
    }

    fn load(&self, id: &OverseasStudentId) -> Result<OverseasStudent, OverseasServiceError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| OverseasServiceError::NotFound(id.clone()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OverseasServiceError {
    #[error("overseas student {0} not found")]
    NotFound(OverseasStudentId),
    #[error("{actor} is not permitted to record examination results")]
    Unauthorized { actor: String },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl OverseasServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            OverseasServiceError::NotFound(_) => "not_found",
            OverseasServiceError::Unauthorized { .. } => "unauthorized",
            OverseasServiceError::Repository(error) => error.kind(),
        }
    }
}
