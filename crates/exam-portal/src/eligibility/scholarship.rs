//! Scholarship criteria records matched against a student's grade history. This rule set is
//! independent from the assessment thresholds and works on GPA and percentage averages.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{Actor, StudentId};
use super::repository::{GradeHistory, RepositoryError, ScholarshipRepository};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScholarshipId(pub String);

impl fmt::Display for ScholarshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric thresholds; an absent threshold is not checked.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AcademicCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_gpa: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_percentage: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u8,
    pub max: u8,
}

/// Qualitative criteria. Stored and returned, but the data needed to check them is not
/// available here, so they never cause a failure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EligibilityCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_range: Option<AgeRange>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nationalities: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub other_requirements: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationWindow {
    pub opens_on: NaiveDate,
    pub closes_on: NaiveDate,
}

impl ApplicationWindow {
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.opens_on <= day && day <= self.closes_on
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScholarshipCriteria {
    pub id: ScholarshipId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    pub academic_criteria: AcademicCriteria,
    #[serde(default)]
    pub eligibility_criteria: EligibilityCriteria,
    pub is_active: bool,
    pub application_window: ApplicationWindow,
}

impl ScholarshipCriteria {
    pub fn is_open_on(&self, day: NaiveDate) -> bool {
        self.is_active && self.application_window.contains(day)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScholarshipRegistration {
    pub name: String,
    #[serde(default)]
    pub provider: Option<String>,
    pub academic_criteria: AcademicCriteria,
    #[serde(default)]
    pub eligibility_criteria: EligibilityCriteria,
    pub application_window: ApplicationWindow,
}

/// One entry of a student's grade history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRecord {
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpa: Option<f64>,
}

/// Averages over the grade records carrying each value; 0.0 when none do.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GradeAverages {
    pub gpa: f64,
    pub percentage: f64,
}

impl GradeAverages {
    pub fn from_grades(grades: &[GradeRecord]) -> Self {
        Self {
            gpa: mean(grades.iter().filter_map(|grade| grade.gpa)),
            percentage: mean(grades.iter().filter_map(|grade| grade.percentage)),
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Result of matching one scholarship against one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScholarshipEligibility {
    pub scholarship_id: ScholarshipId,
    pub student_id: StudentId,
    pub eligible: bool,
    pub reasons: Vec<String>,
}

/// One reason per unmet numeric criterion.
pub fn unmet_criteria(criteria: &AcademicCriteria, averages: &GradeAverages) -> Vec<String> {
    let mut reasons = Vec::new();

    if let Some(minimum) = criteria.minimum_gpa {
        if averages.gpa < minimum {
            reasons.push(format!(
                "Minimum GPA of {:.2} required, student has {:.2}",
                minimum, averages.gpa
            ));
        }
    }

    if let Some(minimum) = criteria.minimum_percentage {
        if averages.percentage < minimum {
            reasons.push(format!(
                "Minimum percentage of {:.2}% required, student has {:.2}%",
                minimum, averages.percentage
            ));
        }
    }

    reasons
}

static SCHOLARSHIP_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_scholarship_id() -> ScholarshipId {
    let id = SCHOLARSHIP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ScholarshipId(format!("sch-{id:06}"))
}

pub struct ScholarshipService<S, G> {
    scholarships: Arc<S>,
    grades: Arc<G>,
}

impl<S, G> ScholarshipService<S, G>
where
    S: ScholarshipRepository + 'static,
    G: GradeHistory + 'static,
{
    pub fn new(scholarships: Arc<S>, grades: Arc<G>) -> Self {
        Self {
            scholarships,
            grades,
        }
    }

    pub fn register(
        &self,
        actor: &Actor,
        registration: ScholarshipRegistration,
    ) -> Result<ScholarshipCriteria, ScholarshipServiceError> {
        if !actor.is_administrator() {
            warn!(actor = %actor.id, role = ?actor.role, "rejected scholarship registration");
            return Err(ScholarshipServiceError::Unauthorized {
                actor: actor.id.clone(),
            });
        }

        let window = registration.application_window;
        if window.closes_on < window.opens_on {
            return Err(ScholarshipServiceError::InvalidWindow {
                opens_on: window.opens_on,
                closes_on: window.closes_on,
            });
        }

        let record = ScholarshipCriteria {
            id: next_scholarship_id(),
            name: registration.name,
            provider: registration.provider,
            academic_criteria: registration.academic_criteria,
            eligibility_criteria: registration.eligibility_criteria,
            is_active: true,
            application_window: window,
        };

        Ok(self.scholarships.insert(record)?)
    }

    pub fn get(&self, id: &ScholarshipId) -> Result<ScholarshipCriteria, ScholarshipServiceError> {
        self.scholarships
            .fetch(id)?
            .ok_or_else(|| ScholarshipServiceError::NotFound(id.clone()))
    }

    pub fn check(
        &self,
        scholarship_id: &ScholarshipId,
        student_id: &StudentId,
    ) -> Result<ScholarshipEligibility, ScholarshipServiceError> {
        let scholarship = self.get(scholarship_id)?;
        let averages = self.averages_for(student_id)?;
        Ok(evaluate(&scholarship, student_id, &averages))
    }

    /// Active scholarships open on `today` whose numeric criteria the student meets.
    pub fn eligible_scholarships(
        &self,
        student_id: &StudentId,
        today: NaiveDate,
    ) -> Result<Vec<ScholarshipCriteria>, ScholarshipServiceError> {
        let averages = self.averages_for(student_id)?;

        let eligible = self
            .scholarships
            .active()?
            .into_iter()
            .filter(|scholarship| scholarship.is_open_on(today))
            .filter(|scholarship| evaluate(scholarship, student_id, &averages).eligible)
            .collect();
        Ok(eligible)
    }

    fn averages_for(&self, student_id: &StudentId) -> Result<GradeAverages, RepositoryError> {
        let grades = self.grades.grades_for(student_id)?;
        let averages = GradeAverages::from_grades(&grades);
        debug!(
            student_id = %student_id,
            records = grades.len(),
            gpa = averages.gpa,
            percentage = averages.percentage,
            "grade history averaged"
        );
        Ok(averages)
    }
}

fn evaluate(
    scholarship: &ScholarshipCriteria,
    student_id: &StudentId,
    averages: &GradeAverages,
) -> ScholarshipEligibility {
    let reasons = unmet_criteria(&scholarship.academic_criteria, averages);
    ScholarshipEligibility {
        scholarship_id: scholarship.id.clone(),
        student_id: student_id.clone(),
        eligible: reasons.is_empty(),
        reasons,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScholarshipServiceError {
    #[error("scholarship {0} not found")]
    NotFound(ScholarshipId),
    #[error("{actor} is not permitted to register scholarships")]
    Unauthorized { actor: String },
    #[error("application window closes ({closes_on}) before it opens ({opens_on})")]
    InvalidWindow {
        opens_on: NaiveDate,
        closes_on: NaiveDate,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ScholarshipServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            ScholarshipServiceError::NotFound(_) => "not_found",
            ScholarshipServiceError::Unauthorized { .. } => "unauthorized",
            ScholarshipServiceError::InvalidWindow { .. } => "validation_error",
            ScholarshipServiceError::Repository(error) => error.kind(),
        }
    }
}
