use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for stored assessment records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssessmentId(pub String);

/// Identifier of the student an assessment or application belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudentId(pub String);

impl fmt::Display for AssessmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Examination family an assessment record was produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssessmentType {
    #[serde(rename = "DAEU")]
    Daeu,
    #[serde(rename = "Baccalaureat", alias = "Baccalauréat")]
    Baccalaureat,
    #[serde(rename = "BTS")]
    Bts,
    #[serde(rename = "DUT")]
    Dut,
    #[serde(rename = "CPGE")]
    Cpge,
}

impl AssessmentType {
    pub const ALL: [AssessmentType; 5] = [
        AssessmentType::Daeu,
        AssessmentType::Baccalaureat,
        AssessmentType::Bts,
        AssessmentType::Dut,
        AssessmentType::Cpge,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            AssessmentType::Daeu => "DAEU",
            AssessmentType::Baccalaureat => "Baccalaureat",
            AssessmentType::Bts => "BTS",
            AssessmentType::Dut => "DUT",
            AssessmentType::Cpge => "CPGE",
        }
    }
}

/// Study track; only the science track carries the mathematics requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StudentTrack {
    Science,
    Arts,
    Technical,
    General,
}

/// One enrolled subject with its score on the 0–20 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectScore {
    pub subject_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_code: Option<String>,
    pub score: f64,
    #[serde(default = "default_coefficient")]
    pub coefficient: f64,
    #[serde(default)]
    pub is_mandatory: bool,
}

fn default_coefficient() -> f64 {
    1.0
}

impl SubjectScore {
    pub fn new(subject_name: impl Into<String>, score: f64, coefficient: f64) -> Self {
        Self {
            subject_name: subject_name.into(),
            subject_code: None,
            score,
            coefficient,
            is_mandatory: false,
        }
    }
}

/// Aggregated view over the enrolled subjects.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OverallPerformance {
    pub total_points: f64,
    pub total_coefficients: f64,
    pub average_score: f64,
    pub weighted_average: f64,
}

/// Outcome flags derived by the criteria evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssessmentResults {
    pub meets_average_requirement: bool,
    pub meets_french_requirement: bool,
    pub meets_math_requirement: bool,
    pub meets_minimum_criteria: bool,
    pub is_exceptional_case: bool,
    pub eligible_for_scholarship: bool,
}

/// Placement priority for advanced programmes (BTS/DUT/CPGE).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancedProgramme {
    pub is_priority: bool,
    pub programme_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_details: Option<String>,
}

impl Default for AdvancedProgramme {
    fn default() -> Self {
        Self {
            is_priority: false,
            programme_type: NOT_APPLICABLE.to_string(),
            acceptance_details: None,
        }
    }
}

pub(crate) const NOT_APPLICABLE: &str = "N/A";

/// Board decision state for an exceptional case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NstbApproval {
    #[default]
    #[serde(rename = "N/A")]
    NotApplicable,
    Pending,
    Approved,
    Rejected,
}

impl NstbApproval {
    pub const fn label(self) -> &'static str {
        match self {
            NstbApproval::NotApplicable => "N/A",
            NstbApproval::Pending => "Pending",
            NstbApproval::Approved => "Approved",
            NstbApproval::Rejected => "Rejected",
        }
    }

    pub const fn is_decided(self) -> bool {
        matches!(self, NstbApproval::Approved | NstbApproval::Rejected)
    }
}

impl fmt::Display for NstbApproval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Review trail for students flagged with a strong average but a failing French score.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExceptionalCircumstances {
    pub has_exceptional_case: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub french_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_date: Option<DateTime<Utc>>,
    pub nstb_approval: NstbApproval,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_notes: Option<String>,
    /// Decisions on earlier exceptional cases of this record, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub superseded_reviews: Vec<SupersededReview>,
}

/// Board decision that no longer applies because the record was flagged again later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupersededReview {
    pub decision: NstbApproval,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub french_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_notes: Option<String>,
}

/// Per student, per academic year assessment record. Everything below `subjects_enrolled`
/// is derived by the evaluation engine and overwritten on every evaluation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: AssessmentId,
    pub student_id: StudentId,
    pub academic_year: String,
    pub assessment_type: AssessmentType,
    pub student_track: StudentTrack,
    pub subjects_enrolled: Vec<SubjectScore>,
    pub overall_performance: OverallPerformance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub french_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mathematics_score: Option<f64>,
    pub assessment_results: AssessmentResults,
    pub advanced_programme: AdvancedProgramme,
    pub exceptional_circumstances: ExceptionalCircumstances,
}

/// Client supplied fields for a new assessment. Derived fields are never accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSubmission {
    pub student_id: StudentId,
    pub academic_year: String,
    pub assessment_type: AssessmentType,
    pub student_track: StudentTrack,
    pub subjects_enrolled: Vec<SubjectScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exceptional_justification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_details: Option<String>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AssessmentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment_type: Option<AssessmentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_track: Option<StudentTrack>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subjects_enrolled: Option<Vec<SubjectScore>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exceptional_justification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_details: Option<String>,
}

/// Decision an administrator may record on a pending exceptional case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewOutcome {
    Approved,
    Rejected,
}

impl From<ReviewOutcome> for NstbApproval {
    fn from(value: ReviewOutcome) -> Self {
        match value {
            ReviewOutcome::Approved => NstbApproval::Approved,
            ReviewOutcome::Rejected => NstbApproval::Rejected,
        }
    }
}

/// Board review payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionalCaseReview {
    pub approval: ReviewOutcome,
    #[serde(default)]
    pub notes: String,
}

/// Portal roles relevant to the eligibility engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Teacher,
    Administrator,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Role::Student),
            "teacher" => Some(Role::Teacher),
            "admin" | "administrator" => Some(Role::Administrator),
            _ => None,
        }
    }
}

/// Authenticated caller passed into every mutating use case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    pub fn is_administrator(&self) -> bool {
        self.role == Role::Administrator
    }

    pub fn can_manage_assessments(&self) -> bool {
        matches!(self.role, Role::Teacher | Role::Administrator)
    }
}

/// Compact view used by listings and the command line demo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EligibilitySummaryView {
    pub assessment_id: AssessmentId,
    pub student_id: StudentId,
    pub academic_year: String,
    pub assessment_type: &'static str,
    pub weighted_average: f64,
    pub eligible_for_scholarship: bool,
    pub is_priority: bool,
    pub nstb_approval: &'static str,
    pub rationale: String,
}

impl Assessment {
    pub fn eligibility_rationale(&self) -> String {
        let results = &self.assessment_results;
        let approval = self.exceptional_circumstances.nstb_approval;

        if results.is_exceptional_case {
            return match approval {
                NstbApproval::Approved => {
                    "eligible through NSTB approved exceptional case".to_string()
                }
                NstbApproval::Rejected => "exceptional case rejected by NSTB".to_string(),
                NstbApproval::Pending | NstbApproval::NotApplicable => {
                    "exceptional case awaiting NSTB review".to_string()
                }
            };
        }

        if results.eligible_for_scholarship {
            return "meets scholarship criteria".to_string();
        }

        let mut unmet = Vec::new();
        if !results.meets_average_requirement {
            unmet.push("average");
        }
        if !results.meets_french_requirement {
            unmet.push("French");
        }
        if !results.meets_math_requirement {
            unmet.push("mathematics");
        }
        format!("not eligible: {} requirement not met", unmet.join(", "))
    }

    pub fn summary_view(&self) -> EligibilitySummaryView {
        EligibilitySummaryView {
            assessment_id: self.id.clone(),
            student_id: self.student_id.clone(),
            academic_year: self.academic_year.clone(),
            assessment_type: self.assessment_type.label(),
            weighted_average: self.overall_performance.weighted_average,
            eligible_for_scholarship: self.assessment_results.eligible_for_scholarship,
            is_priority: self.advanced_programme.is_priority,
            nstb_approval: self.exceptional_circumstances.nstb_approval.label(),
            rationale: self.eligibility_rationale(),
        }
    }
}
