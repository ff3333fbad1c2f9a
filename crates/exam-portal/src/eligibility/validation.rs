use super::domain::{
    AdvancedProgramme, Assessment, AssessmentId, AssessmentResults, AssessmentSubmission,
    ExceptionalCircumstances, OverallPerformance, StudentId, SubjectScore,
};

/// Write-boundary rejections. The evaluation engine itself never clamps scores.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("student id must not be blank")]
    MissingStudentId,
    #[error("academic year '{0}' must be YYYY or YYYY-YYYY with consecutive years")]
    InvalidAcademicYear(String),
    #[error("at least one enrolled subject is required")]
    NoSubjects,
    #[error("subject at position {index} has a blank name")]
    BlankSubjectName { index: usize },
    #[error("score {score} for '{subject}' is outside 0-{max}")]
    ScoreOutOfRange { subject: String, score: f64, max: f64 },
    #[error("coefficient {coefficient} for '{subject}' must be positive")]
    InvalidCoefficient { subject: String, coefficient: f64 },
}

const DEFAULT_MAX_SCORE: f64 = 20.0;

/// Guard responsible for producing well-formed, not yet evaluated `Assessment` values.
#[derive(Debug, Clone)]
pub struct AssessmentGuard {
    max_score: f64,
}

impl Default for AssessmentGuard {
    fn default() -> Self {
        Self {
            max_score: DEFAULT_MAX_SCORE,
        }
    }
}

impl AssessmentGuard {
    pub fn max_score(&self) -> f64 {
        self.max_score
    }

    /// Convert an inbound submission into a record with empty derived fields.
    pub fn assessment_from_submission(
        &self,
        id: AssessmentId,
        submission: AssessmentSubmission,
    ) -> Result<Assessment, ValidationError> {
        if submission.student_id.0.trim().is_empty() {
            return Err(ValidationError::MissingStudentId);
        }
        check_academic_year(&submission.academic_year)?;
        self.check_subjects(&submission.subjects_enrolled)?;

        Ok(Assessment {
            id,
            student_id: StudentId(submission.student_id.0.trim().to_string()),
            academic_year: submission.academic_year.trim().to_string(),
            assessment_type: submission.assessment_type,
            student_track: submission.student_track,
            subjects_enrolled: submission.subjects_enrolled,
            overall_performance: OverallPerformance::default(),
            french_score: None,
            mathematics_score: None,
            assessment_results: AssessmentResults::default(),
            advanced_programme: AdvancedProgramme {
                acceptance_details: submission.acceptance_details,
                ..AdvancedProgramme::default()
            },
            exceptional_circumstances: ExceptionalCircumstances {
                justification: submission.exceptional_justification,
                ..ExceptionalCircumstances::default()
            },
        })
    }

    pub fn check_subjects(&self, subjects: &[SubjectScore]) -> Result<(), ValidationError> {
        if subjects.is_empty() {
            return Err(ValidationError::NoSubjects);
        }

        for (index, subject) in subjects.iter().enumerate() {
            if subject.subject_name.trim().is_empty() {
                return Err(ValidationError::BlankSubjectName { index });
            }
            if !subject.score.is_finite() || subject.score < 0.0 || subject.score > self.max_score
            {
                return Err(ValidationError::ScoreOutOfRange {
                    subject: subject.subject_name.clone(),
                    score: subject.score,
                    max: self.max_score,
                });
            }
            if !subject.coefficient.is_finite() || subject.coefficient <= 0.0 {
                return Err(ValidationError::InvalidCoefficient {
                    subject: subject.subject_name.clone(),
                    coefficient: subject.coefficient,
                });
            }
        }

        Ok(())
    }
}

pub fn check_academic_year(raw: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidAcademicYear(raw.to_string());
    let trimmed = raw.trim();

    let parse_year = |part: &str| -> Option<u16> {
        if part.len() == 4 && part.chars().all(|c| c.is_ascii_digit()) {
            part.parse().ok()
        } else {
            None
        }
    };

    match trimmed.split_once('-') {
        None => parse_year(trimmed).map(|_| ()).ok_or_else(invalid),
        Some((start, end)) => {
            let start = parse_year(start).ok_or_else(invalid)?;
            let end = parse_year(end).ok_or_else(invalid)?;
            if end == start + 1 {
                Ok(())
            } else {
                Err(invalid())
            }
        }
    }
}
