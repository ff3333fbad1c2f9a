use super::super::domain::{AdvancedProgramme, AssessmentType, NOT_APPLICABLE};
use super::config::EvaluationConfig;

/// Must run after the criteria have been resolved for the same pass.
pub(crate) fn classify(
    assessment_type: AssessmentType,
    meets_minimum_criteria: bool,
    acceptance_details: Option<String>,
    config: &EvaluationConfig,
) -> AdvancedProgramme {
    let applicable = config.is_priority_programme(assessment_type);

    AdvancedProgramme {
        is_priority: applicable && meets_minimum_criteria,
        programme_type: if applicable {
            assessment_type.label().to_string()
        } else {
            NOT_APPLICABLE.to_string()
        },
        acceptance_details,
    }
}
