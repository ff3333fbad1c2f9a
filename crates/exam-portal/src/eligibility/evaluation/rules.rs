use super::super::domain::{AssessmentResults, NstbApproval, StudentTrack};
use super::config::EvaluationConfig;

/// Threshold checks that do not depend on the board decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RequirementSignals {
    pub meets_average: bool,
    pub meets_french: bool,
    pub meets_math: bool,
    pub is_exceptional: bool,
}

pub(crate) fn requirement_signals(
    average: f64,
    french: Option<f64>,
    mathematics: Option<f64>,
    track: StudentTrack,
    config: &EvaluationConfig,
) -> RequirementSignals {
    let meets_average = average >= config.minimum_average;

    // A missing French subject fails the requirement but never opens an exceptional case.
    let meets_french = french
        .map(|score| score >= config.minimum_french)
        .unwrap_or(false);

    let meets_math = match track {
        StudentTrack::Science => mathematics
            .map(|score| score >= config.minimum_mathematics)
            .unwrap_or(false),
        StudentTrack::Arts | StudentTrack::Technical | StudentTrack::General => true,
    };

    let is_exceptional = average >= config.exceptional_average
        && french
            .map(|score| score < config.minimum_french)
            .unwrap_or(false);

    RequirementSignals {
        meets_average,
        meets_french,
        meets_math,
        is_exceptional,
    }
}

pub(crate) fn resolve_results(
    signals: RequirementSignals,
    approval: NstbApproval,
) -> AssessmentResults {
    let approved = approval == NstbApproval::Approved;

    let meets_minimum_criteria = if signals.is_exceptional {
        approved
    } else {
        signals.meets_average && signals.meets_french && signals.meets_math
    };

    let eligible_for_scholarship = meets_minimum_criteria || (signals.is_exceptional && approved);

    AssessmentResults {
        meets_average_requirement: signals.meets_average,
        meets_french_requirement: signals.meets_french,
        meets_math_requirement: signals.meets_math,
        meets_minimum_criteria,
        is_exceptional_case: signals.is_exceptional,
        eligible_for_scholarship,
    }
}
