mod config;
mod priority;
mod rules;
mod scores;
mod workflow;

pub use config::{AverageBasis, EvaluationConfig};
pub use scores::{aggregate, find_subject_score, french_score, mathematics_score};
pub use workflow::{review, WorkflowError};

use super::domain::{Assessment, OverallPerformance};

/// Stateless evaluator that recomputes every derived field of an assessment.
#[derive(Debug, Clone, Default)]
pub struct EvaluationEngine {
    config: EvaluationConfig,
}

impl EvaluationEngine {
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Full evaluation pass: aggregation, subject extraction, criteria, exceptional-case
    /// flagging and priority classification, in that order.
    pub fn evaluate(&self, mut assessment: Assessment) -> Assessment {
        let performance = aggregate(&assessment.subjects_enrolled).unwrap_or_default();
        let french = french_score(&assessment.subjects_enrolled);
        let mathematics = mathematics_score(&assessment.subjects_enrolled);
        let average = self.basis_average(&performance);

        let signals = rules::requirement_signals(
            average,
            french,
            mathematics,
            assessment.student_track,
            &self.config,
        );

        workflow::sync_flag(
            &mut assessment.exceptional_circumstances,
            signals.is_exceptional,
            average,
            french,
        );

        let results = rules::resolve_results(
            signals,
            assessment.exceptional_circumstances.nstb_approval,
        );

        assessment.advanced_programme = priority::classify(
            assessment.assessment_type,
            results.meets_minimum_criteria,
            assessment.advanced_programme.acceptance_details.take(),
            &self.config,
        );

        assessment.overall_performance = performance;
        assessment.french_score = french;
        assessment.mathematics_score = mathematics;
        assessment.assessment_results = results;
        assessment
    }

    fn basis_average(&self, performance: &OverallPerformance) -> f64 {
        match self.config.average_basis {
            AverageBasis::Simple => performance.average_score,
            AverageBasis::Weighted => performance.weighted_average,
        }
    }
}
