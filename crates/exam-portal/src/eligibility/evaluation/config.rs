use serde::{Deserialize, Serialize};

use super::super::domain::AssessmentType;

/// Which average feeds the average and exceptional-case thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AverageBasis {
    #[default]
    Simple,
    Weighted,
}

impl AverageBasis {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "simple" | "mean" => Some(AverageBasis::Simple),
            "weighted" => Some(AverageBasis::Weighted),
            _ => None,
        }
    }
}

/// Thresholds applied by the criteria evaluator, all on the 0–20 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub minimum_average: f64,
    pub minimum_french: f64,
    pub minimum_mathematics: f64,
    pub exceptional_average: f64,
    pub average_basis: AverageBasis,
    pub priority_programmes: Vec<AssessmentType>,
}

impl EvaluationConfig {
    pub fn standard() -> Self {
        Self {
            minimum_average: 12.0,
            minimum_french: 10.0,
            minimum_mathematics: 10.0,
            exceptional_average: 14.0,
            average_basis: AverageBasis::Simple,
            priority_programmes: vec![
                AssessmentType::Bts,
                AssessmentType::Dut,
                AssessmentType::Cpge,
            ],
        }
    }

    pub fn with_average_basis(mut self, average_basis: AverageBasis) -> Self {
        self.average_basis = average_basis;
        self
    }

    pub fn is_priority_programme(&self, assessment_type: AssessmentType) -> bool {
        self.priority_programmes.contains(&assessment_type)
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self::standard()
    }
}
