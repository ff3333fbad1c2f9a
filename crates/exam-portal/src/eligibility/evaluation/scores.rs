use super::super::domain::{OverallPerformance, SubjectScore};

pub(crate) const FRENCH_KEYWORDS: &[&str] = &["french", "français"];
pub(crate) const MATHEMATICS_KEYWORDS: &[&str] = &["math", "mathématiques"];

/// Simple and coefficient-weighted averages. Returns `None` for an empty list so callers
/// never divide by zero; coefficients are trusted as given.
pub fn aggregate(subjects: &[SubjectScore]) -> Option<OverallPerformance> {
    if subjects.is_empty() {
        return None;
    }

    let mut score_sum = 0.0;
    let mut total_points = 0.0;
    let mut total_coefficients = 0.0;
    for subject in subjects {
        score_sum += subject.score;
        total_points += subject.score * subject.coefficient;
        total_coefficients += subject.coefficient;
    }

    let weighted_average = if total_coefficients > 0.0 {
        total_points / total_coefficients
    } else {
        0.0
    };

    Some(OverallPerformance {
        total_points,
        total_coefficients,
        average_score: score_sum / subjects.len() as f64,
        weighted_average,
    })
}

/// Score of the first subject whose name contains any keyword, compared case-insensitively.
pub fn find_subject_score(subjects: &[SubjectScore], keywords: &[&str]) -> Option<f64> {
    subjects
        .iter()
        .find(|subject| {
            let name = subject.subject_name.to_lowercase();
            keywords.iter().any(|keyword| name.contains(keyword))
        })
        .map(|subject| subject.score)
}

pub fn french_score(subjects: &[SubjectScore]) -> Option<f64> {
    find_subject_score(subjects, FRENCH_KEYWORDS)
}

pub fn mathematics_score(subjects: &[SubjectScore]) -> Option<f64> {
    find_subject_score(subjects, MATHEMATICS_KEYWORDS)
}
