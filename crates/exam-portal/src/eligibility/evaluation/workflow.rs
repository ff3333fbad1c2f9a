use chrono::{DateTime, Utc};

use super::super::domain::{
    ExceptionalCircumstances, NstbApproval, ReviewOutcome, SupersededReview,
};

/// Rejected board review transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("assessment is not flagged as an exceptional case")]
    NotExceptional,
    #[error("exceptional case already decided ({0})")]
    AlreadyDecided(NstbApproval),
}

/// Applies the automatic `N/A -> Pending` transition from the current criteria flag. A record
/// flagged again after leaving the exceptional state gets a fresh review; the earlier decision
/// moves to `superseded_reviews`.
pub(crate) fn sync_flag(
    circumstances: &mut ExceptionalCircumstances,
    is_exceptional: bool,
    average: f64,
    french: Option<f64>,
) {
    if is_exceptional {
        if !circumstances.has_exceptional_case && circumstances.nstb_approval.is_decided() {
            supersede_decision(circumstances);
        }
        circumstances.has_exceptional_case = true;
        circumstances.average_score = Some(average);
        circumstances.french_score = french;
        if circumstances.nstb_approval == NstbApproval::NotApplicable {
            circumstances.nstb_approval = NstbApproval::Pending;
        }
        return;
    }

    circumstances.has_exceptional_case = false;
    if circumstances.nstb_approval == NstbApproval::Pending {
        circumstances.nstb_approval = NstbApproval::NotApplicable;
        circumstances.average_score = None;
        circumstances.french_score = None;
    }
}

fn supersede_decision(circumstances: &mut ExceptionalCircumstances) {
    circumstances.superseded_reviews.push(SupersededReview {
        decision: circumstances.nstb_approval,
        average_score: circumstances.average_score.take(),
        french_score: circumstances.french_score.take(),
        reviewed_by: circumstances.reviewed_by.take(),
        review_date: circumstances.review_date.take(),
        approval_notes: circumstances.approval_notes.take(),
    });
    circumstances.nstb_approval = NstbApproval::Pending;
}

/// Records a board decision. Terminal states cannot be reviewed again.
pub fn review(
    circumstances: &mut ExceptionalCircumstances,
    outcome: ReviewOutcome,
    reviewer: &str,
    notes: String,
    reviewed_at: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    if !circumstances.has_exceptional_case {
        return Err(WorkflowError::NotExceptional);
    }

    let current = circumstances.nstb_approval;
    if current.is_decided() {
        return Err(WorkflowError::AlreadyDecided(current));
    }
    if current != NstbApproval::Pending {
        return Err(WorkflowError::NotExceptional);
    }

    circumstances.nstb_approval = outcome.into();
    circumstances.reviewed_by = Some(reviewer.to_string());
    circumstances.review_date = Some(reviewed_at);
    circumstances.approval_notes = if notes.trim().is_empty() {
        None
    } else {
        Some(notes)
    };

    Ok(())
}
