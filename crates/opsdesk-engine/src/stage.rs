// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation stages and stage reconstruction.
//!
//! `infer_stage` is the recovery rule for partially lost session state:
//! when the explicit stage is missing but accumulated fields survive, the
//! flow resumes from the fields instead of restarting triage. It is a pure
//! function kept apart from the transition handling in `conversation`.

use strum::Display;

use crate::session::SessionFields;

/// Which orchestrator step owns the user's next input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    // Triage (unknown user).
    TriageAwaitingCode,
    TriageAwaitingCompany,
    TriageAwaitingContact,

    // Ticket creation.
    AwaitingUrgencyLevel,
    AwaitingUrgencyDetails,
    AwaitingDescription,
    CollectingAttachments,
    ShowingSummary,
    EditingCategory,
    EditingDescription,
    EditingAttachments,

    // CSAT sub-flow.
    AwaitingFeedbackComment,
    RatingSpeed,
    RatingQuality,
    RatingPoliteness,

    // Operator reason capture.
    AwaitingPauseReason,
    AwaitingCancelReason,
    AwaitingDetailsQuestion,
}

impl Stage {
    /// Stages owned by the operator reason-capture sub-flows.
    pub fn is_operator_stage(self) -> bool {
        matches!(
            self,
            Stage::AwaitingPauseReason
                | Stage::AwaitingCancelReason
                | Stage::AwaitingDetailsQuestion
        )
    }

    /// Stages owned by the CSAT sub-flow.
    pub fn is_feedback_stage(self) -> bool {
        matches!(
            self,
            Stage::AwaitingFeedbackComment
                | Stage::RatingSpeed
                | Stage::RatingQuality
                | Stage::RatingPoliteness
        )
    }
}

/// Reconstruct the stage from accumulated fields when the explicit stage
/// is absent.
///
/// A category with no description means the flow was waiting for the
/// description; category plus description resumes at attachment
/// collection, whose plain-text handler is a no-op -- so a duplicate
/// recovered message cannot overwrite the description or double-submit.
/// Anything else gives no session at all (idle routing applies).
pub fn infer_stage(fields: &SessionFields) -> Option<Stage> {
    match (&fields.category, &fields.description) {
        (Some(_), None) => Some(Stage::AwaitingDescription),
        (Some(_), Some(_)) => Some(Stage::CollectingAttachments),
        (None, _) => None,
    }
}
