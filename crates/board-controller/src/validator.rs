//! Move validator: turns a raw gesture into a finalized move, a pending
//! promotion, or a rejection.

use chess_core::{AppliedMove, GamePosition, MoveIntent, MoveRejection};
use tracing::debug;

use crate::promotion::PendingPromotion;

/// Extra acceptance rule layered on top of chess legality.
pub trait MoveFilter {
    /// Checked before the promotion piece is known.
    fn admits_squares(&self, _intent: &MoveIntent) -> bool {
        true
    }

    /// Checked on the complete move right before it is committed.
    fn admits(&self, _intent: &MoveIntent) -> bool {
        true
    }
}

/// Accepts every legal move.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyLegal;

impl MoveFilter for AnyLegal {}

/// Result of `attempt_move` as seen by the board widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptOutcome {
    pub accepted: bool,
    pub requires_promotion: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Finalized(AppliedMove),
    NeedsPromotion(PendingPromotion),
    Rejected(MoveRejection),
}

impl Verdict {
    pub fn outcome(&self) -> AttemptOutcome {
        match self {
            Verdict::Finalized(_) => AttemptOutcome {
                accepted: true,
                requires_promotion: false,
            },
            Verdict::NeedsPromotion(_) => AttemptOutcome {
                accepted: true,
                requires_promotion: true,
            },
            Verdict::Rejected(_) => AttemptOutcome {
                accepted: false,
                requires_promotion: false,
            },
        }
    }
}

/// Validate a gesture against the position.
///
/// Legality is tested with a queen standing in for any promotion piece.
/// Pawn moves onto the last rank always go to the promotion resolver, even
/// when the gesture already carries a tentative piece; the position is left
/// at the pre-move state until the choice comes back.
pub fn attempt_move<F: MoveFilter + ?Sized>(
    position: &mut GamePosition,
    intent: MoveIntent,
    filter: &F,
) -> Verdict {
    if let Err(rejection) = position.probe(&intent) {
        debug!(%intent, %rejection, "Move rejected");
        return Verdict::Rejected(rejection);
    }

    if !filter.admits_squares(&intent) {
        debug!(%intent, "Move rejected by filter");
        return Verdict::Rejected(MoveRejection::WrongAnswer);
    }

    if position.is_promotion_move(&intent) {
        return Verdict::NeedsPromotion(PendingPromotion {
            intent,
            side: position.turn(),
        });
    }

    match finalize(position, intent, filter) {
        Ok(applied) => Verdict::Finalized(applied),
        Err(rejection) => Verdict::Rejected(rejection),
    }
}

/// Commit a complete move, applying the filter one last time.
pub fn finalize<F: MoveFilter + ?Sized>(
    position: &mut GamePosition,
    intent: MoveIntent,
    filter: &F,
) -> Result<AppliedMove, MoveRejection> {
    if !filter.admits(&intent) {
        debug!(%intent, "Move rejected by filter");
        return Err(MoveRejection::WrongAnswer);
    }
    position.apply(&intent)
}
