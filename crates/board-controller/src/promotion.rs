//! Promotion resolver: a two-state machine that holds a promotion move
//! until the player picks a piece.
//!
//! The dialog answer arrives as a separate event, so nothing blocks while
//! the choice is pending. Cancelling (or answering with a piece a pawn
//! cannot become) keeps the same move pending and asks again; with
//! `CancelPolicy::Reprompt` the only exit is a valid choice.

use std::str::FromStr;

use chess_core::{parse_promotion_role, MoveIntent};
use shakmaty::{Color, Role};
use tracing::debug;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CancelPolicy {
    /// Ask again until a piece is chosen
    #[default]
    Reprompt,
    /// Drop the move on cancel
    Abandon,
}

impl FromStr for CancelPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reprompt" => Ok(CancelPolicy::Reprompt),
            "abandon" => Ok(CancelPolicy::Abandon),
            _ => Err(()),
        }
    }
}

/// The dialog's answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromotionChoice {
    Piece(Role),
    Cancelled,
}

impl PromotionChoice {
    /// Convert a widget result: `Some("wq")` picks a queen, `None` or an
    /// unreadable code counts as a cancel.
    pub fn from_code(code: Option<&str>) -> Self {
        code.and_then(parse_promotion_role)
            .map(PromotionChoice::Piece)
            .unwrap_or(PromotionChoice::Cancelled)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingPromotion {
    pub intent: MoveIntent,
    pub side: Color,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResolverState {
    AwaitingChoice(PendingPromotion),
    #[default]
    Resolved,
}

/// What the caller has to do after feeding a choice in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Finalize this move (promotion piece filled in)
    Chosen(MoveIntent),
    /// Show the dialog again for the same move
    Reprompt(PendingPromotion),
    /// Cancelled under `CancelPolicy::Abandon`
    Abandoned(PendingPromotion),
    /// Nothing was pending
    Idle,
}

#[derive(Debug, Default)]
pub struct PromotionResolver {
    state: ResolverState,
    policy: CancelPolicy,
    prompts: u32,
}

impl PromotionResolver {
    pub fn new(policy: CancelPolicy) -> Self {
        Self {
            state: ResolverState::Resolved,
            policy,
            prompts: 0,
        }
    }

    pub fn state(&self) -> &ResolverState {
        &self.state
    }

    pub fn pending(&self) -> Option<&PendingPromotion> {
        match &self.state {
            ResolverState::AwaitingChoice(pending) => Some(pending),
            ResolverState::Resolved => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending().is_some()
    }

    /// Times the dialog has been shown for the current move.
    pub fn prompts(&self) -> u32 {
        self.prompts
    }

    pub fn begin(&mut self, pending: PendingPromotion) {
        debug!(intent = %pending.intent, side = ?pending.side, "Awaiting promotion choice");
        self.state = ResolverState::AwaitingChoice(pending);
        self.prompts = 1;
    }

    pub fn resolve(&mut self, choice: PromotionChoice) -> Resolution {
        let Some(pending) = self.pending().copied() else {
            debug!(?choice, "Promotion choice with nothing pending");
            return Resolution::Idle;
        };

        match choice {
            PromotionChoice::Piece(
                role @ (Role::Queen | Role::Rook | Role::Bishop | Role::Knight),
            ) => {
                self.state = ResolverState::Resolved;
                Resolution::Chosen(pending.intent.with_promotion(role))
            }
            _ if self.policy == CancelPolicy::Abandon => {
                debug!(intent = %pending.intent, "Promotion abandoned");
                self.state = ResolverState::Resolved;
                Resolution::Abandoned(pending)
            }
            _ => {
                self.prompts += 1;
                debug!(intent = %pending.intent, prompts = self.prompts, "Re-prompting promotion");
                Resolution::Reprompt(pending)
            }
        }
    }

    /// Drop any pending move, e.g. when the position is replaced.
    pub fn reset(&mut self) {
        self.state = ResolverState::Resolved;
        self.prompts = 0;
    }
}
