//! Board widget boundary.
//!
//! The controller pushes display state into the widget; the widget calls
//! back with exactly two kinds of input.

use chess_core::MoveIntent;
use shakmaty::{Color, Piece, Square};

pub trait BoardWidget {
    /// Replace the displayed position.
    fn set_position(&mut self, fen: &str);

    fn set_orientation(&mut self, color: Color);

    fn orientation(&self) -> Color;

    /// Put a piece on (or clear) a single square.
    fn set_piece(&mut self, square: Square, piece: Option<Piece>);

    /// Open the promotion dialog. The answer comes back later as a
    /// `SessionEvent::PromotionChosen`.
    fn show_promotion_dialog(&mut self, square: Square, color: Color);
}

/// Input callbacks from the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardInput {
    /// A piece was dropped; the widget snaps back unless accepted.
    ValidateMoveInput(MoveIntent),
    /// The drop animation is over.
    MoveInputFinished,
}
