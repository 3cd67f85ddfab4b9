//! Board sync: push the authoritative model into the widget.

use chess_core::GamePosition;
use shakmaty::{Color, Piece, Square};
use tracing::debug;

use crate::widget::BoardWidget;

#[derive(Debug, Default)]
pub struct BoardSync;

impl BoardSync {
    pub fn new() -> Self {
        Self
    }

    pub fn push_position<W: BoardWidget + ?Sized>(&mut self, widget: &mut W, position: &GamePosition) {
        let fen = position.fen();
        debug!(fen = %fen, "Syncing board");
        widget.set_position(&fen);
    }

    pub fn place_piece<W: BoardWidget + ?Sized>(
        &mut self,
        widget: &mut W,
        square: Square,
        piece: Option<Piece>,
    ) {
        // Only the promoted square changes; the next full push overwrites it
        widget.set_piece(square, piece);
    }

    pub fn orient<W: BoardWidget + ?Sized>(&mut self, widget: &mut W, color: Color) {
        widget.set_orientation(color);
    }

    pub fn flip<W: BoardWidget + ?Sized>(&mut self, widget: &mut W) {
        let flipped = !widget.orientation();
        widget.set_orientation(flipped);
    }
}
