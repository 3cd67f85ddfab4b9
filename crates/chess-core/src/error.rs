//! Position model error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("Invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("Invalid square: {0}")]
    InvalidSquare(String),

    #[error("Invalid move '{notation}': {reason}")]
    InvalidMove { notation: String, reason: String },

    #[error("Invalid PGN: {0}")]
    InvalidPgn(String),
}

/// Why a move intent was refused. The position is never mutated when one
/// of these is returned.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    #[error("the game is over")]
    GameOver,

    #[error("no piece on the source square")]
    EmptySquare,

    #[error("piece does not belong to the side to move")]
    NotSideToMove,

    #[error("illegal move")]
    Illegal,

    #[error("move does not match the expected answer")]
    WrongAnswer,
}
