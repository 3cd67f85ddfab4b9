//! Rules adapter for the board controller: the authoritative position
//! model, notation helpers and PGN utilities on top of shakmaty.

pub use shakmaty;

pub mod error;
pub mod game_data;
pub mod notation;
pub mod pgn;
pub mod position;

pub use error::{MoveRejection, PositionError};
pub use notation::{is_promotion_rank, parse_promotion_role, MoveIntent, RankLabel};
pub use position::{AppliedMove, GamePosition, STANDARD_START_FEN};
