//! Position model: the authoritative game state behind the board.
//!
//! Wraps a shakmaty `Chess` value with the starting position and the stack
//! of played moves so moves can be reverted and the game exported as PGN.
//! Legality is reported through `Result<_, MoveRejection>`; a rejected move
//! never touches the stored state.

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{
    CastlingMode, Chess, Color, EnPassantMode, File, Move, Outcome, Piece, Position, Role, Square,
};
use tracing::debug;

use crate::error::{MoveRejection, PositionError};
use crate::game_data::GameMetadata;
use crate::notation::{is_promotion_rank, MoveIntent};
use crate::pgn;

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A move that has been committed to the position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    /// SAN with check/mate suffix, e.g. `Qxf7#`
    pub san: String,
    /// Coordinate notation, e.g. `e7e8q` (castling as king move `e1g1`)
    pub uci: String,
    pub role: Role,
    pub promotion: Option<Role>,
}

#[derive(Debug, Clone)]
pub struct GamePosition {
    start: Chess,
    start_fen: String,
    current: Chess,
    /// Position before each played move, paired with the move
    played: Vec<(Chess, AppliedMove)>,
    metadata: GameMetadata,
}

impl Default for GamePosition {
    fn default() -> Self {
        Self::standard()
    }
}

impl GamePosition {
    pub fn standard() -> Self {
        Self::from_chess(Chess::default(), STANDARD_START_FEN.to_string())
    }

    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        let fen = fen.trim();
        let invalid = |reason: String| PositionError::InvalidFen {
            fen: fen.to_string(),
            reason,
        };

        let parsed: Fen = fen.parse().map_err(|e| invalid(format!("{e}")))?;
        let pos: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| invalid(format!("{e}")))?;

        let normalized = fen_of(&pos);
        Ok(Self::from_chess(pos, normalized))
    }

    /// Load a game record: headers, optional `[FEN]` start, SAN mainline.
    pub fn from_pgn(text: &str) -> Result<Self, PositionError> {
        let record = pgn::parse_pgn(text)?;
        let mut position = match &record.metadata.fen {
            Some(fen) => Self::from_fen(fen)?,
            None => Self::standard(),
        };

        for san in &record.moves {
            position.play_notation(san)?;
        }
        debug!(moves = record.moves.len(), "Loaded PGN game");

        position.metadata = record.metadata;
        Ok(position)
    }

    fn from_chess(pos: Chess, start_fen: String) -> Self {
        Self {
            start: pos.clone(),
            start_fen,
            current: pos,
            played: Vec::new(),
            metadata: GameMetadata::default(),
        }
    }

    pub fn fen(&self) -> String {
        fen_of(&self.current)
    }

    pub fn start_fen(&self) -> &str {
        &self.start_fen
    }

    pub fn turn(&self) -> Color {
        self.current.turn()
    }

    pub fn is_game_over(&self) -> bool {
        self.current.is_game_over()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.current.outcome()
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.current.board().piece_at(square)
    }

    pub fn chess(&self) -> &Chess {
        &self.current
    }

    pub fn ply_count(&self) -> usize {
        self.played.len()
    }

    pub fn last_move(&self) -> Option<&AppliedMove> {
        self.played.last().map(|(_, applied)| applied)
    }

    /// SAN of every played move, in order.
    pub fn history(&self) -> Vec<String> {
        self.played.iter().map(|(_, m)| m.san.clone()).collect()
    }

    /// True when the intent moves a pawn of the side to move onto its last rank.
    pub fn is_promotion_move(&self, intent: &MoveIntent) -> bool {
        match self.piece_at(intent.from) {
            Some(piece) => {
                piece.role == Role::Pawn
                    && piece.color == self.turn()
                    && is_promotion_rank(piece.color, &intent.to.rank())
            }
            None => false,
        }
    }

    /// Check an intent for legality without touching the position.
    ///
    /// Promotion moves without a chosen piece are tested as queen
    /// promotions.
    pub fn probe(&self, intent: &MoveIntent) -> Result<Move, MoveRejection> {
        if self.current.is_game_over() {
            return Err(MoveRejection::GameOver);
        }

        let piece = self
            .piece_at(intent.from)
            .ok_or(MoveRejection::EmptySquare)?;
        if piece.color != self.turn() {
            return Err(MoveRejection::NotSideToMove);
        }

        let promotion = if self.is_promotion_move(intent) {
            Some(intent.promotion.unwrap_or(Role::Queen))
        } else {
            None
        };

        let uci = UciMove::Normal {
            from: intent.from,
            to: intent.to,
            promotion,
        };
        uci.to_move(&self.current)
            .map_err(|_| MoveRejection::Illegal)
    }

    /// Commit an intent. On rejection the position is left as it was.
    pub fn apply(&mut self, intent: &MoveIntent) -> Result<AppliedMove, MoveRejection> {
        let mv = self.probe(intent)?;
        Ok(self.commit(mv))
    }

    /// Play a move given in coordinate notation (`e2e4`) or SAN (`Nf3+`).
    pub fn play_notation(&mut self, notation: &str) -> Result<AppliedMove, PositionError> {
        let mv = self.resolve_notation(notation)?;
        Ok(self.commit(mv))
    }

    fn resolve_notation(&self, notation: &str) -> Result<Move, PositionError> {
        let notation = notation.trim();
        let invalid = |reason: &str| PositionError::InvalidMove {
            notation: notation.to_string(),
            reason: reason.to_string(),
        };

        if let Ok(uci) = notation.parse::<UciMove>() {
            return uci
                .to_move(&self.current)
                .map_err(|_| invalid("illegal in current position"));
        }

        let bare = notation.trim_end_matches(['+', '#', '!', '?']);
        let san: San = bare.parse().map_err(|_| invalid("not UCI or SAN"))?;
        san.to_move(&self.current)
            .map_err(|_| invalid("illegal in current position"))
    }

    fn commit(&mut self, mv: Move) -> AppliedMove {
        let before = self.current.clone();
        let san = San::from_move(&before, mv.clone()).to_string();
        let uci = coordinate_of(&mv);

        self.current.play_unchecked(mv.clone());

        let suffix = if self.current.is_checkmate() {
            "#"
        } else if self.current.is_check() {
            "+"
        } else {
            ""
        };

        let applied = AppliedMove {
            san: format!("{san}{suffix}"),
            uci,
            role: mv.role(),
            promotion: mv.promotion(),
        };
        debug!(san = %applied.san, uci = %applied.uci, "Move committed");

        self.played.push((before, applied.clone()));
        applied
    }

    /// Revert the last move, if any.
    pub fn undo(&mut self) -> Option<AppliedMove> {
        let (before, applied) = self.played.pop()?;
        self.current = before;
        Some(applied)
    }

    fn result_token(&self) -> Option<&'static str> {
        match self.outcome()? {
            Outcome::Decisive { winner: Color::White } => Some("1-0"),
            Outcome::Decisive { winner: Color::Black } => Some("0-1"),
            Outcome::Draw => Some("1/2-1/2"),
        }
    }

    /// Numbered movetext without headers, as shown next to the board.
    pub fn movetext(&self) -> String {
        pgn::write_movetext(
            self.start.fullmoves().get(),
            self.start.turn(),
            &self.history(),
            self.result_token(),
        )
    }

    /// Full PGN. Headers are written only when known, plus SetUp/FEN when
    /// the game did not start from the standard position.
    pub fn pgn(&self) -> String {
        let mut metadata = self.metadata.clone();
        metadata.fen = (self.start_fen != STANDARD_START_FEN).then(|| self.start_fen.clone());
        if let Some(result) = self.result_token() {
            metadata.result = Some(result.to_string());
        }

        let mut out = String::new();
        for (key, value) in metadata.headers() {
            out.push_str(&format!("[{key} \"{value}\"]\n"));
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&self.movetext());
        out
    }
}

fn fen_of(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

/// Coordinate notation for a legal move; castling is written as the king's
/// two-square step.
fn coordinate_of(mv: &Move) -> String {
    match mv {
        Move::Normal {
            from,
            to,
            promotion,
            ..
        } => match promotion {
            Some(role) => format!("{from}{to}{}", role.char()),
            None => format!("{from}{to}"),
        },
        Move::EnPassant { from, to } => format!("{from}{to}"),
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() { File::G } else { File::C };
            format!("{king}{}", Square::from_coords(file, king.rank()))
        }
        Move::Put { role, to } => format!("{}@{to}", role.upper_char()),
    }
}
