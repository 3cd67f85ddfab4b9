//! Square, rank and promotion-piece helpers.
//!
//! Board widgets hand us squares as strings ("e7") and promotion pieces as
//! widget codes ("wq"), while some callers carry ranks as plain numbers.
//! Everything is normalised into shakmaty types here.

use std::fmt;
use std::str::FromStr;

use shakmaty::{Color, Rank, Role, Square};

use crate::error::PositionError;

/// Anything that names a board rank: `'8'`, `"8"`, `8u8`, `Rank::Eighth`.
pub trait RankLabel {
    fn to_rank(&self) -> Option<Rank>;
}

fn rank_from_number(n: u32) -> Option<Rank> {
    (1..=8).contains(&n).then(|| Rank::new(n - 1))
}

impl RankLabel for Rank {
    fn to_rank(&self) -> Option<Rank> {
        Some(*self)
    }
}

impl RankLabel for char {
    fn to_rank(&self) -> Option<Rank> {
        self.to_digit(10).and_then(rank_from_number)
    }
}

impl RankLabel for str {
    fn to_rank(&self) -> Option<Rank> {
        self.trim().parse::<u32>().ok().and_then(rank_from_number)
    }
}

impl RankLabel for String {
    fn to_rank(&self) -> Option<Rank> {
        self.as_str().to_rank()
    }
}

impl RankLabel for u8 {
    fn to_rank(&self) -> Option<Rank> {
        rank_from_number(u32::from(*self))
    }
}

impl RankLabel for u32 {
    fn to_rank(&self) -> Option<Rank> {
        rank_from_number(*self)
    }
}

impl<T: RankLabel + ?Sized> RankLabel for &T {
    fn to_rank(&self) -> Option<Rank> {
        (**self).to_rank()
    }
}

/// The rank farthest from the side's own pawns.
pub fn last_rank(color: Color) -> Rank {
    match color {
        Color::White => Rank::Eighth,
        Color::Black => Rank::First,
    }
}

/// True when a pawn of `color` arriving on `label` must promote.
pub fn is_promotion_rank<L: RankLabel + ?Sized>(color: Color, label: &L) -> bool {
    label.to_rank() == Some(last_rank(color))
}

pub fn parse_square(label: &str) -> Result<Square, PositionError> {
    label
        .trim()
        .parse::<Square>()
        .map_err(|_| PositionError::InvalidSquare(label.to_string()))
}

/// Parse a promotion piece from a widget code ("wq", "bn"), a single
/// letter ("q", "R") or a name ("queen"). Kings and pawns are refused.
pub fn parse_promotion_role(code: &str) -> Option<Role> {
    let code = code.trim().to_ascii_lowercase();
    let letter = match code.as_str() {
        "queen" => 'q',
        "rook" => 'r',
        "bishop" => 'b',
        "knight" => 'n',
        _ => {
            let mut chars = code.chars();
            match (chars.next(), chars.next(), chars.next()) {
                (Some(c), None, None) => c,
                (Some('w' | 'b'), Some(c), None) => c,
                _ => return None,
            }
        }
    };

    match Role::from_char(letter)? {
        role @ (Role::Queen | Role::Rook | Role::Bishop | Role::Knight) => Some(role),
        _ => None,
    }
}

/// A raw move gesture: source and target square, plus the promotion piece
/// once one has been chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveIntent {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
}

impl MoveIntent {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn parse(from: &str, to: &str) -> Result<Self, PositionError> {
        Ok(Self::new(parse_square(from)?, parse_square(to)?))
    }

    pub fn with_promotion(self, role: Role) -> Self {
        Self {
            promotion: Some(role),
            ..self
        }
    }

    /// Coordinate notation, e.g. `e2e4` or `e7e8q`.
    pub fn coordinate(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MoveIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(role) = self.promotion {
            write!(f, "{}", role.char())?;
        }
        Ok(())
    }
}

impl FromStr for MoveIntent {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !(s.len() == 4 || s.len() == 5) || !s.is_ascii() {
            return Err(PositionError::InvalidMove {
                notation: s.to_string(),
                reason: "expected coordinate notation like e2e4".into(),
            });
        }

        let intent = Self::parse(&s[0..2], &s[2..4])?;
        match s.get(4..5) {
            None => Ok(intent),
            Some(code) => parse_promotion_role(code)
                .map(|role| intent.with_promotion(role))
                .ok_or_else(|| PositionError::InvalidMove {
                    notation: s.to_string(),
                    reason: format!("unknown promotion piece '{code}'"),
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promotion_rank_accepts_any_label() {
        assert!(is_promotion_rank(Color::White, "8"));
        assert!(is_promotion_rank(Color::White, &'8'));
        assert!(is_promotion_rank(Color::White, &8u8));
        assert!(is_promotion_rank(Color::White, &Rank::Eighth));
        assert!(is_promotion_rank(Color::Black, "1"));
        assert!(is_promotion_rank(Color::Black, &1u32));

        // The near rank never promotes
        assert!(!is_promotion_rank(Color::White, "1"));
        assert!(!is_promotion_rank(Color::Black, &8u8));
        assert!(!is_promotion_rank(Color::White, "9"));
        assert!(!is_promotion_rank(Color::White, "x"));
    }

    #[test]
    fn test_parse_promotion_role() {
        assert_eq!(parse_promotion_role("wq"), Some(Role::Queen));
        assert_eq!(parse_promotion_role("bn"), Some(Role::Knight));
        assert_eq!(parse_promotion_role("R"), Some(Role::Rook));
        assert_eq!(parse_promotion_role("bishop"), Some(Role::Bishop));
        assert_eq!(parse_promotion_role("wk"), None);
        assert_eq!(parse_promotion_role("p"), None);
        assert_eq!(parse_promotion_role(""), None);
    }

    #[test]
    fn test_intent_coordinate_notation() {
        let intent: MoveIntent = "e7e8q".parse().unwrap();
        assert_eq!(intent.from, Square::E7);
        assert_eq!(intent.to, Square::E8);
        assert_eq!(intent.promotion, Some(Role::Queen));
        assert_eq!(intent.coordinate(), "e7e8q");

        let plain = MoveIntent::parse("e2", "e4").unwrap();
        assert_eq!(plain.coordinate(), "e2e4");

        assert!("e2e9".parse::<MoveIntent>().is_err());
        assert!("e7e8k".parse::<MoveIntent>().is_err());
    }
}
