//! Quiz variant: the board is seeded from a puzzle and only the expected
//! answer is accepted.

use std::str::FromStr;

use chess_core::{GamePosition, MoveIntent, PositionError};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::validator::MoveFilter;

/// Puzzle record as served by `get_quiz`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Quiz {
    pub fen: String,
    /// Expected moves in coordinate notation, best first
    pub answers: Vec<String>,
}

/// Score filter sent with a quiz request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBand {
    pub min: i32,
    pub max: i32,
}

impl Default for ScoreBand {
    fn default() -> Self {
        Self { min: 100, max: 300 }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QuizAdvance {
    /// Fetch the next puzzle as soon as one is solved
    #[default]
    AutoAdvance,
    /// Step through the remaining answers on the same board; a new puzzle
    /// is fetched once they run out
    AwaitNext,
}

impl FromStr for QuizAdvance {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "auto_advance" => Ok(QuizAdvance::AutoAdvance),
            "await" | "await_next" => Ok(QuizAdvance::AwaitNext),
            _ => Err(()),
        }
    }
}

/// Does a submitted move match an expected answer?
///
/// A 4-character answer compares squares only; a longer answer also
/// compares the promotion suffix.
pub fn answer_matches(intent: &MoveIntent, expected: &str) -> bool {
    let expected = expected.trim().to_ascii_lowercase();
    if expected.len() == 4 {
        format!("{}{}", intent.from, intent.to) == expected
    } else {
        intent.coordinate() == expected
    }
}

/// What happens after a correct answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizProgress {
    FetchNext,
    AwaitNext,
}

#[derive(Debug, Default)]
pub struct QuizSession {
    quiz: Option<Quiz>,
    solved: u32,
    advance: QuizAdvance,
}

impl QuizSession {
    pub fn new(advance: QuizAdvance) -> Self {
        Self {
            advance,
            ..Self::default()
        }
    }

    /// Replace the current puzzle and build its starting position.
    pub fn load(&mut self, quiz: Quiz) -> Result<GamePosition, PositionError> {
        let position = GamePosition::from_fen(&quiz.fen)?;
        info!(fen = %quiz.fen, answers = quiz.answers.len(), "Quiz loaded");
        self.quiz = Some(quiz);
        Ok(position)
    }

    pub fn quiz(&self) -> Option<&Quiz> {
        self.quiz.as_ref()
    }

    /// The answer the next move is checked against.
    pub fn expected(&self) -> Option<&str> {
        self.quiz.as_ref()?.answers.first().map(String::as_str)
    }

    pub fn solved(&self) -> u32 {
        self.solved
    }

    /// Consume the matched answer. Auto-advance drops the whole puzzle;
    /// await-next keeps the rest for the following moves.
    pub fn record_solved(&mut self) -> QuizProgress {
        self.solved += 1;
        let remaining = match self.quiz.as_mut() {
            Some(quiz) => {
                match self.advance {
                    QuizAdvance::AutoAdvance => quiz.answers.clear(),
                    QuizAdvance::AwaitNext if !quiz.answers.is_empty() => {
                        quiz.answers.remove(0);
                    }
                    QuizAdvance::AwaitNext => {}
                }
                quiz.answers.len()
            }
            None => 0,
        };
        info!(solved = self.solved, remaining, "Quiz answer accepted");

        if remaining == 0 {
            QuizProgress::FetchNext
        } else {
            QuizProgress::AwaitNext
        }
    }
}

impl MoveFilter for QuizSession {
    fn admits_squares(&self, intent: &MoveIntent) -> bool {
        self.expected()
            .map(|expected| {
                expected
                    .trim()
                    .to_ascii_lowercase()
                    .starts_with(&format!("{}{}", intent.from, intent.to))
            })
            .unwrap_or(false)
    }

    fn admits(&self, intent: &MoveIntent) -> bool {
        self.expected()
            .map(|expected| answer_matches(intent, expected))
            .unwrap_or(false)
    }
}
