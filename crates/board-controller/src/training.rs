//! Training variant: after each player move the controller answers with a
//! move drawn from the backend's best lines.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shakmaty::Color;

use crate::analysis::EvaluationLine;

/// First move of one of the top `top_n` lines, picked at random.
pub fn choose_reply<R: Rng + ?Sized>(
    lines: &[EvaluationLine],
    top_n: usize,
    rng: &mut R,
) -> Option<String> {
    let candidates: Vec<&String> = lines
        .iter()
        .take(top_n)
        .filter_map(|line| line.pv.first())
        .collect();

    if candidates.is_empty() {
        return None;
    }
    let idx = rng.gen_range(0..candidates.len());
    Some(candidates[idx].clone())
}

pub struct Trainer {
    top_n: usize,
    rng: StdRng,
    /// Side the player controls; the engine answers for the other one
    player: Color,
    /// A player move was made and the reply has not been played yet
    awaiting_reply: bool,
}

impl Trainer {
    pub fn new(top_n: usize) -> Self {
        Self::with_rng(top_n, StdRng::from_entropy())
    }

    pub fn with_rng(top_n: usize, rng: StdRng) -> Self {
        Self {
            top_n: top_n.max(1),
            rng,
            player: Color::White,
            awaiting_reply: false,
        }
    }

    pub fn set_rng(&mut self, rng: StdRng) {
        self.rng = rng;
    }

    /// Start over with the player on `player`'s side.
    pub fn reset(&mut self, player: Color) {
        self.player = player;
        self.awaiting_reply = false;
    }

    pub fn player(&self) -> Color {
        self.player
    }

    pub fn player_moved(&mut self) {
        self.awaiting_reply = true;
    }

    pub fn awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    /// Pick the reply for the current position and stop waiting.
    pub fn take_reply(&mut self, lines: &[EvaluationLine]) -> Option<String> {
        self.awaiting_reply = false;
        choose_reply(lines, self.top_n, &mut self.rng)
    }

    pub fn cancel_reply(&mut self) {
        self.awaiting_reply = false;
    }
}
