use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use hand_rps_common::gesture::Move;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::GameError;

/// How the computer chooses its move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Normal,
    /// The computer always plays the move the player's move beats.
    AlwaysWin,
    /// The computer always plays the move that beats the player's.
    AlwaysLose,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::AlwaysWin => "always_win",
            Self::AlwaysLose => "always_lose",
        }
    }

    /// Pick the computer's reply to `player`. Only `Normal` consults the picker.
    pub fn computer_move(&self, player: Move, picker: &mut dyn MovePicker) -> Move {
        match self {
            Self::Normal => picker.pick(),
            Self::AlwaysWin => player.beats(),
            Self::AlwaysLose => player.beaten_by(),
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "always_win" => Ok(Self::AlwaysWin),
            "always_lose" => Ok(Self::AlwaysLose),
            _ => Err(GameError::InvalidMode(s.to_string())),
        }
    }
}

/// Source of the computer's move in normal mode.
pub trait MovePicker {
    fn pick(&mut self) -> Move;
}

/// Uniform choice over the three moves.
pub struct RandomPicker {
    rng: StdRng,
}

impl RandomPicker {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl MovePicker for RandomPicker {
    fn pick(&mut self) -> Move {
        Move::ALL[self.rng.gen_range(0..Move::ALL.len())]
    }
}

/// Plays back a fixed script, then repeats its last move.
pub struct FixedPicker {
    script: VecDeque<Move>,
    last: Move,
}

impl FixedPicker {
    pub fn new(script: impl IntoIterator<Item = Move>) -> Self {
        Self {
            script: script.into_iter().collect(),
            last: Move::Rock,
        }
    }

    pub fn always(m: Move) -> Self {
        Self::new([m])
    }
}

impl MovePicker for FixedPicker {
    fn pick(&mut self) -> Move {
        if let Some(m) = self.script.pop_front() {
            self.last = m;
        }
        self.last
    }
}
