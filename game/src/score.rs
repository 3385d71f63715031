use std::fmt;

use hand_rps_common::gesture::Move;
use serde::{Deserialize, Serialize};

use crate::GameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    PlayerWins,
    ComputerWins,
    Tie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Player,
    Computer,
    /// Only reachable if both sides somehow hit the target together.
    Draw,
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Player => "player",
            Self::Computer => "computer",
            Self::Draw => "draw",
        })
    }
}

/// Match length. Only odd lengths up to five are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BestOf {
    One,
    Three,
    Five,
}

impl BestOf {
    pub fn games(&self) -> u32 {
        match self {
            Self::One => 1,
            Self::Three => 3,
            Self::Five => 5,
        }
    }

    /// Wins needed to take the match.
    pub fn target(&self) -> u32 {
        self.games() / 2 + 1
    }
}

impl TryFrom<u32> for BestOf {
    type Error = GameError;

    fn try_from(games: u32) -> Result<Self, Self::Error> {
        match games {
            1 => Ok(Self::One),
            3 => Ok(Self::Three),
            5 => Ok(Self::Five),
            other => Err(GameError::InvalidBestOf(other)),
        }
    }
}

impl From<BestOf> for u32 {
    fn from(best_of: BestOf) -> Self {
        best_of.games()
    }
}

/// Judge one round under the fixed beats-relation.
pub fn judge(player: Move, computer: Move) -> Outcome {
    if player == computer {
        Outcome::Tie
    } else if player.beats() == computer {
        Outcome::PlayerWins
    } else {
        Outcome::ComputerWins
    }
}

/// Running score of one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameTally {
    pub best_of: BestOf,
    pub player_score: u32,
    pub computer_score: u32,
    pub rounds_played: u32,
}

impl GameTally {
    pub fn new(best_of: BestOf) -> Self {
        Self {
            best_of,
            player_score: 0,
            computer_score: 0,
            rounds_played: 0,
        }
    }

    /// Apply a round result. Ties leave the tally untouched.
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::PlayerWins => self.player_score += 1,
            Outcome::ComputerWins => self.computer_score += 1,
            Outcome::Tie => return,
        }
        self.rounds_played += 1;
    }

    pub fn is_game_over(&self) -> bool {
        let target = self.best_of.target();
        self.player_score >= target || self.computer_score >= target
    }

    pub fn winner(&self) -> Winner {
        match self.player_score.cmp(&self.computer_score) {
            std::cmp::Ordering::Greater => Winner::Player,
            std::cmp::Ordering::Less => Winner::Computer,
            std::cmp::Ordering::Equal => Winner::Draw,
        }
    }

    pub fn score_string(&self) -> String {
        format!("{} - {}", self.player_score, self.computer_score)
    }
}
