use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What the classifier reports for a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gesture {
    Rock,
    Paper,
    Scissors,
    Unknown,
}

/// A playable move. `Gesture::Unknown` has no move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Rock,
    Paper,
    Scissors,
}

impl Gesture {
    pub const ALL: [Gesture; 4] = [
        Gesture::Rock,
        Gesture::Paper,
        Gesture::Scissors,
        Gesture::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rock => "rock",
            Self::Paper => "paper",
            Self::Scissors => "scissors",
            Self::Unknown => "unknown",
        }
    }

    pub fn as_move(&self) -> Option<Move> {
        match self {
            Self::Rock => Some(Move::Rock),
            Self::Paper => Some(Move::Paper),
            Self::Scissors => Some(Move::Scissors),
            Self::Unknown => None,
        }
    }
}

impl Move {
    pub const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    pub fn as_str(&self) -> &'static str {
        Gesture::from(*self).as_str()
    }

    /// The move this one defeats.
    pub fn beats(&self) -> Move {
        match self {
            Self::Rock => Move::Scissors,
            Self::Paper => Move::Rock,
            Self::Scissors => Move::Paper,
        }
    }

    /// The move that defeats this one.
    pub fn beaten_by(&self) -> Move {
        match self {
            Self::Rock => Move::Paper,
            Self::Paper => Move::Scissors,
            Self::Scissors => Move::Rock,
        }
    }
}

impl From<Move> for Gesture {
    fn from(m: Move) -> Self {
        match m {
            Move::Rock => Gesture::Rock,
            Move::Paper => Gesture::Paper,
            Move::Scissors => Gesture::Scissors,
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognized gesture name: {0}")]
pub struct ParseGestureError(pub String);

impl FromStr for Gesture {
    type Err = ParseGestureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rock" => Ok(Self::Rock),
            "paper" => Ok(Self::Paper),
            "scissors" => Ok(Self::Scissors),
            "unknown" => Ok(Self::Unknown),
            _ => Err(ParseGestureError(s.to_string())),
        }
    }
}
