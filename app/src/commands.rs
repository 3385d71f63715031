use std::str::FromStr;

use hand_rps_game::{BestOf, GameError, GameMode};

/// Operator input, from the console or the HTTP API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `None` plays the configured `game.best_of`.
    StartGame(Option<BestOf>),
    ConfirmRound,
    SkipWait,
    SetMode(GameMode),
    Quit,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}', expected start, confirm, skip, mode or quit")]
    Unknown(String),
    #[error("'{0}' expects an argument")]
    MissingArgument(&'static str),
    #[error("best-of must be a number: {0}")]
    BadNumber(String),
    #[error(transparent)]
    Game(#[from] GameError),
}

impl FromStr for Command {
    type Err = CommandError;

    /// Parses `start [1|3|5]`, `confirm`, `skip`, `mode <name>` and `quit`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(CommandError::Empty);
        };

        match verb.to_ascii_lowercase().as_str() {
            "start" | "new" => {
                let best_of = match words.next() {
                    Some(n) => {
                        let games: u32 =
                            n.parse().map_err(|_| CommandError::BadNumber(n.to_string()))?;
                        Some(BestOf::try_from(games)?)
                    }
                    None => None,
                };
                Ok(Self::StartGame(best_of))
            }
            "confirm" | "c" => Ok(Self::ConfirmRound),
            "skip" | "s" => Ok(Self::SkipWait),
            "mode" => {
                let name = words.next().ok_or(CommandError::MissingArgument("mode"))?;
                Ok(Self::SetMode(name.parse()?))
            }
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}
