pub mod clock;
pub mod mode;
pub mod round;
pub mod score;
pub mod session;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use mode::{FixedPicker, GameMode, MovePicker, RandomPicker};
pub use round::{transition, Event, Notice, Phase, RoundState, Status, Step};
pub use score::{judge, BestOf, GameTally, Outcome, Winner};
pub use session::GameSession;

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("best-of must be 1, 3 or 5, got {0}")]
    InvalidBestOf(u32),

    #[error("unknown game mode: {0}")]
    InvalidMode(String),
}
