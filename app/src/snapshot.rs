use chrono::{DateTime, SecondsFormat, Utc};
use hand_rps_common::gesture::{Gesture, Move};
use hand_rps_game::{GameMode, Phase, RoundState, Winner};
use serde::Serialize;

/// What the presentation side sees after each tick or command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub mode: GameMode,
    pub current_gesture: Option<Gesture>,
    pub locked_gesture: Option<Gesture>,
    pub computer_move: Option<Move>,
    pub best_of: u32,
    pub player_score: u32,
    pub computer_score: u32,
    pub rounds_played: u32,
    pub score: String,
    pub message: String,
    pub remaining_ms: Option<u64>,
    pub game_over: bool,
    pub winner: Option<Winner>,
    /// Sequence number of the last processed frame.
    pub frame_seq: Option<u64>,
    /// RFC 3339 capture time of that frame.
    pub captured_at: Option<String>,
}

impl Snapshot {
    pub fn new(state: &RoundState, now_ms: u64) -> Self {
        Self {
            phase: state.phase,
            mode: state.mode,
            current_gesture: state.current_gesture,
            locked_gesture: state.locked_gesture,
            computer_move: state.computer_move,
            best_of: state.tally.best_of.games(),
            player_score: state.tally.player_score,
            computer_score: state.tally.computer_score,
            rounds_played: state.tally.rounds_played,
            score: state.tally.score_string(),
            message: state.message.clone(),
            remaining_ms: state.remaining_ms(now_ms),
            game_over: state.is_game_over(),
            winner: state.winner,
            frame_seq: None,
            captured_at: None,
        }
    }

    pub fn with_frame(mut self, seq: u64, captured_at: DateTime<Utc>) -> Self {
        self.frame_seq = Some(seq);
        self.captured_at = Some(captured_at.to_rfc3339_opts(SecondsFormat::Millis, true));
        self
    }
}
