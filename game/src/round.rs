use std::fmt;

use hand_rps_common::gesture::{Gesture, Move};
use serde::{Deserialize, Serialize};

use crate::clock::capture_expired;
use crate::mode::{GameMode, MovePicker};
use crate::score::{judge, BestOf, GameTally, Outcome, Winner};

const IDLE_MESSAGE: &str = "Start a game to play";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No game has been started yet.
    Idle,
    AwaitingGesture,
    /// A gesture was captured. Only stays here when it was `unknown`.
    Locked,
    /// Transient: a tie is entered and left within the same step.
    TieRetry,
    AwaitingConfirmation,
    GameOver,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::AwaitingGesture => "AWAITING_GESTURE",
            Self::Locked => "LOCKED",
            Self::TieRetry => "TIE_RETRY",
            Self::AwaitingConfirmation => "AWAITING_CONFIRMATION",
            Self::GameOver => "GAME_OVER",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the game loop knows about the current match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    pub phase: Phase,
    pub mode: GameMode,
    /// Live preview, overwritten by every classified frame.
    pub current_gesture: Option<Gesture>,
    /// Gesture of the last capture, kept until the next round is armed.
    pub locked_gesture: Option<Gesture>,
    pub computer_move: Option<Move>,
    pub capture_started_ms: u64,
    pub gesture_timeout_ms: u64,
    pub confirmed: bool,
    pub tally: GameTally,
    pub winner: Option<Winner>,
    pub message: String,
}

impl RoundState {
    pub fn new(best_of: BestOf, mode: GameMode, gesture_timeout_ms: u64) -> Self {
        Self {
            phase: Phase::Idle,
            mode,
            current_gesture: None,
            locked_gesture: None,
            computer_move: None,
            capture_started_ms: 0,
            gesture_timeout_ms,
            confirmed: false,
            tally: GameTally::new(best_of),
            winner: None,
            message: IDLE_MESSAGE.to_string(),
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Time left before the capture locks, or `None` outside a capture.
    pub fn remaining_ms(&self, now_ms: u64) -> Option<u64> {
        if self.phase != Phase::AwaitingGesture {
            return None;
        }
        let elapsed = now_ms.saturating_sub(self.capture_started_ms);
        Some(self.gesture_timeout_ms.saturating_sub(elapsed))
    }

    /// A round that locked an unrecognised gesture and waits for the operator.
    fn is_stalled(&self) -> bool {
        self.phase == Phase::Locked && self.locked_gesture == Some(Gesture::Unknown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// One classified frame. `gesture` is `None` when no hand was found.
    Tick {
        now_ms: u64,
        gesture: Option<Gesture>,
    },
    StartGame {
        now_ms: u64,
        best_of: BestOf,
    },
    ConfirmRound {
        now_ms: u64,
    },
    SkipWait {
        now_ms: u64,
    },
    SetMode(GameMode),
}

/// User-facing outcome of a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Status {
    GameStarted { best_of: u32 },
    Captured { player: Move, computer: Move },
    Unrecognised,
    Tie { shown: Move },
    RoundWon { score: String },
    RoundLost { score: String },
    GameOver { winner: Winner, score: String },
    NextRound { score: String },
    GestureFirst,
    ModeChanged { mode: GameMode },
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GameStarted { best_of } => {
                write!(f, "New game, best of {best_of}. Show your gesture")
            }
            Self::Captured { player, computer } => {
                write!(f, "You played {player}, computer played {computer}")
            }
            Self::Unrecognised => f.write_str("Gesture not recognised, start the round again"),
            Self::Tie { shown } => write!(f, "Tie! Both played {shown}, play again"),
            Self::RoundWon { score } => {
                write!(f, "You win this round ({score}), confirm to continue")
            }
            Self::RoundLost { score } => {
                write!(f, "Computer wins this round ({score}), confirm to continue")
            }
            Self::GameOver { winner, score } => match winner {
                Winner::Player => write!(f, "Game over: you win the match ({score})"),
                Winner::Computer => write!(f, "Game over: computer wins the match ({score})"),
                Winner::Draw => write!(f, "Game over: draw ({score})"),
            },
            Self::NextRound { score } => write!(f, "Next round ({score}). Show your gesture"),
            Self::GestureFirst => f.write_str("Show a gesture first!"),
            Self::ModeChanged { mode } => write!(f, "Mode set to {mode}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub from: Phase,
    pub to: Phase,
    pub status: Status,
}

#[derive(Debug, Clone)]
pub struct Step {
    pub state: RoundState,
    pub notices: Vec<Notice>,
}

impl Step {
    fn unchanged(state: RoundState) -> Self {
        Self {
            state,
            notices: Vec::new(),
        }
    }

    /// Move to `to`, record the notice and surface its message.
    fn go(&mut self, to: Phase, status: Status) {
        let from = self.state.phase;
        self.state.phase = to;
        self.state.message = status.to_string();
        self.notices.push(Notice { from, to, status });
    }
}

/// Apply one event. Commands that do not fit the current phase are no-ops.
pub fn transition(state: RoundState, event: &Event, picker: &mut dyn MovePicker) -> Step {
    let mut step = Step::unchanged(state);

    match (step.state.phase, *event) {
        (_, Event::StartGame { now_ms, best_of }) => {
            let s = &mut step.state;
            s.tally = GameTally::new(best_of);
            s.winner = None;
            s.confirmed = false;
            s.computer_move = None;
            s.locked_gesture = None;
            s.current_gesture = None;
            s.capture_started_ms = now_ms;
            step.go(
                Phase::AwaitingGesture,
                Status::GameStarted {
                    best_of: best_of.games(),
                },
            );
        }

        (phase, Event::SetMode(mode)) => {
            step.state.mode = mode;
            step.go(phase, Status::ModeChanged { mode });
        }

        (Phase::AwaitingGesture, Event::Tick { now_ms, gesture }) => {
            if gesture.is_some() {
                step.state.current_gesture = gesture;
            }
            let s = &step.state;
            if capture_expired(now_ms, s.capture_started_ms, s.gesture_timeout_ms) {
                let locked = s.current_gesture.unwrap_or(Gesture::Unknown);
                lock(&mut step, locked, now_ms, picker);
            }
        }

        (Phase::AwaitingGesture, Event::SkipWait { now_ms }) => match step.state.current_gesture {
            Some(gesture) => lock(&mut step, gesture, now_ms, picker),
            None => step.go(Phase::AwaitingGesture, Status::GestureFirst),
        },

        (Phase::AwaitingConfirmation, Event::ConfirmRound { now_ms })
            if !step.state.tally.is_game_over() =>
        {
            rearm(&mut step, now_ms);
        }

        (Phase::Locked, Event::ConfirmRound { now_ms } | Event::SkipWait { now_ms })
            if step.state.is_stalled() =>
        {
            rearm(&mut step, now_ms);
        }

        _ => {}
    }

    step
}

/// Capture `gesture` and resolve the round against the computer.
fn lock(step: &mut Step, gesture: Gesture, now_ms: u64, picker: &mut dyn MovePicker) {
    step.state.locked_gesture = Some(gesture);
    step.state.confirmed = false;

    let Some(player) = gesture.as_move() else {
        step.state.computer_move = None;
        step.go(Phase::Locked, Status::Unrecognised);
        return;
    };

    let computer = step.state.mode.computer_move(player, picker);
    step.state.computer_move = Some(computer);
    step.go(Phase::Locked, Status::Captured { player, computer });

    let outcome = judge(player, computer);
    if outcome == Outcome::Tie {
        step.state.current_gesture = None;
        step.state.capture_started_ms = now_ms;
        step.go(Phase::TieRetry, Status::Tie { shown: player });
        step.state.phase = Phase::AwaitingGesture;
        return;
    }

    step.state.tally.record(outcome);
    let score = step.state.tally.score_string();
    if step.state.tally.is_game_over() {
        let winner = step.state.tally.winner();
        step.state.winner = Some(winner);
        step.go(Phase::GameOver, Status::GameOver { winner, score });
    } else if outcome == Outcome::PlayerWins {
        step.go(Phase::AwaitingConfirmation, Status::RoundWon { score });
    } else {
        step.go(Phase::AwaitingConfirmation, Status::RoundLost { score });
    }
}

/// Start a fresh capture for the next round.
fn rearm(step: &mut Step, now_ms: u64) {
    let s = &mut step.state;
    s.current_gesture = None;
    s.locked_gesture = None;
    s.computer_move = None;
    s.capture_started_ms = now_ms;
    s.confirmed = true;
    let score = s.tally.score_string();
    step.go(Phase::AwaitingGesture, Status::NextRound { score });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::FixedPicker;

    const TIMEOUT: u64 = 2000;

    fn started(best_of: BestOf, mode: GameMode) -> RoundState {
        let idle = RoundState::new(best_of, mode, TIMEOUT);
        let mut picker = FixedPicker::always(Move::Rock);
        transition(idle, &Event::StartGame { now_ms: 0, best_of }, &mut picker).state
    }

    fn tick(
        state: RoundState,
        now_ms: u64,
        gesture: Option<Gesture>,
        picker: &mut FixedPicker,
    ) -> Step {
        transition(state, &Event::Tick { now_ms, gesture }, picker)
    }

    #[test]
    fn new_state_is_idle_and_ignores_ticks() {
        let state = RoundState::new(BestOf::One, GameMode::Normal, TIMEOUT);
        let mut picker = FixedPicker::always(Move::Rock);
        let step = tick(state.clone(), 10_000, Some(Gesture::Rock), &mut picker);
        assert_eq!(step.state, state);
        assert!(step.notices.is_empty());
    }

    #[test]
    fn start_game_arms_capture() {
        let state = started(BestOf::Three, GameMode::Normal);
        assert_eq!(state.phase, Phase::AwaitingGesture);
        assert_eq!(state.tally.best_of.target(), 2);
        assert_eq!(state.remaining_ms(500), Some(1500));
    }

    #[test]
    fn preview_is_overwritten_without_locking() {
        let mut picker = FixedPicker::always(Move::Scissors);
        let state = started(BestOf::One, GameMode::Normal);
        let step = tick(state, 100, Some(Gesture::Paper), &mut picker);
        let step = tick(step.state, 200, Some(Gesture::Rock), &mut picker);
        let step = tick(step.state, 300, None, &mut picker);
        assert_eq!(step.state.phase, Phase::AwaitingGesture);
        assert_eq!(step.state.current_gesture, Some(Gesture::Rock));
        assert!(step.notices.is_empty());
    }

    #[test]
    fn best_of_one_player_wins() {
        let mut picker = FixedPicker::always(Move::Scissors);
        let state = started(BestOf::One, GameMode::Normal);
        let step = tick(state, 100, Some(Gesture::Rock), &mut picker);
        let step = tick(step.state, 2001, None, &mut picker);

        let s = &step.state;
        assert_eq!(s.phase, Phase::GameOver);
        assert!(s.is_game_over());
        assert_eq!(s.tally.score_string(), "1 - 0");
        assert_eq!(s.winner, Some(Winner::Player));
        assert_eq!(s.locked_gesture, Some(Gesture::Rock));
        assert_eq!(s.computer_move, Some(Move::Scissors));
        assert!(s.message.contains("you win"), "{}", s.message);

        let phases: Vec<(Phase, Phase)> = step.notices.iter().map(|n| (n.from, n.to)).collect();
        assert_eq!(
            phases,
            vec![
                (Phase::AwaitingGesture, Phase::Locked),
                (Phase::Locked, Phase::GameOver)
            ]
        );
    }

    #[test]
    fn timeout_without_gesture_stalls_on_unknown() {
        let mut picker = FixedPicker::always(Move::Paper);
        let state = started(BestOf::Three, GameMode::Normal);
        let step = tick(state, 1000, None, &mut picker);
        assert_eq!(step.state.phase, Phase::AwaitingGesture);
        let step = tick(step.state, 2500, None, &mut picker);

        let s = &step.state;
        assert_eq!(s.phase, Phase::Locked);
        assert_eq!(s.locked_gesture, Some(Gesture::Unknown));
        assert_eq!(s.computer_move, None);
        assert_eq!(s.tally, GameTally::new(BestOf::Three));
        assert_eq!(step.notices.last().unwrap().status, Status::Unrecognised);

        // Further ticks do nothing while stalled.
        let stalled = tick(s.clone(), 9000, Some(Gesture::Rock), &mut picker);
        assert_eq!(&stalled.state, s);
    }

    #[test]
    fn classifier_unknown_locks_as_unknown() {
        let mut picker = FixedPicker::always(Move::Paper);
        let state = started(BestOf::One, GameMode::Normal);
        let step = tick(state, 2100, Some(Gesture::Unknown), &mut picker);
        assert_eq!(step.state.phase, Phase::Locked);
        assert_eq!(step.state.message, Status::Unrecognised.to_string());
    }

    #[test]
    fn stalled_round_is_rearmed_by_skip_or_confirm() {
        let mut picker = FixedPicker::always(Move::Paper);
        let stalled = tick(started(BestOf::One, GameMode::Normal), 2100, None, &mut picker).state;

        for event in [Event::SkipWait { now_ms: 3000 }, Event::ConfirmRound { now_ms: 3000 }] {
            let step = transition(stalled.clone(), &event, &mut picker);
            assert_eq!(step.state.phase, Phase::AwaitingGesture);
            assert_eq!(step.state.capture_started_ms, 3000);
            assert_eq!(step.state.locked_gesture, None);
            assert!(step.state.confirmed);
        }
    }

    #[test]
    fn skip_before_any_gesture_only_prompts() {
        let mut picker = FixedPicker::always(Move::Paper);
        let state = started(BestOf::One, GameMode::Normal);
        let step = transition(state, &Event::SkipWait { now_ms: 400 }, &mut picker);

        assert_eq!(step.state.phase, Phase::AwaitingGesture);
        assert_eq!(step.state.locked_gesture, None);
        assert_eq!(step.state.capture_started_ms, 0);
        assert_eq!(step.state.tally, GameTally::new(BestOf::One));
        assert_eq!(step.notices.len(), 1);
        assert_eq!(step.notices[0].status, Status::GestureFirst);
        assert_eq!(step.state.message, "Show a gesture first!");
    }

    #[test]
    fn skip_locks_observed_gesture_immediately() {
        let mut picker = FixedPicker::always(Move::Rock);
        let state = started(BestOf::Three, GameMode::Normal);
        let step = tick(state, 100, Some(Gesture::Paper), &mut picker);
        let step = transition(step.state, &Event::SkipWait { now_ms: 150 }, &mut picker);
        assert_eq!(step.state.phase, Phase::AwaitingConfirmation);
        assert_eq!(step.state.tally.score_string(), "1 - 0");
    }

    #[test]
    fn tie_rearms_without_scoring() {
        let mut picker = FixedPicker::always(Move::Paper);
        let state = started(BestOf::Three, GameMode::Normal);
        let step = tick(state, 100, Some(Gesture::Paper), &mut picker);
        let step = tick(step.state, 2200, Some(Gesture::Paper), &mut picker);

        let s = &step.state;
        assert_eq!(s.phase, Phase::AwaitingGesture);
        assert_eq!(s.capture_started_ms, 2200);
        assert_eq!(s.current_gesture, None);
        assert_eq!(s.tally, GameTally::new(BestOf::Three));
        assert_eq!(s.tally.rounds_played, 0);
        assert_eq!(
            step.notices.last().unwrap(),
            &Notice {
                from: Phase::Locked,
                to: Phase::TieRetry,
                status: Status::Tie { shown: Move::Paper },
            }
        );

        // The new capture runs its own full timeout.
        let step = tick(step.state, 4000, Some(Gesture::Rock), &mut picker);
        assert_eq!(step.state.phase, Phase::AwaitingGesture);
    }

    #[test]
    fn confirm_starts_next_round() {
        let mut picker = FixedPicker::always(Move::Paper);
        let state = started(BestOf::Three, GameMode::Normal);
        let step = tick(state, 2100, Some(Gesture::Rock), &mut picker);
        assert_eq!(step.state.phase, Phase::AwaitingConfirmation);
        assert_eq!(step.state.tally.score_string(), "0 - 1");

        // Ticks and skips wait for the operator.
        let waiting = tick(step.state.clone(), 9000, Some(Gesture::Paper), &mut picker);
        assert_eq!(waiting.state, step.state);
        let skip = Event::SkipWait { now_ms: 9000 };
        let waiting = transition(step.state.clone(), &skip, &mut picker);
        assert!(waiting.notices.is_empty());

        let next = transition(step.state, &Event::ConfirmRound { now_ms: 5000 }, &mut picker);
        assert_eq!(next.state.phase, Phase::AwaitingGesture);
        assert_eq!(next.state.capture_started_ms, 5000);
        assert_eq!(next.state.locked_gesture, None);
        assert_eq!(next.state.computer_move, None);
        assert_eq!(next.state.tally.score_string(), "0 - 1");
    }

    #[test]
    fn confirm_is_ignored_while_capturing_and_after_game_over() {
        let mut picker = FixedPicker::always(Move::Scissors);
        let state = started(BestOf::One, GameMode::Normal);
        let step = transition(state.clone(), &Event::ConfirmRound { now_ms: 10 }, &mut picker);
        assert_eq!(step.state, state);

        let over = tick(state, 2100, Some(Gesture::Rock), &mut picker).state;
        assert_eq!(over.phase, Phase::GameOver);
        let step = transition(over.clone(), &Event::ConfirmRound { now_ms: 3000 }, &mut picker);
        assert_eq!(step.state, over);
        assert!(step.notices.is_empty());
    }

    #[test]
    fn best_of_three_plays_to_two() {
        let mut picker = FixedPicker::new([Move::Scissors, Move::Paper, Move::Scissors]);
        let mut state = started(BestOf::Three, GameMode::Normal);
        let mut now = 0;
        for expected in ["1 - 0", "1 - 1"] {
            now += 2100;
            state = tick(state, now, Some(Gesture::Rock), &mut picker).state;
            assert_eq!(state.phase, Phase::AwaitingConfirmation);
            assert_eq!(state.tally.score_string(), expected);
            state = transition(state, &Event::ConfirmRound { now_ms: now }, &mut picker).state;
        }
        now += 2100;
        state = tick(state, now, Some(Gesture::Rock), &mut picker).state;
        assert_eq!(state.phase, Phase::GameOver);
        assert_eq!(state.tally.score_string(), "2 - 1");
        assert_eq!(state.tally.rounds_played, 3);
        assert_eq!(state.winner, Some(Winner::Player));
    }

    #[test]
    fn forced_modes_decide_the_round() {
        for player in [Gesture::Rock, Gesture::Paper, Gesture::Scissors] {
            let mut picker = FixedPicker::always(Move::Rock);
            let state = started(BestOf::One, GameMode::AlwaysWin);
            let win = tick(state, 2100, Some(player), &mut picker);
            assert_eq!(win.state.winner, Some(Winner::Player));

            let state = started(BestOf::One, GameMode::AlwaysLose);
            let lose = tick(state, 2100, Some(player), &mut picker);
            assert_eq!(lose.state.winner, Some(Winner::Computer));
        }
    }

    #[test]
    fn set_mode_applies_in_any_phase() {
        let mut picker = FixedPicker::always(Move::Rock);
        let idle = RoundState::new(BestOf::One, GameMode::Normal, TIMEOUT);
        let step = transition(idle, &Event::SetMode(GameMode::AlwaysLose), &mut picker);
        assert_eq!(step.state.mode, GameMode::AlwaysLose);
        assert_eq!(step.state.phase, Phase::Idle);
        assert_eq!(step.state.message, "Mode set to always_lose");
    }

    #[test]
    fn restart_discards_previous_game() {
        let mut picker = FixedPicker::always(Move::Scissors);
        let state = started(BestOf::One, GameMode::Normal);
        let over = tick(state, 2100, Some(Gesture::Rock), &mut picker).state;
        let step = transition(
            over,
            &Event::StartGame {
                now_ms: 7000,
                best_of: BestOf::Five,
            },
            &mut picker,
        );
        let s = &step.state;
        assert_eq!(s.phase, Phase::AwaitingGesture);
        assert_eq!(s.tally, GameTally::new(BestOf::Five));
        assert_eq!(s.winner, None);
        assert_eq!(s.locked_gesture, None);
        assert_eq!(s.capture_started_ms, 7000);
        assert_eq!(step.notices[0].from, Phase::GameOver);
    }

    #[test]
    fn state_serializes_for_presentation() {
        let state = started(BestOf::Three, GameMode::AlwaysWin);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["phase"], "awaiting_gesture");
        assert_eq!(json["mode"], "always_win");
        assert_eq!(json["tally"]["best_of"], 3);
    }
}
