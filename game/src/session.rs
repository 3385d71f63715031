use hand_rps_common::gesture::Gesture;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::mode::{GameMode, MovePicker};
use crate::round::{transition, Event, Notice, RoundState};
use crate::score::BestOf;

/// Owns the round state and stamps every event with the injected clock.
pub struct GameSession<C: Clock, P: MovePicker> {
    state: Option<RoundState>, // Option so we can take() during transitions
    clock: C,
    picker: P,
}

impl<C: Clock, P: MovePicker> GameSession<C, P> {
    pub fn new(initial: RoundState, clock: C, picker: P) -> Self {
        Self {
            state: Some(initial),
            clock,
            picker,
        }
    }

    pub fn state(&self) -> &RoundState {
        self.state
            .as_ref()
            .unwrap_or_else(|| unreachable!("state is only taken inside apply"))
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Feed one classified frame. `None` when the frame held no hand.
    pub fn tick(&mut self, gesture: Option<Gesture>) -> Vec<Notice> {
        let now_ms = self.clock.now_ms();
        self.apply(Event::Tick { now_ms, gesture })
    }

    pub fn start_game(&mut self, best_of: BestOf) -> Vec<Notice> {
        let now_ms = self.clock.now_ms();
        self.apply(Event::StartGame { now_ms, best_of })
    }

    pub fn confirm_round(&mut self) -> Vec<Notice> {
        let now_ms = self.clock.now_ms();
        self.apply(Event::ConfirmRound { now_ms })
    }

    pub fn skip_wait(&mut self) -> Vec<Notice> {
        let now_ms = self.clock.now_ms();
        self.apply(Event::SkipWait { now_ms })
    }

    pub fn set_mode(&mut self, mode: GameMode) -> Vec<Notice> {
        self.apply(Event::SetMode(mode))
    }

    fn apply(&mut self, event: Event) -> Vec<Notice> {
        let Some(state) = self.state.take() else {
            return Vec::new();
        };
        let step = transition(state, &event, &mut self.picker);

        if step.notices.is_empty() && !matches!(event, Event::Tick { .. }) {
            debug!(event = ?event, phase = %step.state.phase, "command ignored in this phase");
        }
        for notice in &step.notices {
            info!(
                score = %step.state.tally.score_string(),
                mode = %step.state.mode,
                "{}→{}: {}",
                notice.from,
                notice.to,
                notice.status
            );
        }

        self.state = Some(step.state);
        step.notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::mode::FixedPicker;
    use crate::round::{Phase, Status};
    use crate::score::Winner;
    use hand_rps_common::gesture::Move;

    fn session(picker: FixedPicker) -> GameSession<ManualClock, FixedPicker> {
        let initial = RoundState::new(BestOf::One, GameMode::Normal, 2000);
        GameSession::new(initial, ManualClock::new(1_000), picker)
    }

    #[test]
    fn clock_drives_the_timeout() {
        let mut game = session(FixedPicker::always(Move::Scissors));
        game.start_game(BestOf::One);
        assert_eq!(game.state().capture_started_ms, 1_000);

        for _ in 0..60 {
            game.clock().advance(30);
            game.tick(Some(Gesture::Rock));
        }
        assert_eq!(game.state().phase, Phase::AwaitingGesture);
        assert_eq!(game.state().remaining_ms(game.now_ms()), Some(200));

        game.clock().advance(300);
        let notices = game.tick(None);
        assert_eq!(notices.len(), 2);
        assert_eq!(game.state().phase, Phase::GameOver);
        assert_eq!(game.state().winner, Some(Winner::Player));
        assert_eq!(game.state().tally.score_string(), "1 - 0");
    }

    #[test]
    fn commands_stamp_current_time() {
        let mut game = session(FixedPicker::always(Move::Rock));
        game.start_game(BestOf::Three);
        game.clock().advance(2_500);
        game.tick(None);
        assert_eq!(game.state().phase, Phase::Locked);

        game.clock().advance(700);
        game.skip_wait();
        assert_eq!(game.state().phase, Phase::AwaitingGesture);
        assert_eq!(game.state().capture_started_ms, 4_200);
    }

    #[test]
    fn inapplicable_commands_return_no_notices() {
        let mut game = session(FixedPicker::always(Move::Rock));
        assert!(game.confirm_round().is_empty());
        assert!(game.skip_wait().is_empty());
        assert_eq!(game.state().phase, Phase::Idle);
    }

    #[test]
    fn mode_change_is_reported() {
        let mut game = session(FixedPicker::always(Move::Rock));
        let notices = game.set_mode(GameMode::AlwaysWin);
        assert_eq!(
            notices[0].status,
            Status::ModeChanged {
                mode: GameMode::AlwaysWin
            }
        );
        assert_eq!(game.state().mode, GameMode::AlwaysWin);
    }
}
