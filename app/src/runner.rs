use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hand_rps_game::{BestOf, Clock, GameSession, MovePicker};
use hand_rps_vision::HandRecognizer;
use image::RgbImage;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::commands::Command;
use crate::snapshot::Snapshot;
use crate::source::FrameSource;

/// Receivers handed to the presentation side.
pub struct Presentation {
    pub snapshots: watch::Receiver<Snapshot>,
    pub frames: watch::Receiver<Option<Arc<RgbImage>>>,
}

/// The single-threaded game loop: one frame, one pipeline pass and one
/// state machine step per tick; commands are applied between ticks.
pub struct Runner<S, C: Clock, P: MovePicker> {
    source: S,
    recognizer: HandRecognizer,
    session: GameSession<C, P>,
    width: u32,
    height: u32,
    commands: mpsc::Receiver<Command>,
    default_best_of: BestOf,
    snapshot_tx: watch::Sender<Snapshot>,
    frame_tx: watch::Sender<Option<Arc<RgbImage>>>,
    last_frame: Option<(u64, DateTime<Utc>)>,
}

impl<S: FrameSource, C: Clock, P: MovePicker> Runner<S, C, P> {
    pub fn new(
        source: S,
        recognizer: HandRecognizer,
        session: GameSession<C, P>,
        (width, height): (u32, u32),
        commands: mpsc::Receiver<Command>,
    ) -> (Self, Presentation) {
        let default_best_of = session.state().tally.best_of;
        let initial = Snapshot::new(session.state(), session.now_ms());
        let (snapshot_tx, snapshots) = watch::channel(initial);
        let (frame_tx, frames) = watch::channel(None);
        let runner = Self {
            source,
            recognizer,
            session,
            width,
            height,
            commands,
            default_best_of,
            snapshot_tx,
            frame_tx,
            last_frame: None,
        };
        (runner, Presentation { snapshots, frames })
    }

    #[cfg(test)]
    pub fn session(&self) -> &GameSession<C, P> {
        &self.session
    }

    /// Tick every `period` until a `quit` command or Ctrl-C.
    pub async fn run(self, period: Duration) {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
            info!("received Ctrl-C");
        };
        self.run_until(period, ctrl_c).await;
    }

    /// Tick every `period` until a `quit` command or `shutdown` completes.
    ///
    /// `shutdown` lives for the whole loop and is polled first, so a signal
    /// that lands mid-tick stops the loop right after that tick.
    pub async fn run_until(mut self, period: Duration, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut commands_open = true;

        info!(period_ms = period.as_millis() as u64, "game loop started");
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => self.tick().await,
                cmd = self.commands.recv(), if commands_open => match cmd {
                    Some(cmd) => {
                        if !self.apply(cmd) {
                            break;
                        }
                    }
                    None => {
                        debug!("all command senders closed");
                        commands_open = false;
                    }
                },
            }
        }
        info!(score = %self.session.state().tally.score_string(), "game loop stopped");
    }

    /// One cooperative tick. A failed or empty read leaves the game untouched.
    pub async fn tick(&mut self) {
        let frame = match self.source.read().await {
            Ok(Some(frame)) => frame,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "frame read failed, skipping tick");
                return;
            }
        };
        let mut frame = frame.normalized(self.width, self.height);

        let gesture = self
            .recognizer
            .detect(&mut frame.image)
            .map(|detection| detection.gesture);
        if gesture.is_none() {
            debug!(
                seq = frame.seq,
                captured = %frame.captured_at().format("%H:%M:%S%.3f"),
                "no hand in frame"
            );
        }
        self.session.tick(gesture);

        self.last_frame = Some((frame.seq, frame.captured_at()));
        self.frame_tx.send_replace(Some(Arc::new(frame.image)));
        self.publish();
    }

    /// Apply an operator command. Returns false when the loop should stop.
    pub fn apply(&mut self, command: Command) -> bool {
        debug!(command = ?command, "operator command");
        match command {
            Command::StartGame(best_of) => {
                self.session.start_game(best_of.unwrap_or(self.default_best_of));
            }
            Command::ConfirmRound => {
                self.session.confirm_round();
            }
            Command::SkipWait => {
                self.session.skip_wait();
            }
            Command::SetMode(mode) => {
                self.session.set_mode(mode);
            }
            Command::Quit => return false,
        }
        self.publish();
        true
    }

    fn publish(&self) {
        let mut snapshot = Snapshot::new(self.session.state(), self.session.now_ms());
        if let Some((seq, captured_at)) = self.last_frame {
            snapshot = snapshot.with_frame(seq, captured_at);
        }
        self.snapshot_tx.send_replace(snapshot);
    }
}
