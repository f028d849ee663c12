//! Progress polling
//!
//! Two halves:
//! - [`ProgressLoop`]: a spawned task that only emits `Tick` commands onto
//!   the coordinator channel at a fixed cadence. It never touches playback
//!   state.
//! - [`ProgressTracker`]: the per-track stall/completion test, evaluated by
//!   the coordinator when a tick arrives.

use crate::playback::coordinator::Command;
use std::time::Duration;
use tempo_common::{PlaybackState, ProgressSample, StopReason};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

/// Handle to the running tick task for one loaded track
pub struct ProgressLoop {
    generation: u64,
    cancel_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ProgressLoop {
    /// Spawn a tick task tagged with `generation`
    pub(crate) fn spawn(
        generation: u64,
        period: Duration,
        command_tx: mpsc::UnboundedSender<Command>,
    ) -> Self {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let task = tokio::spawn(tick_task(generation, period, command_tx, cancel_rx));
        debug!("Progress loop {} started ({:?} interval)", generation, period);
        Self {
            generation,
            cancel_tx: Some(cancel_tx),
            task,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Signal the task to stop and wait for it to exit.
    ///
    /// The task is parked on either its interval or the cancel signal, so
    /// this returns within one polling interval at most.
    pub async fn cancel(mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!("Progress loop {} ended abnormally: {}", self.generation, e);
        }
        debug!("Progress loop {} cancelled", self.generation);
    }
}

impl Drop for ProgressLoop {
    fn drop(&mut self) {
        // Dropped without cancel(): make sure the task does not outlive us
        if self.cancel_tx.is_some() {
            self.task.abort();
        }
    }
}

async fn tick_task(
    generation: u64,
    period: Duration,
    command_tx: mpsc::UnboundedSender<Command>,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    let mut ticker = time::interval_at(time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut cancel_rx => break,
            _ = ticker.tick() => {
                if command_tx.send(Command::Tick { generation }).is_err() {
                    break;
                }
            }
        }
    }
}

/// Outcome of evaluating one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickVerdict {
    /// Keep going; broadcast this sample
    Continue(ProgressSample),
    /// Playback is over
    Finished(StopReason),
}

/// Stall/completion detection for one loaded track.
///
/// Playback is finished when the engine signals end of media, when the
/// position reaches a known duration, or when the position did not move
/// since the previous tick while Playing. The stall rule covers engines
/// whose position never quite reaches the duration.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    previous_position: Option<u64>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(
        &mut self,
        position_ms: u64,
        duration_ms: u64,
        state: PlaybackState,
        engine_reached_end: bool,
    ) -> TickVerdict {
        if engine_reached_end || (duration_ms > 0 && position_ms >= duration_ms) {
            return TickVerdict::Finished(StopReason::EndOfMedia);
        }
        if state == PlaybackState::Playing && self.previous_position == Some(position_ms) {
            return TickVerdict::Finished(StopReason::Stalled);
        }
        self.previous_position = Some(position_ms);
        TickVerdict::Continue(ProgressSample::new(position_ms, duration_ms))
    }

    /// Forget the last position so the next tick cannot count as a stall
    pub fn reset_baseline(&mut self) {
        self.previous_position = None;
    }
}
