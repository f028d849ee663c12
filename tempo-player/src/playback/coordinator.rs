//! Playback coordinator
//!
//! A single tokio task owns the state machine, the subscriber registry and
//! the active progress loop. Every command, including progress ticks, is
//! handled one at a time in arrival order from one channel, so a Stop and a
//! natural end-of-media can never race.
//!
//! Track changes tear down the previous track completely (engine stop, loop
//! cancelled and joined) before the next load runs.

use crate::engine::AudioEngine;
use crate::error::{Error, Result};
use crate::playback::presenter::Presenter;
use crate::playback::progress::{ProgressLoop, ProgressTracker, TickVerdict};
use crate::playback::registry::{ClientId, ClientRegistry, EventReceiver, EventSender};
use crate::playback::state::PlaybackStateMachine;
use crate::playback::track::Track;
use serde::Serialize;
use std::time::Duration;
use tempo_common::config::{DEFAULT_CLIENT_QUEUE_CAPACITY, DEFAULT_POLL_INTERVAL_MS};
use tempo_common::time::millis_to_duration;
use tempo_common::{PlaybackState, PlayerEvent, ProgressSample, StopReason};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

/// Messages accepted by the coordinator
pub(crate) enum Command {
    /// Subscribe `sender` to broadcasts
    Register { id: ClientId, sender: EventSender },
    /// Unsubscribe; unknown ids are ignored
    Unregister { id: ClientId },
    /// Load and start playing a track
    Load { uri: String },
    Play,
    Pause,
    Stop,
    /// Emitted by the progress loop tagged with its generation
    Tick { generation: u64 },
    /// Report current status
    Status { reply: oneshot::Sender<StatusSnapshot> },
    /// Stop playback and exit
    Shutdown { done: oneshot::Sender<()> },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Register { .. } => "register",
            Command::Unregister { .. } => "unregister",
            Command::Load { .. } => "load",
            Command::Play => "play",
            Command::Pause => "pause",
            Command::Stop => "stop",
            Command::Tick { .. } => "tick",
            Command::Status { .. } => "status",
            Command::Shutdown { .. } => "shutdown",
        }
    }
}

/// Point-in-time view of the coordinator
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub state: PlaybackState,
    pub uri: Option<String>,
    pub display_name: Option<String>,
    pub position_ms: u64,
    pub duration_ms: u64,
    /// `MM:SS / MM:SS`
    pub display: String,
    pub clients: usize,
    /// Generation of the running progress loop, if any
    pub progress_loop: Option<u64>,
}

/// Coordinator tuning
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Progress loop cadence
    pub poll_interval: Duration,
    /// Events buffered per subscriber; a full queue drops the subscriber
    pub client_queue_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            poll_interval: millis_to_duration(DEFAULT_POLL_INTERVAL_MS),
            client_queue_capacity: DEFAULT_CLIENT_QUEUE_CAPACITY,
        }
    }
}

/// A registered client and its event stream
pub struct Subscription {
    pub id: ClientId,
    pub events: EventReceiver,
}

/// Cloneable handle for sending commands to the coordinator
#[derive(Clone)]
pub struct CoordinatorHandle {
    command_tx: mpsc::UnboundedSender<Command>,
    client_queue_capacity: usize,
}

impl CoordinatorHandle {
    fn send(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|e| Error::CoordinatorClosed(format!("{} command not delivered", e.0.name())))
    }

    /// Register a new subscriber and return its event stream
    pub fn register(&self) -> Result<Subscription> {
        let id = Uuid::new_v4();
        let (sender, events) = mpsc::channel(self.client_queue_capacity);
        self.register_sender(id, sender)?;
        Ok(Subscription { id, events })
    }

    /// Register an existing channel under `id`
    pub fn register_sender(&self, id: ClientId, sender: EventSender) -> Result<()> {
        self.send(Command::Register { id, sender })
    }

    pub fn unregister(&self, id: ClientId) -> Result<()> {
        self.send(Command::Unregister { id })
    }

    pub fn load(&self, uri: impl Into<String>) -> Result<()> {
        self.send(Command::Load { uri: uri.into() })
    }

    pub fn play(&self) -> Result<()> {
        self.send(Command::Play)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(Command::Pause)
    }

    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    /// Query status; answered after every previously sent command
    pub async fn status(&self) -> Result<StatusSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Status { reply })?;
        rx.await
            .map_err(|_| Error::CoordinatorClosed("status reply dropped".to_string()))
    }

    /// Stop playback and wait for the coordinator to exit
    pub async fn shutdown(&self) -> Result<()> {
        let (done, rx) = oneshot::channel();
        self.send(Command::Shutdown { done })?;
        rx.await
            .map_err(|_| Error::CoordinatorClosed("shutdown reply dropped".to_string()))
    }
}

/// Progress loop plus its stall/completion state
struct ActiveLoop {
    progress: ProgressLoop,
    tracker: ProgressTracker,
}

/// Serialized owner of playback state, progress loop and subscribers
pub struct Coordinator {
    machine: PlaybackStateMachine,
    registry: ClientRegistry,
    presenter: Box<dyn Presenter>,
    active: Option<ActiveLoop>,
    next_generation: u64,
    config: CoordinatorConfig,
    /// Weak so that idle coordinators exit once every handle is dropped
    command_tx: mpsc::WeakUnboundedSender<Command>,
}

impl Coordinator {
    /// Spawn the coordinator task
    pub fn spawn(
        engine: impl AudioEngine,
        presenter: impl Presenter,
        config: CoordinatorConfig,
    ) -> (CoordinatorHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let handle = CoordinatorHandle {
            command_tx,
            client_queue_capacity: config.client_queue_capacity.max(1),
        };

        let coordinator = Coordinator::new(engine, presenter, config, handle.command_tx.downgrade());
        let task = tokio::spawn(coordinator.run(command_rx));
        (handle, task)
    }

    fn new(
        engine: impl AudioEngine,
        presenter: impl Presenter,
        config: CoordinatorConfig,
        command_tx: mpsc::WeakUnboundedSender<Command>,
    ) -> Self {
        Coordinator {
            machine: PlaybackStateMachine::new(Box::new(engine)),
            registry: ClientRegistry::new(),
            presenter: Box::new(presenter),
            active: None,
            next_generation: 0,
            config,
            command_tx,
        }
    }

    async fn run(mut self, mut command_rx: mpsc::UnboundedReceiver<Command>) {
        info!(
            "Playback coordinator started ({:?} poll interval)",
            self.config.poll_interval
        );

        while let Some(command) = command_rx.recv().await {
            trace!("Handling {} command", command.name());
            if !self.handle(command).await {
                info!("Playback coordinator shut down");
                return;
            }
        }

        self.stop_playback(StopReason::Shutdown).await;
        info!("Command channel closed, playback coordinator exiting");
    }

    /// Returns false once the coordinator should exit
    async fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Register { id, sender } => self.registry.register(id, sender),
            Command::Unregister { id } => {
                if !self.registry.unregister(id) {
                    debug!("Unregister ignored for unknown client {}", id);
                }
            }
            Command::Load { uri } => self.load(uri).await,
            Command::Play => self.play(),
            Command::Pause => {
                self.machine.request_pause();
            }
            Command::Stop => {
                self.stop_playback(StopReason::UserRequested).await;
            }
            Command::Tick { generation } => self.tick(generation).await,
            Command::Status { reply } => {
                let _ = reply.send(self.snapshot());
            }
            Command::Shutdown { done } => {
                self.stop_playback(StopReason::Shutdown).await;
                let _ = done.send(());
                return false;
            }
        }
        true
    }

    async fn load(&mut self, uri: String) {
        if self.machine.is_redundant_load(&uri) {
            debug!("{} is already loaded, ignoring load", uri);
            return;
        }

        self.stop_playback(StopReason::Superseded).await;
        debug_assert!(self.active.is_none(), "progress loop outlived its track");

        // The engine reads the source from disk
        let machine = &mut self.machine;
        let loaded = run_blocking(|| machine.request_load(Track::new(uri.as_str())).cloned());
        match loaded {
            Ok(track) => {
                self.presenter
                    .show(track.display_name(), self.machine.duration_ms());
                self.broadcast(PlayerEvent::now_playing(track.uri(), track.display_name()));
                self.start_progress_loop();
            }
            Err(e) => {
                warn!("{}", e);
                let reason = match e {
                    Error::Load { reason, .. } => reason,
                    other => other.to_string(),
                };
                self.broadcast(PlayerEvent::load_failed(uri, reason));
            }
        }
    }

    fn play(&mut self) {
        if self.machine.request_play() {
            // The position did not move while paused
            if let Some(active) = self.active.as_mut() {
                active.tracker.reset_baseline();
            }
        }
    }

    fn start_progress_loop(&mut self) {
        let Some(command_tx) = self.command_tx.upgrade() else {
            warn!("All coordinator handles dropped, not starting progress loop");
            return;
        };

        self.next_generation += 1;
        let progress =
            ProgressLoop::spawn(self.next_generation, self.config.poll_interval, command_tx);
        self.active = Some(ActiveLoop {
            progress,
            tracker: ProgressTracker::new(),
        });
    }

    /// Stop the engine, cancel and join the progress loop, reset clients.
    ///
    /// Returns false when nothing was playing.
    async fn stop_playback(&mut self, reason: StopReason) -> bool {
        let stopped = self.machine.request_stop();

        if let Some(active) = self.active.take() {
            active.progress.cancel().await;
        }

        let Some(track) = stopped else {
            return false;
        };

        self.presenter.cancel();
        self.broadcast(PlayerEvent::stopped(reason));
        info!("Stopped {} ({})", track.uri(), reason);
        true
    }

    async fn tick(&mut self, generation: u64) {
        let verdict = match self.active.as_mut() {
            Some(active) if active.progress.generation() == generation => {
                active.tracker.evaluate(
                    self.machine.position_ms(),
                    self.machine.duration_ms(),
                    self.machine.state(),
                    self.machine.engine_reached_end(),
                )
            }
            _ => {
                trace!("Discarding stale tick from progress loop {}", generation);
                return;
            }
        };

        match verdict {
            TickVerdict::Continue(sample) => {
                self.presenter.update(&sample);
                self.broadcast(PlayerEvent::progress(sample));
            }
            TickVerdict::Finished(reason) => {
                self.stop_playback(reason).await;
            }
        }
    }

    fn broadcast(&mut self, event: PlayerEvent) {
        let report = self.registry.broadcast(&event);
        trace!(
            "{} delivered to {} clients ({} pruned)",
            event.event_type(),
            report.delivered,
            report.pruned.len()
        );
    }

    fn snapshot(&self) -> StatusSnapshot {
        let track = self.machine.track();
        let sample = ProgressSample::new(self.machine.position_ms(), self.machine.duration_ms());
        StatusSnapshot {
            state: self.machine.state(),
            uri: track.map(|t| t.uri().to_string()),
            display_name: track.map(|t| t.display_name().to_string()),
            position_ms: sample.position_ms,
            duration_ms: sample.duration_ms,
            display: sample.display(),
            clients: self.registry.len(),
            progress_loop: self.active.as_ref().map(|a| a.progress.generation()),
        }
    }
}

/// Run blocking engine work without holding up the other tasks on this
/// worker. A current-thread runtime has no spare worker, so the work runs
/// inline there.
fn run_blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current().map(|h| h.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(f),
        _ => f(),
    }
}
