//! Shared fixtures for tempo-player integration tests

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempo_common::PlayerEvent;
use tempo_player::engine::AudioEngine;
use tempo_player::error::{Error, Result};
use tempo_player::playback::{
    Coordinator, CoordinatorConfig, CoordinatorHandle, EventReceiver, LogPresenter, Subscription,
};
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
enum Clock {
    Idle,
    Running { since: Instant, offset_ms: u64 },
    Paused { at_ms: u64 },
}

struct MockState {
    duration_ms: u64,
    rejected: HashSet<String>,
    loaded: Option<String>,
    clock: Clock,
    frozen_at: Option<u64>,
    end_signalled: bool,
    calls: Vec<String>,
    gate: Option<GatedLoad>,
}

/// Engine side of a [`LoadGate`]
struct GatedLoad {
    entered: std_mpsc::Sender<()>,
    release: std_mpsc::Receiver<()>,
}

/// Holds the next `load` call inside the engine until released.
///
/// Uses std channels so a test can observe it from outside the runtime.
pub struct LoadGate {
    /// Signalled once the engine is inside `load`
    pub entered: std_mpsc::Receiver<()>,
    /// Send to let `load` return
    pub release: std_mpsc::Sender<()>,
}

/// Scriptable engine driven by the tokio clock.
///
/// Clones share state, so a test keeps one clone to steer the engine the
/// coordinator owns.
#[derive(Clone)]
pub struct MockEngine {
    inner: Arc<Mutex<MockState>>,
}

impl MockEngine {
    /// Every loaded track reports `duration_ms`
    pub fn new(duration_ms: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockState {
                duration_ms,
                rejected: HashSet::new(),
                loaded: None,
                clock: Clock::Idle,
                frozen_at: None,
                end_signalled: false,
                calls: Vec::new(),
                gate: None,
            })),
        }
    }

    /// Make `load(uri)` fail
    pub fn reject(&self, uri: &str) {
        self.inner.lock().unwrap().rejected.insert(uri.to_string());
    }

    pub fn set_duration(&self, duration_ms: u64) {
        self.inner.lock().unwrap().duration_ms = duration_ms;
    }

    /// Stop the position from advancing while the state still says playing
    pub fn freeze(&self) {
        let mut state = self.inner.lock().unwrap();
        let position = position_of(&state);
        state.frozen_at = Some(position);
    }

    /// Raise the explicit end-of-media signal
    pub fn signal_end(&self) {
        self.inner.lock().unwrap().end_signalled = true;
    }

    /// Block the next `load` until the returned gate is released
    pub fn gate_next_load(&self) -> LoadGate {
        let (entered_tx, entered_rx) = std_mpsc::channel();
        let (release_tx, release_rx) = std_mpsc::channel();
        self.inner.lock().unwrap().gate = Some(GatedLoad {
            entered: entered_tx,
            release: release_rx,
        });
        LoadGate {
            entered: entered_rx,
            release: release_tx,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn load_count(&self) -> usize {
        self.calls().iter().filter(|c| c.starts_with("load ")).count()
    }
}

fn raw_position(state: &MockState) -> u64 {
    if let Some(frozen) = state.frozen_at {
        return frozen;
    }
    match state.clock {
        Clock::Idle => 0,
        Clock::Paused { at_ms } => at_ms,
        Clock::Running { since, offset_ms } => offset_ms + since.elapsed().as_millis() as u64,
    }
}

fn position_of(state: &MockState) -> u64 {
    let position = raw_position(state);
    match state.duration_ms {
        0 => position,
        duration => position.min(duration),
    }
}

impl AudioEngine for MockEngine {
    fn load(&mut self, uri: &str) -> Result<()> {
        let gate = self.inner.lock().unwrap().gate.take();
        if let Some(gate) = gate {
            let _ = gate.entered.send(());
            let _ = gate.release.recv();
        }

        let mut state = self.inner.lock().unwrap();
        state.calls.push(format!("load {}", uri));
        if state.rejected.contains(uri) {
            return Err(Error::load(uri, "unsupported format"));
        }
        state.loaded = Some(uri.to_string());
        state.clock = Clock::Paused { at_ms: 0 };
        state.frozen_at = None;
        state.end_signalled = false;
        Ok(())
    }

    fn play(&mut self) {
        let mut state = self.inner.lock().unwrap();
        state.calls.push("play".to_string());
        if let Clock::Paused { at_ms } = state.clock {
            state.clock = Clock::Running {
                since: Instant::now(),
                offset_ms: at_ms,
            };
        }
    }

    fn pause(&mut self) {
        let mut state = self.inner.lock().unwrap();
        state.calls.push("pause".to_string());
        let at_ms = position_of(&state);
        state.clock = Clock::Paused { at_ms };
    }

    fn stop(&mut self) {
        let mut state = self.inner.lock().unwrap();
        state.calls.push("stop".to_string());
        state.loaded = None;
        state.clock = Clock::Idle;
        state.frozen_at = None;
    }

    fn position_ms(&self) -> u64 {
        position_of(&self.inner.lock().unwrap())
    }

    fn duration_ms(&self) -> u64 {
        let state = self.inner.lock().unwrap();
        if state.loaded.is_some() {
            state.duration_ms
        } else {
            0
        }
    }

    fn reached_end(&self) -> bool {
        self.inner.lock().unwrap().end_signalled
    }
}

/// Coordinator over a [`MockEngine`] polling every [`POLL_INTERVAL`]
pub fn spawn_coordinator(engine: &MockEngine) -> (CoordinatorHandle, JoinHandle<()>) {
    spawn_coordinator_with(
        engine,
        CoordinatorConfig {
            poll_interval: POLL_INTERVAL,
            ..Default::default()
        },
    )
}

pub fn spawn_coordinator_with(
    engine: &MockEngine,
    config: CoordinatorConfig,
) -> (CoordinatorHandle, JoinHandle<()>) {
    Coordinator::spawn(engine.clone(), LogPresenter::new(), config)
}

/// Next event, failing the test if none arrives within five (virtual) seconds
pub async fn next_event(events: &mut EventReceiver) -> PlayerEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event stream closed")
}

/// Receive events until a `Stopped` arrives, returning all of them
pub async fn events_until_stopped(subscription: &mut Subscription) -> Vec<PlayerEvent> {
    let mut seen = Vec::new();
    loop {
        let event = next_event(&mut subscription.events).await;
        let done = matches!(event, PlayerEvent::Stopped { .. });
        seen.push(event);
        if done {
            return seen;
        }
    }
}
