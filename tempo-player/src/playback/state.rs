//! Playback state machine
//!
//! Authoritative STOPPED/PLAYING/PAUSED state plus the current track. Every
//! engine call goes through here so the state and the engine never disagree.
//!
//! Transitions:
//! - Stopped → Playing (load; loading starts playback)
//! - Playing → Paused (pause)
//! - Paused → Playing (play)
//! - any → Stopped (stop, end of media)

use crate::engine::AudioEngine;
use crate::error::Result;
use crate::playback::track::Track;
use tempo_common::PlaybackState;
use tracing::{debug, info, warn};

pub struct PlaybackStateMachine {
    engine: Box<dyn AudioEngine>,
    state: PlaybackState,
    track: Option<Track>,
}

impl PlaybackStateMachine {
    pub fn new(engine: Box<dyn AudioEngine>) -> Self {
        Self {
            engine,
            state: PlaybackState::Stopped,
            track: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    /// Loading `uri` again would restart the track that is already active
    pub fn is_redundant_load(&self, uri: &str) -> bool {
        self.state != PlaybackState::Stopped
            && self.track.as_ref().is_some_and(|t| t.is_source(uri))
    }

    /// Load `track` and start playing it.
    ///
    /// The machine knows nothing of progress loops. The coordinator stops the
    /// previous track and joins its loop before calling this; the force-stop
    /// below only keeps the engine and state in step for other callers.
    /// On failure the machine stays Stopped.
    pub fn request_load(&mut self, track: Track) -> Result<&Track> {
        if self.state != PlaybackState::Stopped {
            warn!("Load requested while {}, forcing stop first", self.state);
            self.request_stop();
        }

        self.engine.load(track.uri())?;
        self.engine.play();
        self.state = PlaybackState::Playing;

        info!("Playback state changed: stopped -> playing ({})", track.uri());
        Ok(&*self.track.insert(track))
    }

    /// Resume; only effective while Paused
    pub fn request_play(&mut self) -> bool {
        if self.state != PlaybackState::Paused {
            debug!("Play ignored while {}", self.state);
            return false;
        }
        self.engine.play();
        self.state = PlaybackState::Playing;
        info!("Playback state changed: paused -> playing");
        true
    }

    /// Pause; only effective while Playing
    pub fn request_pause(&mut self) -> bool {
        if self.state != PlaybackState::Playing {
            debug!("Pause ignored while {}", self.state);
            return false;
        }
        self.engine.pause();
        self.state = PlaybackState::Paused;
        info!("Playback state changed: playing -> paused");
        true
    }

    /// Stop the engine and drop the track.
    ///
    /// Returns the track that was stopped, or None if already Stopped.
    pub fn request_stop(&mut self) -> Option<Track> {
        if self.state == PlaybackState::Stopped {
            debug!("Stop ignored while stopped");
            return None;
        }
        let old_state = self.state;
        self.engine.stop();
        self.state = PlaybackState::Stopped;
        info!("Playback state changed: {} -> stopped", old_state);
        self.track.take()
    }

    pub fn position_ms(&self) -> u64 {
        self.engine.position_ms()
    }

    pub fn duration_ms(&self) -> u64 {
        self.engine.duration_ms()
    }

    pub fn engine_reached_end(&self) -> bool {
        self.engine.reached_end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::{Arc, Mutex};

    /// Engine that records calls and rejects uris containing "bad"
    #[derive(Default, Clone)]
    struct RecordingEngine {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingEngine {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl AudioEngine for RecordingEngine {
        fn load(&mut self, uri: &str) -> Result<()> {
            self.calls.lock().unwrap().push(format!("load {}", uri));
            if uri.contains("bad") {
                return Err(Error::load(uri, "rejected"));
            }
            Ok(())
        }
        fn play(&mut self) {
            self.calls.lock().unwrap().push("play".into());
        }
        fn pause(&mut self) {
            self.calls.lock().unwrap().push("pause".into());
        }
        fn stop(&mut self) {
            self.calls.lock().unwrap().push("stop".into());
        }
        fn position_ms(&self) -> u64 {
            0
        }
        fn duration_ms(&self) -> u64 {
            0
        }
    }

    fn machine() -> (PlaybackStateMachine, RecordingEngine) {
        let engine = RecordingEngine::default();
        (PlaybackStateMachine::new(Box::new(engine.clone())), engine)
    }

    #[test]
    fn test_load_starts_playing() {
        let (mut sm, engine) = machine();
        let track = sm.request_load(Track::new("/music/a.mp3")).unwrap();
        assert_eq!(track.display_name(), "a.mp3");
        assert_eq!(sm.state(), PlaybackState::Playing);
        assert_eq!(engine.calls(), vec!["load /music/a.mp3", "play"]);
    }

    #[test]
    fn test_failed_load_stays_stopped() {
        let (mut sm, engine) = machine();
        assert!(sm.request_load(Track::new("/music/bad.mp3")).is_err());
        assert_eq!(sm.state(), PlaybackState::Stopped);
        assert!(sm.track().is_none());
        assert_eq!(engine.calls(), vec!["load /music/bad.mp3"]);
    }

    #[test]
    fn test_pause_and_play_guards() {
        let (mut sm, _) = machine();
        assert!(!sm.request_pause());
        assert!(!sm.request_play());

        sm.request_load(Track::new("/music/a.mp3")).unwrap();
        assert!(!sm.request_play());
        assert!(sm.request_pause());
        assert_eq!(sm.state(), PlaybackState::Paused);
        assert!(!sm.request_pause());
        assert!(sm.request_play());
        assert_eq!(sm.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_stop_from_any_state() {
        let (mut sm, _) = machine();
        assert!(sm.request_stop().is_none());

        sm.request_load(Track::new("/music/a.mp3")).unwrap();
        sm.request_pause();
        let stopped = sm.request_stop().unwrap();
        assert_eq!(stopped.uri(), "/music/a.mp3");
        assert_eq!(sm.state(), PlaybackState::Stopped);
        assert!(sm.track().is_none());
    }

    #[test]
    fn test_load_over_active_track_force_stops() {
        let (mut sm, engine) = machine();
        sm.request_load(Track::new("/music/a.mp3")).unwrap();
        sm.request_load(Track::new("/music/b.mp3")).unwrap();

        assert_eq!(sm.track().unwrap().uri(), "/music/b.mp3");
        assert_eq!(
            engine.calls(),
            vec!["load /music/a.mp3", "play", "stop", "load /music/b.mp3", "play"]
        );
    }

    #[test]
    fn test_redundant_load_detection() {
        let (mut sm, _) = machine();
        assert!(!sm.is_redundant_load("/music/a.mp3"));

        sm.request_load(Track::new("/music/a.mp3")).unwrap();
        assert!(sm.is_redundant_load("/music/a.mp3"));
        assert!(!sm.is_redundant_load("/music/b.mp3"));

        sm.request_pause();
        assert!(sm.is_redundant_load("/music/a.mp3"));

        sm.request_stop();
        assert!(!sm.is_redundant_load("/music/a.mp3"));
    }
}
