//! Audio engine boundary
//!
//! The coordinator drives playback exclusively through [`AudioEngine`]. The
//! engine is owned by the coordinator task, so implementations only need to
//! be `Send`.

pub mod clock;

pub use clock::ClockEngine;

use crate::error::Result;

/// Narrow contract the playback core needs from an audio backend
pub trait AudioEngine: Send + 'static {
    /// Prepare `uri` for playback. Must not start audio.
    ///
    /// Returns `Error::Load` when the source is missing or unsupported.
    fn load(&mut self, uri: &str) -> Result<()>;

    /// Start or resume playback of the loaded source
    fn play(&mut self);

    /// Pause playback, keeping the position
    fn pause(&mut self);

    /// Stop playback and release the loaded source
    fn stop(&mut self);

    /// Current position in milliseconds
    fn position_ms(&self) -> u64;

    /// Total duration in milliseconds, 0 until metadata is known
    fn duration_ms(&self) -> u64;

    /// Explicit end-of-media signal for engines that have one
    fn reached_end(&self) -> bool {
        false
    }
}

impl<E: AudioEngine + ?Sized> AudioEngine for Box<E> {
    fn load(&mut self, uri: &str) -> Result<()> {
        (**self).load(uri)
    }

    fn play(&mut self) {
        (**self).play()
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn position_ms(&self) -> u64 {
        (**self).position_ms()
    }

    fn duration_ms(&self) -> u64 {
        (**self).duration_ms()
    }

    fn reached_end(&self) -> bool {
        (**self).reached_end()
    }
}
