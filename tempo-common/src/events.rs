//! Event types for the tempo event surface
//!
//! Every event a subscriber can receive is a [`PlayerEvent`]. Events are
//! serialized with a `type` tag so SSE clients can dispatch on it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time::{self, format_progress};

/// Playback state enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Stopped => write!(f, "stopped"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
        }
    }
}

/// Why playback returned to idle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Explicit Stop command
    UserRequested,
    /// A new track was loaded over the current one
    Superseded,
    /// Position reached the duration or the engine signalled end of media
    EndOfMedia,
    /// Position stopped advancing while playing
    Stalled,
    /// Service shutting down
    Shutdown,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::UserRequested => write!(f, "user_requested"),
            StopReason::Superseded => write!(f, "superseded"),
            StopReason::EndOfMedia => write!(f, "end_of_media"),
            StopReason::Stalled => write!(f, "stalled"),
            StopReason::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// One progress reading for the loaded track.
///
/// `position_ms` never exceeds `duration_ms`. A duration of zero means the
/// engine has not reported metadata yet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ProgressSample {
    pub position_ms: u64,
    pub duration_ms: u64,
}

impl ProgressSample {
    /// Build a sample, clamping the position to the duration
    pub fn new(position_ms: u64, duration_ms: u64) -> Self {
        Self {
            position_ms: position_ms.min(duration_ms),
            duration_ms,
        }
    }

    /// Fraction of the track played, 0.0 when the duration is unknown
    pub fn fraction(&self) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        self.position_ms as f64 / self.duration_ms as f64
    }

    /// `MM:SS / MM:SS` display string
    pub fn display(&self) -> String {
        format_progress(self.position_ms, self.duration_ms)
    }
}

/// Events broadcast to every registered client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// A track was loaded and playback started
    ///
    /// Always sent before the first Progress event for that track.
    NowPlaying {
        /// Source locator as given to Load
        uri: String,
        /// Name shown by clients (last path segment of the uri)
        display_name: String,
        timestamp: DateTime<Utc>,
    },

    /// Periodic position update for the current track
    Progress {
        position_ms: u64,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Playback returned to idle; clients clear the display name and progress
    Stopped {
        reason: StopReason,
        timestamp: DateTime<Utc>,
    },

    /// The engine rejected a Load request
    LoadFailed {
        uri: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl PlayerEvent {
    pub fn now_playing(uri: impl Into<String>, display_name: impl Into<String>) -> Self {
        PlayerEvent::NowPlaying {
            uri: uri.into(),
            display_name: display_name.into(),
            timestamp: time::now(),
        }
    }

    pub fn progress(sample: ProgressSample) -> Self {
        PlayerEvent::Progress {
            position_ms: sample.position_ms,
            duration_ms: sample.duration_ms,
            timestamp: time::now(),
        }
    }

    pub fn stopped(reason: StopReason) -> Self {
        PlayerEvent::Stopped {
            reason,
            timestamp: time::now(),
        }
    }

    pub fn load_failed(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        PlayerEvent::LoadFailed {
            uri: uri.into(),
            reason: reason.into(),
            timestamp: time::now(),
        }
    }

    /// Event name used for the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            PlayerEvent::NowPlaying { .. } => "NowPlaying",
            PlayerEvent::Progress { .. } => "Progress",
            PlayerEvent::Stopped { .. } => "Stopped",
            PlayerEvent::LoadFailed { .. } => "LoadFailed",
        }
    }
}
