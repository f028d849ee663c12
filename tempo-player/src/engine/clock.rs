//! Clock-driven engine backed by symphonia probing
//!
//! `load` opens the source and probes it with symphonia, which rejects
//! missing files and unsupported containers/codecs and yields the duration.
//! While playing, the position follows a monotonic clock; paused time does
//! not count and the position never passes the duration.

use crate::engine::AudioEngine;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tokio::time::Instant;
use tracing::debug;

/// Loaded source metadata
#[derive(Debug, Clone)]
struct LoadedSource {
    path: PathBuf,
    duration_ms: u64,
}

#[derive(Debug, Clone, Copy)]
enum PlayClock {
    Idle,
    Running { since: Instant, offset_ms: u64 },
    Paused { at_ms: u64 },
}

/// Headless engine: validates sources and keeps time
pub struct ClockEngine {
    root_folder: Option<PathBuf>,
    loaded: Option<LoadedSource>,
    clock: PlayClock,
}

impl ClockEngine {
    pub fn new() -> Self {
        Self {
            root_folder: None,
            loaded: None,
            clock: PlayClock::Idle,
        }
    }

    /// Resolve relative uris against `root_folder`
    pub fn with_root_folder(root_folder: impl Into<PathBuf>) -> Self {
        Self {
            root_folder: Some(root_folder.into()),
            ..Self::new()
        }
    }

    /// Map a uri (plain path or `file://` url) to a filesystem path
    pub fn resolve(&self, uri: &str) -> PathBuf {
        let raw = uri.strip_prefix("file://").unwrap_or(uri);
        let path = PathBuf::from(raw);
        match &self.root_folder {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        }
    }

    /// Path of the loaded source, if any
    pub fn loaded_path(&self) -> Option<&Path> {
        self.loaded.as_ref().map(|s| s.path.as_path())
    }

    fn raw_position_ms(&self) -> u64 {
        match self.clock {
            PlayClock::Idle => 0,
            PlayClock::Paused { at_ms } => at_ms,
            PlayClock::Running { since, offset_ms } => {
                offset_ms + since.elapsed().as_millis() as u64
            }
        }
    }
}

impl Default for ClockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine for ClockEngine {
    fn load(&mut self, uri: &str) -> Result<()> {
        let path = self.resolve(uri);
        let duration_ms = probe_duration_ms(&path).map_err(|reason| Error::load(uri, reason))?;

        debug!("Loaded {} ({} ms)", path.display(), duration_ms);
        self.loaded = Some(LoadedSource { path, duration_ms });
        self.clock = PlayClock::Paused { at_ms: 0 };
        Ok(())
    }

    fn play(&mut self) {
        if self.loaded.is_none() {
            return;
        }
        if let PlayClock::Paused { at_ms } = self.clock {
            self.clock = PlayClock::Running {
                since: Instant::now(),
                offset_ms: at_ms,
            };
        }
    }

    fn pause(&mut self) {
        if let PlayClock::Running { .. } = self.clock {
            self.clock = PlayClock::Paused {
                at_ms: self.position_ms(),
            };
        }
    }

    fn stop(&mut self) {
        self.loaded = None;
        self.clock = PlayClock::Idle;
    }

    fn position_ms(&self) -> u64 {
        let position = self.raw_position_ms();
        match self.duration_ms() {
            0 => position,
            duration => position.min(duration),
        }
    }

    fn duration_ms(&self) -> u64 {
        self.loaded.as_ref().map_or(0, |s| s.duration_ms)
    }

    fn reached_end(&self) -> bool {
        let duration = self.duration_ms();
        duration > 0 && self.raw_position_ms() >= duration
    }
}

/// Probe `path` and return its duration in milliseconds.
///
/// Returns 0 when the container does not declare a frame count. Errors are
/// human-readable reasons suitable for a LoadFailed event.
pub fn probe_duration_ms(path: &Path) -> std::result::Result<u64, String> {
    let file = std::fs::File::open(path)
        .map_err(|e| format!("cannot open {}: {}", path.display(), e))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| format!("unsupported format: {}", e))?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| "no audio track found".to_string())?;

    let params = &track.codec_params;
    symphonia::default::get_codecs()
        .make(params, &DecoderOptions::default())
        .map_err(|e| format!("unsupported codec: {}", e))?;

    let Some(n_frames) = params.n_frames else {
        return Ok(0);
    };

    if let Some(time_base) = params.time_base {
        let time = time_base.calc_time(n_frames);
        return Ok(time.seconds * 1000 + (time.frac * 1000.0) as u64);
    }

    Ok(params
        .sample_rate
        .map_or(0, |rate| n_frames * 1000 / u64::from(rate)))
}
