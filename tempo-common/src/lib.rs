//! # Tempo Common Library
//!
//! Shared code for the tempo playback service and its clients:
//! - Event types broadcast to subscribers (PlayerEvent enum)
//! - Playback state and progress sample types
//! - Bootstrap configuration loading
//! - Time display formatting

pub mod config;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
pub use events::{PlaybackState, PlayerEvent, ProgressSample, StopReason};
