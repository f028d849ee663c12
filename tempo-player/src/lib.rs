//! tempo-player library
//!
//! Background playback coordinator: one playback state machine shared by any
//! number of clients, with periodic progress broadcasts.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod library;
pub mod playback;

pub use error::{Error, Result};
