//! Playback core
//!
//! The [`Coordinator`] task owns the [`PlaybackStateMachine`], the
//! [`ClientRegistry`] and at most one [`ProgressLoop`]. Everything else talks
//! to it through a [`CoordinatorHandle`].

pub mod coordinator;
pub mod presenter;
pub mod progress;
pub mod registry;
pub mod state;
pub mod track;

pub use coordinator::{
    Coordinator, CoordinatorConfig, CoordinatorHandle, StatusSnapshot, Subscription,
};
pub use presenter::{LogPresenter, Presenter};
pub use progress::{ProgressLoop, ProgressTracker, TickVerdict};
pub use registry::{BroadcastReport, ClientId, ClientRegistry, EventReceiver, EventSender};
pub use state::PlaybackStateMachine;
pub use track::Track;
