//! Presentation surface (now-playing notification)

use tempo_common::time::format_clock;
use tempo_common::ProgressSample;
use tracing::{info, trace};

/// Sink for the now-playing title and progress bar
pub trait Presenter: Send + 'static {
    /// A track started; show its title with an empty progress bar
    fn show(&mut self, title: &str, duration_ms: u64);

    /// Progress tick for the shown track
    fn update(&mut self, sample: &ProgressSample);

    /// Playback stopped; remove the notification
    fn cancel(&mut self);
}

/// Renders the notification through tracing
#[derive(Debug, Default)]
pub struct LogPresenter {
    title: Option<String>,
}

impl LogPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Title currently shown, if any
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

impl Presenter for LogPresenter {
    fn show(&mut self, title: &str, duration_ms: u64) {
        info!("Now playing: {} [{}]", title, format_clock(duration_ms));
        self.title = Some(title.to_string());
    }

    fn update(&mut self, sample: &ProgressSample) {
        if let Some(title) = &self.title {
            trace!(
                "{} {} ({:.0}%)",
                title,
                sample.display(),
                sample.fraction() * 100.0
            );
        }
    }

    fn cancel(&mut self) {
        if let Some(title) = self.title.take() {
            info!("Playback of {} ended", title);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_and_cancel() {
        let mut presenter = LogPresenter::new();
        presenter.show("song.mp3", 200_000);
        assert_eq!(presenter.title(), Some("song.mp3"));

        presenter.update(&ProgressSample::new(65_000, 200_000));
        presenter.cancel();
        assert_eq!(presenter.title(), None);
    }
}
