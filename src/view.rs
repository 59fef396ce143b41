use reqwest::Url;
use std::sync::Mutex;
use tracing::error;

/// Visibility of the output area: hidden until the first dub succeeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Idle,
    Revealed,
}

/// What the submission handler needs from the page it drives
pub trait DubView: Send + Sync {
    /// Blocking, user-facing error notice
    fn alert(&self, message: &str);

    /// Diagnostic detail that is not meant for the user
    fn log_error(&self, message: &str);

    /// Point the video element at new media
    fn set_video_source(&self, url: &Url);

    fn reveal_video(&self);

    fn reveal_output(&self);
}

/// View for the command line: alerts go to stderr, the video location to stdout
#[derive(Debug, Default)]
pub struct TerminalView {
    state: Mutex<ViewState>,
    video_source: Mutex<Option<Url>>,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ViewState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn video_source(&self) -> Option<Url> {
        self.video_source.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl DubView for TerminalView {
    fn alert(&self, message: &str) {
        eprintln!("{}", message);
    }

    fn log_error(&self, message: &str) {
        error!("Error sending dub request: {}", message);
    }

    fn set_video_source(&self, url: &Url) {
        *self.video_source.lock().unwrap_or_else(|e| e.into_inner()) = Some(url.clone());
    }

    fn reveal_video(&self) {
        if let Some(url) = self.video_source() {
            println!("Dubbed video: {}", url);
        }
    }

    fn reveal_output(&self) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = ViewState::Revealed;
    }
}
