use reqwest::Url;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

use crate::backend::{DubBackend, DubRequest, DubResponse, ServerErrorBody};
use crate::config::Config;
use crate::form::FormState;
use crate::media::{MediaSlot, MediaStore};
use crate::view::{DubView, ViewState};

pub const NO_FILE_ALERT: &str = "Please select a file.";
pub const BUSY_ALERT: &str = "A dub request is already in progress.";

/// How a single submission ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Nothing was sent
    Rejected { reason: String },
    /// The dubbed video is now shown
    Displayed { url: Url, bytes: usize },
    /// The backend answered with a non-2xx status
    ServerError { status: u16, body: String },
    /// No response was obtained
    TransportError { message: String },
}

impl SubmissionOutcome {
    pub fn is_displayed(&self) -> bool {
        matches!(self, Self::Displayed { .. })
    }

    /// Process exit status: 0 once the video is shown, 1 otherwise.
    /// The view has already told the user why.
    pub fn exit_status(&self) -> u8 {
        if self.is_displayed() { 0 } else { 1 }
    }
}

/// Drives the upload form: validate, upload, then show the result or an alert.
///
/// Submissions take `&self` and may overlap; each one is an independent
/// request and whichever settles last owns the video.
pub struct SubmissionHandler {
    backend: Box<dyn DubBackend>,
    media: MediaStore,
    slot: MediaSlot,
    state: Mutex<ViewState>,
    in_flight: AtomicUsize,
    block_concurrent: bool,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SubmissionHandler {
    pub fn new(config: &Config, backend: Box<dyn DubBackend>) -> Self {
        Self {
            backend,
            media: MediaStore::new(config.media.media_dir.clone()),
            slot: MediaSlot::new(),
            state: Mutex::new(ViewState::Idle),
            in_flight: AtomicUsize::new(0),
            block_concurrent: config.ui.block_concurrent_submissions,
        }
    }

    pub fn state(&self) -> ViewState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Media currently assigned to the video element
    pub fn media(&self) -> &MediaSlot {
        &self.slot
    }

    /// Handle one submit of the form
    pub async fn submit<V: DubView + ?Sized>(&self, form: &FormState, view: &V) -> SubmissionOutcome {
        let Some(file) = form.file.clone() else {
            debug!("Submission without a file, nothing sent");
            view.alert(NO_FILE_ALERT);
            return SubmissionOutcome::Rejected { reason: NO_FILE_ALERT.to_string() };
        };

        let Some(_guard) = self.begin() else {
            debug!("Submission while another request is in flight, nothing sent");
            view.alert(BUSY_ALERT);
            return SubmissionOutcome::Rejected { reason: BUSY_ALERT.to_string() };
        };

        let source_name = file.file_name.clone();
        let request = DubRequest {
            file,
            language: form.language.clone(),
        };

        match self.backend.dub(request).await {
            Ok(response) if response.is_success() => self.display(response, &source_name, view).await,
            Ok(response) => self.server_failure(response, view),
            Err(e) => self.transport_failure(e.to_string(), view),
        }
    }

    /// Revoke the shown media. The view keeps its visibility.
    pub fn teardown(&self) {
        if self.slot.clear() {
            info!("Released dubbed video on teardown");
        }
    }

    fn begin(&self) -> Option<InFlight<'_>> {
        let previous = self.in_flight.fetch_add(1, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight);
        if self.block_concurrent && previous > 0 {
            return None;
        }
        Some(guard)
    }

    async fn display<V: DubView + ?Sized>(
        &self,
        response: DubResponse,
        source_name: &str,
        view: &V,
    ) -> SubmissionOutcome {
        let bytes = response.body.len();
        let media = match self.media.create(&response.body, Some(source_name)).await {
            Ok(media) => media,
            Err(e) => return self.transport_failure(e.to_string(), view),
        };

        let url = self.slot.replace(media, |url| {
            view.set_video_source(url);
            view.reveal_video();
            view.reveal_output();
            *self.state.lock().unwrap_or_else(|e| e.into_inner()) = ViewState::Revealed;
        });

        info!("Dubbed video ready ({} bytes): {}", bytes, url);
        SubmissionOutcome::Displayed { url, bytes }
    }

    fn server_failure<V: DubView + ?Sized>(&self, response: DubResponse, view: &V) -> SubmissionOutcome {
        let body = response.text();
        match ServerErrorBody::parse(&body) {
            Some(parsed) => warn!("Dub request failed with {}: {}", response.status, parsed.message),
            None => warn!("Dub request failed with {}", response.status),
        }

        view.alert(&format!("Error generating dub: {}", body));
        SubmissionOutcome::ServerError {
            status: response.status,
            body,
        }
    }

    fn transport_failure<V: DubView + ?Sized>(&self, message: String, view: &V) -> SubmissionOutcome {
        view.alert(&format!("Error sending request: {}", message));
        view.log_error(&message);
        SubmissionOutcome::TransportError { message }
    }
}
