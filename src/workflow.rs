use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::backend::{DubBackend, DubBackendFactory, check_backend_availability};
use crate::config::{Config, LanguageOption};
use crate::error::{Result, DubError};
use crate::form::{FormState, SelectedFile, TargetLanguage};
use crate::handler::{SubmissionHandler, SubmissionOutcome};
use crate::view::DubView;

pub struct Workflow {
    config: Config,
    handler: SubmissionHandler,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let backend = DubBackendFactory::create_backend(config.backend.clone())?;
        Ok(Self::with_backend(config, backend))
    }

    pub fn with_backend(config: Config, backend: Box<dyn DubBackend>) -> Self {
        info!("Using dubbing backend at {}", backend.endpoint());
        let handler = SubmissionHandler::new(&config, backend);
        Self { config, handler }
    }

    pub fn handler(&self) -> &SubmissionHandler {
        &self.handler
    }

    /// Languages offered by the selector, default first
    pub fn languages(&self) -> Vec<&LanguageOption> {
        let default = &self.config.ui.default_language;
        let mut languages: Vec<_> = self.config.ui.languages.iter().collect();
        languages.sort_by_key(|l| l.code != *default);
        languages
    }

    /// Fill the form from the command line and submit it once.
    ///
    /// A missing `input` is submitted as an empty file selection. When the
    /// dub is displayed it is also saved to `output`, or next to the input
    /// as `{stem}_{lang}.mp4`.
    pub async fn dub_file<V: DubView + ?Sized>(
        &self,
        input: Option<&Path>,
        language: Option<&str>,
        output: Option<&Path>,
        view: &V,
    ) -> Result<SubmissionOutcome> {
        let language = TargetLanguage::new(language.unwrap_or(&self.config.ui.default_language));
        if !language.is_offered_by(&self.config.ui) {
            warn!("Target language '{}' is not in the language menu, sending it anyway", language);
        }

        let file = match input {
            Some(path) => {
                info!("Processing video file: {}", path.display());
                Some(SelectedFile::from_path(path).await?)
            }
            None => None,
        };

        let form = FormState::new(file, language);
        let outcome = self.handler.submit(&form, view).await;

        if outcome.is_displayed() {
            let dest = match (output, input) {
                (Some(output), _) => output.to_path_buf(),
                (None, Some(input)) => default_output_path(input, &form.language)?,
                (None, None) => return Err(DubError::Config("Cannot determine output path".to_string())),
            };
            self.handler.media().persist_current(&dest).await?;
        }

        Ok(outcome)
    }

    /// Check the backend answers before uploading anything
    pub async fn check_backend(&self) -> Result<()> {
        check_backend_availability(&self.config.backend.base_url).await
    }

    /// Release the displayed media
    pub fn teardown(&self) {
        self.handler.teardown();
    }
}

/// `{dir}/{stem}_{lang}.mp4` beside the input video
pub fn default_output_path(input: &Path, language: &TargetLanguage) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .ok_or_else(|| DubError::Config("Invalid video filename".to_string()))?
        .to_string_lossy();
    let dir = input.parent().unwrap_or_else(|| Path::new(""));
    Ok(dir.join(format!("{}_{}.mp4", stem, language)))
}
