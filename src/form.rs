use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::config::UiConfig;
use crate::error::{Result, DubError};

/// Where the upload body comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    /// Contents already in memory
    Memory(Vec<u8>),
    /// File on disk, streamed when the request is sent
    Disk { path: PathBuf, len: u64 },
}

/// Video file picked by the user for one submission
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub file_name: String,
    pub source: FileSource,
}

impl SelectedFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            source: FileSource::Memory(bytes),
        }
    }

    /// Select a file on disk. Only its metadata is read here.
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let metadata = match fs::metadata(path).await {
            Ok(m) if m.is_file() => m,
            _ => return Err(DubError::FileNotFound(path.display().to_string())),
        };

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| DubError::Validation(format!("Invalid file name: {}", path.display())))?;
        debug!("Selected {} ({} bytes)", path.display(), metadata.len());

        Ok(Self {
            file_name,
            source: FileSource::Disk {
                path: path.to_path_buf(),
                len: metadata.len(),
            },
        })
    }

    pub fn len(&self) -> u64 {
        match &self.source {
            FileSource::Memory(bytes) => bytes.len() as u64,
            FileSource::Disk { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.file_name).extension().and_then(|e| e.to_str())
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("SelectedFile");
        s.field("file_name", &self.file_name);
        if let FileSource::Disk { path, .. } = &self.source {
            s.field("path", path);
        }
        s.field("len", &self.len()).finish()
    }
}

/// Destination language code for the dubbed audio track
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetLanguage(String);

impl TargetLanguage {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the language is one of the selector's menu entries.
    /// Codes outside the menu are still sent; the backend decides.
    pub fn is_offered_by(&self, ui: &UiConfig) -> bool {
        ui.find_language(&self.0).is_some()
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of the upload form at submit time
#[derive(Debug, Clone)]
pub struct FormState {
    pub file: Option<SelectedFile>,
    pub language: TargetLanguage,
}

impl FormState {
    pub fn new(file: Option<SelectedFile>, language: TargetLanguage) -> Self {
        Self { file, language }
    }

    /// Empty form with the selector on its default entry
    pub fn with_default_language(ui: &UiConfig) -> Self {
        Self::new(None, TargetLanguage::new(ui.default_language.clone()))
    }
}
