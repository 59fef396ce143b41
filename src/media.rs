use chrono::{DateTime, Utc};
use reqwest::Url;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempPath;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Result, DubError};

/// Local, revocable reference to a dubbed video.
///
/// The media lives in its own file until the reference is revoked or
/// dropped, at which point the file is removed.
#[derive(Debug)]
pub struct MediaRef {
    url: Url,
    size: usize,
    created_at: DateTime<Utc>,
    file: TempPath,
}

impl MediaRef {
    /// `file://` URL a player can open
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Release the underlying media now instead of on drop
    pub fn revoke(self) -> Result<()> {
        let url = self.url.clone();
        let held = Utc::now().signed_duration_since(self.created_at);
        self.file
            .close()
            .map_err(|e| DubError::Media(format!("Failed to revoke {}: {}", url, e)))?;
        debug!("Revoked media reference {} after {}s", url, held.num_seconds());
        Ok(())
    }
}

/// Creates media references under one directory
#[derive(Debug, Clone)]
pub struct MediaStore {
    dir: PathBuf,
}

impl MediaStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Store a response body and hand back a reference to it.
    /// `source_name` only contributes its extension; mp4 otherwise.
    pub async fn create(&self, bytes: &[u8], source_name: Option<&str>) -> Result<MediaRef> {
        fs::create_dir_all(&self.dir).await?;
        let dir = std::path::absolute(&self.dir)?;

        let ext = source_name
            .and_then(|n| Path::new(n).extension())
            .and_then(|e| e.to_str())
            .unwrap_or("mp4");
        let path = dir.join(format!("{}.{}", Uuid::new_v4(), ext));

        fs::write(&path, bytes).await?;
        let file = TempPath::from_path(path.clone());

        let url = Url::from_file_path(&path)
            .map_err(|_| DubError::Media(format!("Cannot express {} as a URL", path.display())))?;
        debug!("Created media reference {} ({} bytes)", url, bytes.len());

        Ok(MediaRef {
            url,
            size: bytes.len(),
            created_at: Utc::now(),
            file,
        })
    }
}

/// Holder of the media currently shown by a view: at most one at a time
#[derive(Debug, Default)]
pub struct MediaSlot {
    current: Mutex<Option<MediaRef>>,
}

impl MediaSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke whatever is shown, take ownership of `next`, then run `show`
    /// with its URL. The slot stays locked until `show` returns, so a
    /// concurrent replace cannot revoke the media while it is being shown.
    pub fn replace<F>(&self, next: MediaRef, show: F) -> Url
    where
        F: FnOnce(&Url),
    {
        let url = next.url().clone();
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = current.take() {
            if let Err(e) = previous.revoke() {
                warn!("{}", e);
            }
        }
        *current = Some(next);
        show(&url);
        url
    }

    /// Revoke the current media, if any. Returns whether something was shown.
    pub fn clear(&self) -> bool {
        let previous = self.current.lock().unwrap_or_else(|e| e.into_inner()).take();
        match previous {
            Some(media) => {
                if let Err(e) = media.revoke() {
                    warn!("{}", e);
                }
                true
            }
            None => false,
        }
    }

    pub fn current_url(&self) -> Option<Url> {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|m| m.url().clone())
    }

    pub fn current_path(&self) -> Option<PathBuf> {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|m| m.path().to_path_buf())
    }

    /// Copy the current media to `dest`
    pub async fn persist_current<P: AsRef<Path>>(&self, dest: P) -> Result<()> {
        let source = self
            .current_path()
            .ok_or_else(|| DubError::Media("No dubbed video to save".to_string()))?;
        let dest = dest.as_ref();
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(&source, dest).await?;
        info!("Saved dubbed video to {}", dest.display());
        Ok(())
    }
}
