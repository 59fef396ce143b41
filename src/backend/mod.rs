// Dubbing backend access
//
// The handler only talks to the backend through the DubBackend trait:
// - http: reqwest client posting multipart uploads to the dub endpoint
//
// Tests substitute a mock backend so the submission flow can be exercised
// without a live service.

pub mod http;

use async_trait::async_trait;

pub use http::*;

use crate::config::BackendConfig;
use crate::error::Result;
use crate::form::{SelectedFile, TargetLanguage};

/// One dub submission: the video plus the language to dub into
#[derive(Debug, Clone)]
pub struct DubRequest {
    pub file: SelectedFile,
    pub language: TargetLanguage,
}

/// Whatever the backend answered, before any interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DubResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl DubResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Main trait for talking to the dubbing service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DubBackend: Send + Sync {
    /// Send one dub request. Any HTTP status is a response; only failures
    /// to obtain one are errors (`DubError::Transport`).
    async fn dub(&self, request: DubRequest) -> Result<DubResponse>;

    /// Describe the endpoint for logs
    fn endpoint(&self) -> String;
}

/// Factory for creating backend instances
pub struct DubBackendFactory;

impl DubBackendFactory {
    /// Create the default HTTP backend
    pub fn create_backend(config: BackendConfig) -> Result<Box<dyn DubBackend>> {
        Ok(Box::new(HttpDubBackend::new(config)?))
    }
}
