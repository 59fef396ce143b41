use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Url};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::BackendConfig;
use crate::error::{Result, DubError};
use crate::form::{FileSource, SelectedFile};
use super::{DubBackend, DubRequest, DubResponse};

/// Error body the dubbing service returns alongside a 5xx
#[derive(Debug, Clone, Deserialize)]
pub struct ServerErrorBody {
    pub status: Option<String>,
    pub message: String,
}

impl ServerErrorBody {
    /// Extract the `message` field from a JSON error body, if it is one
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

/// Build `{base_url}{dub_path}?{param}={language}` with the language
/// form-urlencoded, so the backend decodes it back to the literal value.
pub fn build_dub_url(base_url: &str, dub_path: &str, param: &str, language: &str) -> Result<Url> {
    let path = if dub_path.starts_with('/') {
        dub_path.to_string()
    } else {
        format!("/{}", dub_path)
    };
    let raw = format!("{}{}", base_url.trim_end_matches('/'), path);

    let mut url = Url::parse(&raw).map_err(|e| DubError::Url(format!("{}: {}", raw, e)))?;
    url.query_pairs_mut().append_pair(param, language);
    Ok(url)
}

/// Best-effort MIME type for the uploaded video
pub fn guess_video_mime(file_name: &str) -> &'static str {
    let ext = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

/// Dubbing backend reached over HTTP
pub struct HttpDubBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpDubBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        // No timeout: dubbing a long video takes as long as it takes
        let client = Client::builder()
            .user_agent(concat!("dubclient/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(DubError::Http)?;

        Ok(Self { client, config })
    }

    /// Single-part form; files on disk are streamed rather than buffered
    async fn build_form(&self, file: SelectedFile) -> Result<Form> {
        let mime = guess_video_mime(&file.file_name);
        let part = match file.source {
            FileSource::Memory(bytes) => Part::bytes(bytes),
            FileSource::Disk { path, len } => {
                let handle = tokio::fs::File::open(&path).await?;
                Part::stream_with_length(Body::from(handle), len)
            }
        };
        let part = part
            .file_name(file.file_name)
            .mime_str(mime)
            .map_err(DubError::Http)?;

        Ok(Form::new().part(self.config.file_field.clone(), part))
    }
}

#[async_trait]
impl DubBackend for HttpDubBackend {
    async fn dub(&self, request: DubRequest) -> Result<DubResponse> {
        let url = build_dub_url(
            &self.config.base_url,
            &self.config.dub_path,
            &self.config.language_param,
            request.language.as_str(),
        )?;

        info!(
            "Uploading {} ({} bytes) for dubbing into '{}'",
            request.file.file_name,
            request.file.len(),
            request.language
        );
        debug!("Sending dub request to: {}", url);

        let form = self.build_form(request.file).await?;
        let response = self.client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| DubError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| DubError::Transport(e.to_string()))?
            .to_vec();

        debug!("Dub endpoint answered {} with {} bytes", status, body.len());
        Ok(DubResponse { status, body })
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), self.config.dub_path)
    }
}

/// Check that the dubbing service answers at its base address
pub async fn check_backend_availability(base_url: &str) -> Result<()> {
    let client = Client::new();

    let response = client
        .get(base_url)
        .send()
        .await
        .map_err(|e| DubError::Transport(format!("Failed to connect to dubbing backend: {}", e)))?;

    if response.status().is_success() {
        info!("Dubbing backend at '{}' is available", base_url);
        Ok(())
    } else {
        Err(DubError::Transport(format!(
            "Dubbing backend at '{}' answered {}",
            base_url,
            response.status()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::TargetLanguage;
    use axum::extract::{Multipart, Query, State};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::Router;
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Default)]
    struct Captured {
        query: HashMap<String, String>,
        parts: Vec<(String, Option<String>, Vec<u8>)>,
    }

    type Log = Arc<Mutex<Vec<Captured>>>;

    async fn dub_route(
        State(log): State<Log>,
        Query(query): Query<HashMap<String, String>>,
        mut multipart: Multipart,
    ) -> (StatusCode, Vec<u8>) {
        let mut captured = Captured { query, ..Default::default() };
        while let Ok(Some(field)) = multipart.next_field().await {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(|s| s.to_string());
            let data = field.bytes().await.unwrap_or_default().to_vec();
            captured.parts.push((name, file_name, data));
        }

        let lang = captured.query.get("target_lang").cloned().unwrap_or_default();
        log.lock().unwrap().push(captured);

        if lang == "xx" {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"status":"error","message":"Transcription failed or returned empty text"}"#.to_vec(),
            )
        } else {
            (StatusCode::OK, b"DUBBED".to_vec())
        }
    }

    async fn spawn_backend() -> (SocketAddr, Log) {
        let log: Log = Arc::default();
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .route("/dub/", post(dub_route))
            .with_state(log.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, log)
    }

    fn backend_for(addr: SocketAddr) -> HttpDubBackend {
        let config = BackendConfig {
            base_url: format!("http://{}", addr),
            ..BackendConfig::default()
        };
        HttpDubBackend::new(config).unwrap()
    }

    fn request(lang: &str) -> DubRequest {
        DubRequest {
            file: SelectedFile::new("clip.mp4", b"original video".to_vec()),
            language: TargetLanguage::new(lang),
        }
    }

    #[test]
    fn test_build_dub_url() {
        let url = build_dub_url("http://127.0.0.1:8000", "/dub/", "target_lang", "es").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8000/dub/?target_lang=es");

        let url = build_dub_url("http://host/api/", "dub/", "target_lang", "es").unwrap();
        assert_eq!(url.as_str(), "http://host/api/dub/?target_lang=es");
    }

    #[test]
    fn test_build_dub_url_encodes_reserved_characters() {
        let url = build_dub_url("http://127.0.0.1:8000", "/dub/", "target_lang", "pt-BR & more").unwrap();
        assert_eq!(url.query(), Some("target_lang=pt-BR+%26+more"));

        let decoded: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(decoded, vec![("target_lang".to_string(), "pt-BR & more".to_string())]);
    }

    #[test]
    fn test_build_dub_url_rejects_garbage_base() {
        assert!(matches!(
            build_dub_url("not a url", "/dub/", "target_lang", "es"),
            Err(DubError::Url(_))
        ));
    }

    #[test]
    fn test_guess_video_mime() {
        assert_eq!(guess_video_mime("clip.mp4"), "video/mp4");
        assert_eq!(guess_video_mime("CLIP.MOV"), "video/quicktime");
        assert_eq!(guess_video_mime("notes"), "application/octet-stream");
    }

    #[test]
    fn test_server_error_body_parse() {
        let body = ServerErrorBody::parse(r#"{"status":"error","message":"boom"}"#).unwrap();
        assert_eq!(body.message, "boom");
        assert!(ServerErrorBody::parse("Internal Server Error").is_none());
    }

    #[tokio::test]
    async fn test_dub_posts_single_file_part() {
        let (addr, log) = spawn_backend().await;
        let backend = backend_for(addr);

        let response = backend.dub(request("es")).await.unwrap();
        assert!(response.is_success());
        assert_eq!(response.body, b"DUBBED");

        let captured = log.lock().unwrap().clone();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].query.get("target_lang").map(String::as_str), Some("es"));
        assert_eq!(captured[0].parts.len(), 1);
        let (name, file_name, data) = &captured[0].parts[0];
        assert_eq!(name, "file");
        assert_eq!(file_name.as_deref(), Some("clip.mp4"));
        assert_eq!(data, b"original video");
    }

    #[tokio::test]
    async fn test_dub_streams_file_from_disk() {
        let (addr, log) = spawn_backend().await;
        let backend = backend_for(addr);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("talk.webm");
        let contents: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &contents).unwrap();

        let file = SelectedFile::from_path(&path).await.unwrap();
        let response = backend
            .dub(DubRequest { file, language: TargetLanguage::new("es") })
            .await
            .unwrap();
        assert!(response.is_success());

        let captured = log.lock().unwrap().clone();
        let (name, file_name, data) = &captured[0].parts[0];
        assert_eq!(name, "file");
        assert_eq!(file_name.as_deref(), Some("talk.webm"));
        assert_eq!(data.len(), contents.len());
        assert_eq!(data, &contents);
    }

    #[tokio::test]
    async fn test_backend_receives_literal_language() {
        let (addr, log) = spawn_backend().await;
        let backend = backend_for(addr);

        backend.dub(request("pt-BR & more")).await.unwrap();

        let captured = log.lock().unwrap().clone();
        assert_eq!(
            captured[0].query.get("target_lang").map(String::as_str),
            Some("pt-BR & more")
        );
    }

    #[tokio::test]
    async fn test_error_status_is_a_response() {
        let (addr, _log) = spawn_backend().await;
        let backend = backend_for(addr);

        let response = backend.dub(request("xx")).await.unwrap();
        assert_eq!(response.status, 500);
        assert!(!response.is_success());
        let parsed = ServerErrorBody::parse(&response.text()).unwrap();
        assert_eq!(parsed.message, "Transcription failed or returned empty text");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let backend = backend_for(addr);
        let result = backend.dub(request("es")).await;
        assert!(matches!(result, Err(DubError::Transport(_))));
    }

    #[tokio::test]
    async fn test_check_backend_availability() {
        let (addr, _log) = spawn_backend().await;
        check_backend_availability(&format!("http://{}", addr)).await.unwrap();
    }
}
