//! Helpers for router tests.

use std::sync::Arc;

use axum::{Router, body::Body, response::Response};
use bytes::Bytes;
use http_body_util::BodyExt;

use oneshot_core::delivery::CleanupQueue;
use oneshot_core::storage::{StorageConfig, StorageProvider, StorageService};
use oneshot_shared::AppConfig;

use crate::{AppState, create_router};

pub(crate) const TEST_API_KEY: &str = "test-key";
pub(crate) const TEST_DOMAIN: &str = "relay.example.com";
pub(crate) const BOUNDARY: &str = "oneshot-test-boundary";

pub(crate) struct TestApp {
    pub router: Router,
    pub storage: Arc<StorageService>,
    pub cleanup: CleanupQueue,
}

impl TestApp {
    pub async fn send(&self, request: axum::http::Request<Body>) -> Response {
        use tower::ServiceExt;
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub(crate) fn test_config(max_file_size: u64) -> AppConfig {
    AppConfig {
        max_file_size,
        api_key: TEST_API_KEY.to_string(),
        upload_dir: "./unused".into(),
        host: "127.0.0.1".to_string(),
        port: String::new(),
        domain: TEST_DOMAIN.to_string(),
        allowed_types: Vec::new(),
        cleanup_delay_ms: 0,
        exclusive_downloads: true,
    }
    .validate()
    .unwrap()
}

/// Router over in-memory storage.
pub(crate) fn test_app(config: AppConfig) -> TestApp {
    let storage = Arc::new(
        StorageService::from_config(StorageConfig::new(StorageProvider::memory())).unwrap(),
    );
    let (state, cleanup) = AppState::assemble(config, storage.clone());

    TestApp {
        router: create_router(state),
        storage,
        cleanup,
    }
}

pub(crate) async fn body_bytes(response: Response) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub(crate) async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// One part of a hand-built multipart body.
pub(crate) struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
}

pub(crate) fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(filename) = part.filename {
            disposition.push_str(&format!("; filename=\"{filename}\""));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub(crate) fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// `application/x-www-form-urlencoded` body, escaping everything but
/// unreserved characters.
pub(crate) fn form_body(fields: &[(&str, &str)]) -> String {
    fn escape(value: &str) -> String {
        value
            .bytes()
            .map(|b| match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    (b as char).to_string()
                }
                _ => format!("%{b:02X}"),
            })
            .collect()
    }

    fields
        .iter()
        .map(|(k, v)| format!("{}={}", escape(k), escape(v)))
        .collect::<Vec<_>>()
        .join("&")
}
