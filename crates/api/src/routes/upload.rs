//! Upload endpoint.
//!
//! `POST /upload` accepts either a multipart body with a `file` part or a
//! URL-encoded form carrying base64 `data`. Validation failures are reported
//! as `success: false` with status 200; only a bad API key changes the status.

use axum::{
    Form, Router,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State, multipart::MultipartError},
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::post,
};
use bytes::BytesMut;
use serde::Deserialize;
use tracing::{debug, info, warn};

use oneshot_core::upload::{
    FormUpload, MalformedInput, MultipartUpload, StoredUpload, TransportKind, UploadError,
    UploadTransport,
};

use crate::AppState;
use crate::middleware::api_key::api_key_middleware;
use crate::response::ApiResponse;

/// Header overriding the media type of a multipart or URL-encoded upload.
pub const FILE_TYPE_HEADER: &str = "x-file-type";

/// Fields of a URL-encoded upload.
#[derive(Debug, Deserialize)]
struct FormFields {
    filename: Option<String>,
    #[serde(rename = "type")]
    declared_type: Option<String>,
    data: Option<String>,
}

impl From<FormFields> for FormUpload {
    fn from(fields: FormFields) -> Self {
        Self {
            filename: fields.filename,
            declared_type: fields.declared_type,
            data: fields.data,
        }
    }
}

/// Upload handler.
async fn upload(State(state): State<AppState>, request: Request) -> Response {
    match receive(&state, request).await {
        Ok(stored) => {
            info!(
                identifier = %stored.identifier,
                size = stored.size,
                "File uploaded"
            );
            ApiResponse::uploaded(stored.url).into_response()
        }
        Err(e) => {
            warn!(error_code = e.error_code(), error = %e, "Upload rejected");
            let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::OK);
            (status, ApiResponse::failure(e.user_message())).into_response()
        }
    }
}

async fn receive(state: &AppState, request: Request) -> Result<StoredUpload, UploadError> {
    let content_type = header_value(request.headers(), CONTENT_TYPE.as_str());
    let type_override = header_value(request.headers(), FILE_TYPE_HEADER);
    debug!(
        content_type = content_type.as_deref().unwrap_or_default(),
        "Upload request received"
    );

    let max = state.uploads.max_file_size();
    let transport = match TransportKind::detect(content_type.as_deref())? {
        TransportKind::Multipart => read_multipart(request, max).await?,
        TransportKind::FormEncoded => read_form(request, max).await?,
    };

    state.uploads.admit(transport, type_override.as_deref()).await
}

/// Read every part, keeping `file` and `filetype`. The file part is capped at
/// `max` bytes while streaming.
async fn read_multipart(request: Request, max: u64) -> Result<UploadTransport, UploadError> {
    let mut multipart = Multipart::from_request(request, &()).await.map_err(|e| {
        debug!(error = %e, "Rejected multipart body");
        UploadError::from(MalformedInput::UnparseableForm)
    })?;

    let mut upload = MultipartUpload::default();
    let mut has_file = false;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_failure(&e, max, MalformedInput::UnparseableForm))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                upload.filename = field.file_name().map(str::to_owned);
                upload.part_content_type = field.content_type().map(str::to_owned);

                let mut data = BytesMut::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| multipart_failure(&e, max, MalformedInput::UnreadableFile))?
                {
                    let len = u64::try_from(data.len() + chunk.len()).unwrap_or(u64::MAX);
                    if len > max {
                        return Err(UploadError::too_large(max));
                    }
                    data.extend_from_slice(&chunk);
                }
                upload.data = data.freeze();
                has_file = true;
            }
            Some("filetype") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| multipart_failure(&e, max, MalformedInput::UnparseableForm))?;
                upload.filetype_field = Some(value);
            }
            _ => {
                while field
                    .chunk()
                    .await
                    .map_err(|e| multipart_failure(&e, max, MalformedInput::UnparseableForm))?
                    .is_some()
                {}
            }
        }
    }

    if !has_file {
        return Err(MalformedInput::MissingFile.into());
    }
    Ok(UploadTransport::Multipart(upload))
}

async fn read_form(request: Request, max: u64) -> Result<UploadTransport, UploadError> {
    let Form(fields) = Form::<FormFields>::from_request(request, &())
        .await
        .map_err(|e| {
            debug!(error = %e, "Rejected URL-encoded body");
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                UploadError::too_large(max)
            } else {
                MalformedInput::UnparseableForm.into()
            }
        })?;

    Ok(UploadTransport::FormEncoded(fields.into()))
}

fn multipart_failure(err: &MultipartError, max: u64, otherwise: MalformedInput) -> UploadError {
    debug!(error = %err, "Multipart read failed");
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::too_large(max)
    } else {
        otherwise.into()
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// Creates upload routes. The API key is checked before the body is read.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/upload",
            post(upload).route_layer(from_fn_with_state(state.clone(), api_key_middleware)),
        )
        .layer(DefaultBodyLimit::max(state.uploads.transport_ceiling()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        Part, TEST_API_KEY, TEST_DOMAIN, body_bytes, body_json, form_body, multipart_body,
        multipart_content_type, test_app, test_config,
    };
    use axum::body::Body;
    use axum::http::Request;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use rstest::rstest;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

    fn multipart_request(parts: &[Part<'_>], api_key: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(CONTENT_TYPE, multipart_content_type());
        if let Some(key) = api_key {
            builder = builder.header("X-API-Key", key);
        }
        builder.body(Body::from(multipart_body(parts))).unwrap()
    }

    fn file_part<'a>(filename: &'a str, content_type: Option<&'a str>, data: &'a [u8]) -> Part<'a> {
        Part {
            name: "file",
            filename: Some(filename),
            content_type,
            data,
        }
    }

    fn form_request(fields: &[(&str, &str)]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("X-API-Key", TEST_API_KEY)
            .body(Body::from(form_body(fields)))
            .unwrap()
    }

    fn identifier_of(url: &str) -> &str {
        url.rsplit('/').next().unwrap()
    }

    #[tokio::test]
    async fn test_multipart_upload_succeeds() {
        let app = test_app(test_config(1024));
        let data = [PNG_HEADER, &[7u8; 88]].concat();

        let response = app
            .send(multipart_request(
                &[file_part("photo.png", Some("image/png"), &data)],
                Some(TEST_API_KEY),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "File uploaded successfully");

        let url = json["url"].as_str().unwrap();
        let prefix = format!("https://{TEST_DOMAIN}/download/");
        assert!(url.starts_with(&prefix), "{url}");
        let identifier = identifier_of(url);
        assert_eq!(identifier.len(), 36);
        assert!(identifier.ends_with(".png"));
        assert_eq!(app.storage.stat(identifier).await.unwrap().size, 100);
    }

    #[rstest]
    #[case(None)]
    #[case(Some("wrong-key"))]
    #[tokio::test]
    async fn test_bad_api_key_is_401(#[case] api_key: Option<&str>) {
        let app = test_app(test_config(1024));

        let response = app
            .send(multipart_request(
                &[file_part("a.png", Some("image/png"), PNG_HEADER)],
                api_key,
            ))
            .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(&body_bytes(response).await[..], b"Unauthorized");
    }

    #[rstest]
    #[case(None)]
    #[case(Some(TEST_API_KEY))]
    #[tokio::test]
    async fn test_wrong_method_is_405(#[case] api_key: Option<&str>) {
        let app = test_app(test_config(1024));

        let mut builder = Request::builder().method("GET").uri("/upload");
        if let Some(key) = api_key {
            builder = builder.header("X-API-Key", key);
        }
        let response = app.send(builder.body(Body::empty()).unwrap()).await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_unsupported_content_type() {
        let app = test_app(test_config(1024));

        let response = app
            .send(
                Request::builder()
                    .method("POST")
                    .uri("/upload")
                    .header(CONTENT_TYPE, "application/json")
                    .header("X-API-Key", TEST_API_KEY)
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Unsupported content type");
    }

    #[tokio::test]
    async fn test_disallowed_type_is_rejected() {
        let app = test_app(test_config(1024));

        let response = app
            .send(multipart_request(
                &[file_part("bundle.zip", Some("application/zip"), b"PK\x03\x04")],
                Some(TEST_API_KEY),
            ))
            .await;

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "File type not allowed");
        assert!(json.get("url").is_none());
    }

    #[rstest]
    #[case(1023, true)]
    #[case(1024, true)]
    #[case(1025, false)]
    #[tokio::test]
    async fn test_size_boundary(#[case] size: usize, #[case] accepted: bool) {
        let app = test_app(test_config(1024));
        let data = vec![0u8; size];

        let response = app
            .send(multipart_request(
                &[file_part("blob.png", Some("image/png"), &data)],
                Some(TEST_API_KEY),
            ))
            .await;

        let json = body_json(response).await;
        assert_eq!(json["success"], accepted);
        if !accepted {
            assert_eq!(json["message"], "File too large");
        }
    }

    #[tokio::test]
    async fn test_body_beyond_ceiling_is_too_large() {
        let app = test_app(test_config(16));
        let data = vec![0u8; 256 * 1024];

        let response = app
            .send(multipart_request(
                &[file_part("huge.png", Some("image/png"), &data)],
                Some(TEST_API_KEY),
            ))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "File too large");
    }

    #[tokio::test]
    async fn test_missing_file_part() {
        let app = test_app(test_config(1024));

        let response = app
            .send(multipart_request(
                &[Part {
                    name: "note",
                    filename: None,
                    content_type: None,
                    data: b"hello",
                }],
                Some(TEST_API_KEY),
            ))
            .await;

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Error retrieving file");
    }

    #[tokio::test]
    async fn test_override_header_and_filetype_field() {
        let app = test_app(test_config(1024));

        // Neither the part nor the header names a type; the field does.
        let response = app
            .send(multipart_request(
                &[
                    file_part("clip", None, b"\x00\x01\x02"),
                    Part {
                        name: "filetype",
                        filename: None,
                        content_type: None,
                        data: b"audio/ogg",
                    },
                ],
                Some(TEST_API_KEY),
            ))
            .await;
        assert_eq!(body_json(response).await["success"], true);

        // The header wins over the field.
        let mut request = multipart_request(
            &[
                file_part("clip", None, b"\x00\x01\x02"),
                Part {
                    name: "filetype",
                    filename: None,
                    content_type: None,
                    data: b"audio/ogg",
                },
            ],
            Some(TEST_API_KEY),
        );
        request
            .headers_mut()
            .insert(FILE_TYPE_HEADER, "application/zip".parse().unwrap());
        let json = body_json(app.send(request).await).await;
        assert_eq!(json["message"], "File type not allowed");
    }

    #[tokio::test]
    async fn test_form_upload_succeeds() {
        let app = test_app(test_config(1024));
        let data = [PNG_HEADER, b"+/+/+/"].concat();
        let encoded = STANDARD.encode(&data);

        let response = app
            .send(form_request(&[
                ("filename", "drawing.png"),
                ("type", "image/png"),
                ("data", &encoded),
            ]))
            .await;

        let json = body_json(response).await;
        assert_eq!(json["success"], true, "{json}");
        let identifier = identifier_of(json["url"].as_str().unwrap());
        assert!(identifier.ends_with(".png"));

        let stored = app.storage.stat(identifier).await.unwrap();
        assert_eq!(stored.size, data.len() as u64);
    }

    #[rstest]
    #[case(&[("filename", "a.png")], "No file data provided")]
    #[case(&[("data", "")], "No file data provided")]
    #[case(&[("type", "image/png"), ("data", "%%%not base64%%%")], "Error decoding base64 data")]
    #[tokio::test]
    async fn test_form_upload_failures(
        #[case] fields: &[(&str, &str)],
        #[case] message: &str,
    ) {
        let app = test_app(test_config(1024));

        let json = body_json(app.send(form_request(fields)).await).await;

        assert_eq!(json["success"], false);
        assert_eq!(json["message"], message);
    }

    #[tokio::test]
    async fn test_form_upload_decoded_size_limit() {
        let app = test_app(test_config(8));
        let encoded = STANDARD.encode([0u8; 9]);

        let json = body_json(
            app.send(form_request(&[("type", "image/png"), ("data", &encoded)]))
                .await,
        )
        .await;

        assert_eq!(json["message"], "File too large");
    }
}
