//! # HTTP API
//!
//! | Route                 | Multipart fields  | Response                              |
//! |-----------------------|-------------------|---------------------------------------|
//! | `POST /api/encode`    | `media`, `data`   | carrier with the payload, attachment  |
//! | `POST /api/decode`    | `media`           | `extracted_data{ext}`, attachment     |
//! | `POST /api/calculate` | `file`            | JSON capacity report                  |
//! | `GET /api/health`     |                   | JSON status                           |
//!
//! Anything else is served from the static frontend directory. Errors come back
//! as JSON `{ "error": ... }`; oversized payloads also report `capacity` and
//! `data_size`. On encode `capacity` is the usable payload size, so for image
//! carriers it is 8 bytes below what `/api/calculate` reports.

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{error, info};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

use super::core::StegoCore;
use super::storage::{sanitize_filename, ScratchDir, ScratchFile};
use crate::codec::media::extension_of;
use crate::codec::{is_accepted_media, payload_limit, CodecKind, StegoError};
use crate::common::config::AppConfig;

/// Shared state handed to every handler.
pub struct AppState {
    pub core: StegoCore,
    pub scratch: ScratchDir,
}

impl AppState {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            core: StegoCore::new(config.workers.pool_size),
            scratch: ScratchDir::new(&config.storage)?,
        })
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>, config: &AppConfig) -> Router {
    let static_dir = &config.server.static_dir;
    let not_found = ServeFile::new(static_dir.join("404.html"));

    Router::new()
        .route("/api/encode", post(encode_handler))
        .route("/api/decode", post(decode_handler))
        .route("/api/calculate", post(calculate_handler))
        .route("/api/health", get(health_check))
        .fallback_service(ServeDir::new(static_dir).not_found_service(not_found))
        .layer(DefaultBodyLimit::max(config.storage.max_content_length))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    capacity: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_size: Option<u64>,
}

/// An error rendered as a JSON response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: message.into(),
                capacity: None,
                data_size: None,
            },
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn too_large(capacity: u64, data_size: u64) -> Self {
        let mut err = Self::bad_request(format!(
            "Data file too large, maximum supported is {} bytes",
            capacity
        ));
        err.body.capacity = Some(capacity);
        err.body.data_size = Some(data_size);
        err
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.body.error
    }

    fn logged(self, operation: &str) -> Self {
        error!("❌ {} error: {}", operation, self.body.error);
        self
    }
}

impl From<anyhow::Error> for ApiError {
    /// Codec input errors are the client's fault; everything else is ours.
    fn from(e: anyhow::Error) -> Self {
        let status = match e.downcast_ref::<StegoError>() {
            Some(stego) if stego.is_input_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self::new(e.status(), format!("Failed to read multipart data: {}", e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// ============================================================================
// UPLOAD HELPERS
// ============================================================================

/// A multipart file field saved to scratch storage.
struct ReceivedFile {
    file_name: String,
    file: ScratchFile,
}

/// Stream the wanted multipart fields to scratch storage.
///
/// `media_field`, when given, must carry an accepted media extension; it is
/// rejected before any of its bytes are written.
async fn receive_files(
    scratch: &ScratchDir,
    multipart: &mut Multipart,
    wanted: &[&str],
    media_field: Option<&str>,
) -> Result<HashMap<String, ReceivedFile>, ApiError> {
    let mut files = HashMap::new();

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        if !wanted.contains(&name.as_str()) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("").to_string();

        if media_field == Some(name.as_str()) && !is_accepted_media(&file_name) {
            return Err(ApiError::bad_request(format!(
                "Unsupported media file type: '{}'",
                file_name
            )));
        }

        let mut upload = scratch.create(&file_name).await?;
        while let Some(chunk) = field.chunk().await? {
            upload.write_chunk(&chunk).await?;
        }
        let file = upload.finish().await?;
        files.insert(name, ReceivedFile { file_name, file });
    }

    Ok(files)
}

fn take_file(
    files: &mut HashMap<String, ReceivedFile>,
    field: &str,
) -> Result<ReceivedFile, ApiError> {
    files
        .remove(field)
        .ok_or_else(|| ApiError::bad_request(format!("Missing required file field '{}'", field)))
}

fn attachment(body: Vec<u8>, file_name: &str) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
        .into_response()
}

/// Name offered for an encoded carrier: the upload's name, with the extension
/// swapped for the one the codec actually produced.
pub fn download_name(original: &str, kind: CodecKind) -> String {
    let name = sanitize_filename(original);
    match kind.output_extension() {
        Some(ext) => {
            let stem = name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(&name);
            format!("{}.{}", stem, ext)
        }
        None => name,
    }
}

/// Capacity rendered for people, e.g. `"3750 bytes (about 0.0 MB)"`.
pub fn human_readable(capacity: u64) -> String {
    format!(
        "{} bytes (about {:.1} MB)",
        capacity,
        capacity as f64 / 1024.0 / 1024.0
    )
}

// ============================================================================
// HANDLERS
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "stegano-web"
    }))
}

async fn encode_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    encode_upload(&state, &mut multipart)
        .await
        .map_err(|e| e.logged("Encode"))
}

async fn encode_upload(state: &AppState, multipart: &mut Multipart) -> Result<Response, ApiError> {
    let mut files =
        receive_files(&state.scratch, multipart, &["media", "data"], Some("media")).await?;
    let media = take_file(&mut files, "media")?;
    let data = take_file(&mut files, "data")?;

    let ext = extension_of(&media.file_name).unwrap_or_default();
    let capacity = state.core.capacity(media.file.path(), &ext).await?;
    let data_size = data.file.size();

    if capacity == 0 {
        return Err(ApiError::bad_request("Unable to compute carrier capacity"));
    }
    let limit = payload_limit(capacity, &ext);
    if data_size > limit {
        return Err(ApiError::too_large(limit, data_size));
    }

    let output = state
        .core
        .encode(media.file.path(), data.file.path(), &ext)
        .await?;

    info!(
        "✅ Encoded: {} <- {} ({} bytes)",
        media.file_name, data.file_name, data_size
    );
    Ok(attachment(
        output,
        &download_name(&media.file_name, CodecKind::select(&ext)),
    ))
}

async fn decode_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    decode_upload(&state, &mut multipart)
        .await
        .map_err(|e| e.logged("Decode"))
}

async fn decode_upload(state: &AppState, multipart: &mut Multipart) -> Result<Response, ApiError> {
    let mut files = receive_files(&state.scratch, multipart, &["media"], None).await?;
    let media = take_file(&mut files, "media")?;

    let ext = extension_of(&media.file_name).unwrap_or_default();
    let decoded = state.core.decode(media.file.path(), &ext).await?;
    let file_name = format!("extracted_data{}", decoded.extension);

    info!(
        "✅ Decoded: {} -> {} ({} bytes)",
        media.file_name,
        file_name,
        decoded.payload.len()
    );
    Ok(attachment(decoded.payload, &file_name))
}

#[derive(Debug, Serialize)]
struct CapacityResponse {
    filename: String,
    capacity: u64,
    human_readable: String,
}

async fn calculate_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<CapacityResponse>, ApiError> {
    calculate_upload(&state, &mut multipart)
        .await
        .map_err(|e| e.logged("Capacity"))
}

async fn calculate_upload(
    state: &AppState,
    multipart: &mut Multipart,
) -> Result<Json<CapacityResponse>, ApiError> {
    let mut files = receive_files(&state.scratch, multipart, &["file"], Some("file")).await?;
    let upload = take_file(&mut files, "file")?;

    let ext = extension_of(&upload.file_name).unwrap_or_default();
    let capacity = state.core.capacity(upload.file.path(), &ext).await?;

    info!("📏 Capacity of {}: {} bytes", upload.file_name, capacity);
    Ok(Json(CapacityResponse {
        filename: upload.file_name,
        capacity,
        human_readable: human_readable(capacity),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_name() {
        assert_eq!(download_name("photo.jpg", CodecKind::Lsb), "photo.png");
        assert_eq!(download_name("scan.BMP", CodecKind::Lsb), "scan.png");
        assert_eq!(download_name("song.mp3", CodecKind::TailAppend), "song.mp3");
        assert_eq!(
            download_name("my clip.mkv", CodecKind::TailAppend),
            "my_clip.mkv"
        );
    }

    #[test]
    fn test_human_readable() {
        assert_eq!(human_readable(3750), "3750 bytes (about 0.0 MB)");
        assert_eq!(human_readable(3 * 1024 * 1024 / 2), "1572864 bytes (about 1.5 MB)");
    }

    #[test]
    fn test_error_status_mapping() {
        let input: ApiError = anyhow::Error::from(StegoError::MarkerNotFound).into();
        assert_eq!(input.status(), StatusCode::BAD_REQUEST);

        let io: ApiError = anyhow::Error::from(StegoError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk gone",
        )))
        .into();
        assert_eq!(io.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let other: ApiError = anyhow::anyhow!("worker crashed").into();
        assert_eq!(other.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(other.message(), "worker crashed");
    }

    #[test]
    fn test_too_large_body() {
        let err = ApiError::too_large(3750, 4000);
        let json = serde_json::to_value(&err.body).unwrap();
        assert_eq!(json["capacity"], 3750);
        assert_eq!(json["data_size"], 4000);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
