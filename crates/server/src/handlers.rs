use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use tokio_stream::StreamExt;
use tokio_util::io::ReaderStream;

use captioner_core::pipeline::caption_pipeline::Upload;
use captioner_core::segments::domain::segment::TranscriptionResult;
use captioner_core::shared::constants::{OUTPUT_DOWNLOAD_NAME, OUTPUT_VIDEO_MIME};

use crate::api_error::ApiError;
use crate::AppState;

const FILE_FIELD: &str = "file";
const SEGMENTS_FIELD: &str = "segments";

#[derive(Serialize)]
pub struct TranscribeResponse {
    pub segments: TranscriptionResult,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
}

#[derive(Default)]
struct CaptionForm {
    file: Option<Upload>,
    segments: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<CaptionForm, ApiError> {
    let mut form = CaptionForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(FILE_FIELD) => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await?;
                form.file = Some(Upload { file_name, bytes });
            }
            Some(SEGMENTS_FIELD) => form.segments = Some(field.text().await?),
            _ => {}
        }
    }
    Ok(form)
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::BadRequest(format!("missing `{field}` form field")))
}

pub async fn transcribe(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let form = read_form(multipart).await?;
    let upload = required(form.file, FILE_FIELD)?;
    log::info!(
        "Transcribing {} ({} bytes)",
        upload.file_name.as_deref().unwrap_or("<unnamed>"),
        upload.bytes.len()
    );

    let pipeline = Arc::clone(&state.pipeline);
    let segments = tokio::task::spawn_blocking(move || pipeline.transcribe_upload(&upload)).await??;
    Ok(Json(TranscribeResponse { segments }))
}

/// Responds with the rendered video as a stream; the file is deleted once
/// the stream is dropped.
pub async fn render(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = read_form(multipart).await?;
    let upload = required(form.file, FILE_FIELD)?;
    let segments = required(form.segments, SEGMENTS_FIELD)?;

    let pipeline = Arc::clone(&state.pipeline);
    let artifact =
        tokio::task::spawn_blocking(move || pipeline.render_upload(&upload, &segments)).await??;

    let file = tokio::fs::File::open(artifact.path())
        .await
        .map_err(|e| ApiError::Internal(format!("cannot open rendered output: {e}")))?;
    let length = file
        .metadata()
        .await
        .map_err(|e| ApiError::Internal(format!("cannot stat rendered output: {e}")))?
        .len();

    let stream = ReaderStream::new(file).map(move |chunk| {
        let _owner = &artifact;
        chunk
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, OUTPUT_VIDEO_MIME)
        .header(header::CONTENT_LENGTH, length)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{OUTPUT_DOWNLOAD_NAME}\""),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::Internal(e.to_string()))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "alive",
        model: state.pipeline.model_id().to_string(),
    })
}
