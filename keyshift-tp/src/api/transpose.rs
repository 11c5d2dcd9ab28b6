//! Upload handler: POST /transpose
//!
//! Multipart form with an `audioFile` upload and, depending on the deployed
//! mode, either `semitones` or `targetKey`. The upload is staged in a fresh
//! [`RequestWorkspace`], pitch-shifted, and streamed back as an attachment.
//! The workspace travels with the response body, so both files are removed
//! once the download finishes or the client goes away. Any earlier failure
//! drops the workspace on the way out.

use axum::{
    body::Body,
    extract::{
        multipart::{Field, MultipartError},
        Multipart, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use keyshift_common::config::TransposeMode;
use keyshift_common::transposition::{file_extension, parse_semitones};
use keyshift_common::TranspositionRequest;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::processing::RequestWorkspace;
use crate::AppState;

pub const AUDIO_FIELD: &str = "audioFile";
pub const SEMITONES_FIELD: &str = "semitones";
pub const TARGET_KEY_FIELD: &str = "targetKey";

/// Declared media types accepted for `audioFile`
pub const ALLOWED_MEDIA_TYPES: [&str; 3] = ["audio/mpeg", "audio/wav", "audio/x-wav"];

/// Upload written to disk, owned by its workspace
struct StagedUpload {
    workspace: RequestWorkspace,
    original_name: String,
    input_path: std::path::PathBuf,
}

/// True if the declared content type (parameters ignored) is in the allow-list
pub fn is_allowed_media_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ALLOWED_MEDIA_TYPES.contains(&essence.as_str())
}

/// POST /transpose
pub async fn transpose(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult<Response> {
    let mut upload: Option<StagedUpload> = None;
    let mut semitones: Option<String> = None;
    let mut target_key: Option<String> = None;
    let limit = state.config.max_upload_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            AUDIO_FIELD => {
                if upload.is_some() {
                    return Err(ApiError::BadRequest(format!(
                        "Only one '{}' may be uploaded",
                        AUDIO_FIELD
                    )));
                }
                upload = Some(stage_upload(&state, field).await?);
            }
            SEMITONES_FIELD => {
                semitones = Some(field.text().await.map_err(|e| multipart_error(e, limit))?)
            }
            TARGET_KEY_FIELD => {
                target_key = Some(field.text().await.map_err(|e| multipart_error(e, limit))?)
            }
            other => debug!(field = other, "Ignoring unknown form field"),
        }
    }

    let upload = upload
        .ok_or_else(|| ApiError::BadRequest(format!("Missing file field '{}'", AUDIO_FIELD)))?;

    let request = match state.config.mode {
        TransposeMode::Semitones => {
            let text = semitones.ok_or_else(|| missing_field(SEMITONES_FIELD))?;
            TranspositionRequest::Semitones(parse_semitones(&text)?)
        }
        TransposeMode::TargetKey => {
            TranspositionRequest::TargetKey(target_key.ok_or_else(|| missing_field(TARGET_KEY_FIELD))?)
        }
    };

    let transposition = request.resolve(&upload.original_name)?;
    let output_name = transposition.output_file_name(&upload.original_name);
    let output_path = upload.workspace.join(&output_name);

    info!(
        workspace = %upload.workspace.id(),
        original_name = %upload.original_name,
        semitones = transposition.semitones,
        pitch_ratio = transposition.pitch_ratio,
        shifter = state.shifter.name(),
        "Transposing upload"
    );

    state
        .shifter
        .shift_pitch(&upload.input_path, &output_path, transposition.pitch_ratio)
        .await?;

    download_response(upload.workspace, &output_path, &output_name).await
}

/// Validate the media type, then stream the file field into a new workspace
async fn stage_upload(state: &AppState, mut field: Field<'_>) -> ApiResult<StagedUpload> {
    let content_type = field.content_type().unwrap_or_default().to_string();
    if !is_allowed_media_type(&content_type) {
        let declared = if content_type.is_empty() {
            "no content type".to_string()
        } else {
            content_type
        };
        return Err(ApiError::UnsupportedMediaType(declared));
    }

    let original_name = field
        .file_name()
        .map(str::to_string)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("'{}' has no filename", AUDIO_FIELD)))?;

    let workspace = RequestWorkspace::create(&state.config.uploads_dir).await?;
    let input_path = workspace.join(&format!("input{}", file_extension(&original_name)));

    let mut file = tokio::fs::File::create(&input_path).await?;
    let mut bytes_written: u64 = 0;
    let limit = state.config.max_upload_bytes;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        file.write_all(&chunk).await?;
        bytes_written += chunk.len() as u64;
    }
    file.flush().await?;

    debug!(
        workspace = %workspace.id(),
        original_name = %original_name,
        content_type = %content_type,
        bytes = bytes_written,
        "Staged upload"
    );

    Ok(StagedUpload {
        workspace,
        original_name,
        input_path,
    })
}

/// Stream the output file; the workspace is dropped when the body is done
async fn download_response(
    workspace: RequestWorkspace,
    output_path: &std::path::Path,
    output_name: &str,
) -> ApiResult<Response> {
    let file = tokio::fs::File::open(output_path).await?;
    let content_length = file.metadata().await?.len();
    let workspace_id = workspace.id();

    let stream = async_stream::stream! {
        let _workspace = workspace;
        let mut chunks = ReaderStream::new(file);
        while let Some(chunk) = chunks.next().await {
            yield chunk;
        }
        debug!(workspace = %workspace_id, "Download stream finished");
    };

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, audio_content_type(output_name).to_string()),
            (header::CONTENT_DISPOSITION, attachment_disposition(output_name)),
            (header::CONTENT_LENGTH, content_length.to_string()),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

fn audio_content_type(file_name: &str) -> &'static str {
    match file_extension(file_name).as_str() {
        ".mp3" => "audio/mpeg",
        ".wav" => "audio/wav",
        _ => "application/octet-stream",
    }
}

/// `attachment; filename="..."` with characters that would break the header replaced
pub fn attachment_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| {
            if c == '"' || c == '\\' || c.is_control() || !c.is_ascii() {
                '_'
            } else {
                c
            }
        })
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}

fn missing_field(name: &str) -> ApiError {
    ApiError::BadRequest(format!("Missing form field '{}'", name))
}

/// Body limit hits become 413, everything else a malformed-upload 400
fn multipart_error(err: MultipartError, limit: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::UploadTooLarge(limit)
    } else {
        ApiError::BadRequest(format!("Malformed upload: {}", err.body_text()))
    }
}
