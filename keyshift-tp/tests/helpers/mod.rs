//! Test helper utilities
//!
//! Shared fakes and request builders for testing keyshift-tp

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use keyshift_common::config::{ServiceConfig, TransposeMode};
use keyshift_tp::processing::{PitchShifter, ShiftError};
use keyshift_tp::{build_router, AppState};

/// One recorded pitch shifter invocation
#[derive(Debug, Clone)]
pub struct ShiftCall {
    pub input: PathBuf,
    pub output: PathBuf,
    pub pitch_ratio: f64,
}

/// Fake shifter: copies input to output and records the call
#[derive(Default)]
pub struct CopyShifter {
    pub calls: Mutex<Vec<ShiftCall>>,
}

impl CopyShifter {
    pub fn calls(&self) -> Vec<ShiftCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PitchShifter for CopyShifter {
    fn name(&self) -> &'static str {
        "copy"
    }

    async fn shift_pitch(
        &self,
        input: &Path,
        output: &Path,
        pitch_ratio: f64,
    ) -> Result<(), ShiftError> {
        self.calls.lock().unwrap().push(ShiftCall {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            pitch_ratio,
        });
        tokio::fs::copy(input, output)
            .await
            .map_err(|e| ShiftError::Failed(e.to_string()))?;
        Ok(())
    }
}

/// Fake shifter that always fails like a tool error would
pub struct FailingShifter {
    pub message: String,
}

#[async_trait]
impl PitchShifter for FailingShifter {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn shift_pitch(&self, _input: &Path, output: &Path, _pitch_ratio: f64) -> Result<(), ShiftError> {
        // Leave a partial artifact behind, as a crashed tool might
        tokio::fs::write(output, b"partial").await.ok();
        Err(ShiftError::Failed(self.message.clone()))
    }
}

/// Router plus the temporary uploads directory backing it
pub struct TestApp {
    pub router: axum::Router,
    pub uploads: tempfile::TempDir,
}

impl TestApp {
    pub fn new(mode: TransposeMode, shifter: Arc<dyn PitchShifter>) -> Self {
        Self::with_config(
            ServiceConfig {
                mode,
                ..Default::default()
            },
            shifter,
        )
    }

    /// Build from `config`, pointing `uploads_dir` at a fresh temp directory
    pub fn with_config(config: ServiceConfig, shifter: Arc<dyn PitchShifter>) -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let config = ServiceConfig {
            uploads_dir: uploads.path().to_path_buf(),
            ..config
        };
        let router = build_router(AppState::new(config, shifter));
        Self { router, uploads }
    }

    /// Number of entries left in the uploads directory
    pub fn leftover_entries(&self) -> usize {
        std::fs::read_dir(self.uploads.path()).unwrap().count()
    }
}

/// Minimal multipart/form-data body builder
pub struct MultipartBuilder {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBuilder {
    pub fn new() -> Self {
        Self {
            boundary: "keyshift-test-boundary-7MA4YWxkTrZu0gW".to_string(),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary, name, filename, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Build a POST /transpose request
    pub fn into_request(mut self) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        Request::builder()
            .method("POST")
            .uri("/transpose")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", self.boundary),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}

/// Fake WAV payload; the fake shifters never decode it
pub fn fake_wav() -> Vec<u8> {
    let mut data = b"RIFF\x24\x00\x00\x00WAVEfmt ".to_vec();
    data.extend(std::iter::repeat(0u8).take(64));
    data
}

/// Collect a response body into bytes
pub async fn body_bytes(body: Body) -> Vec<u8> {
    body.collect().await.unwrap().to_bytes().to_vec()
}

/// Collect a response body into a string
pub async fn body_text(body: Body) -> String {
    String::from_utf8(body_bytes(body).await).unwrap()
}
