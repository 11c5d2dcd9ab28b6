//! Pitch shifting via an external audio tool
//!
//! Runs ffmpeg with the `rubberband` filter, which changes pitch while keeping
//! tempo and duration. The child process is awaited asynchronously so other
//! requests keep being served while it runs.
//!
//! # Requirements
//! - `ffmpeg` built with `--enable-librubberband` on the PATH (or configured path)
//!
//! ```bash
//! # Ubuntu/Debian
//! sudo apt-get install ffmpeg
//!
//! # macOS
//! brew install ffmpeg
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Pitch shift failure
#[derive(Debug, Error)]
pub enum ShiftError {
    /// The tool could not be started at all
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran and reported an error
    #[error("{0}")]
    Failed(String),

    /// The tool exited successfully without writing the output file
    #[error("no output written to {}", .0.display())]
    MissingOutput(PathBuf),
}

/// Shifts the pitch of an audio file without changing its tempo
#[async_trait]
pub trait PitchShifter: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Read `input`, write `output` with every frequency scaled by `pitch_ratio`
    async fn shift_pitch(
        &self,
        input: &Path,
        output: &Path,
        pitch_ratio: f64,
    ) -> Result<(), ShiftError>;
}

/// ffmpeg + rubberband pitch shifter
#[derive(Debug, Clone)]
pub struct FfmpegPitchShifter {
    program: PathBuf,
}

impl FfmpegPitchShifter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Audio filter expression for a pitch ratio
    pub fn filter(pitch_ratio: f64) -> String {
        format!("rubberband=pitch={}", pitch_ratio)
    }

    /// Full ffmpeg argument list
    pub fn args(input: &Path, output: &Path, pitch_ratio: f64) -> Vec<OsString> {
        vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-y".into(),
            "-i".into(),
            input.as_os_str().to_owned(),
            "-af".into(),
            Self::filter(pitch_ratio).into(),
            output.as_os_str().to_owned(),
        ]
    }

    /// Check that the configured binary runs
    pub async fn check_available(&self) -> bool {
        let result = Command::new(&self.program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        let available = result.map(|status| status.success()).unwrap_or(false);

        debug!(
            program = %self.program.display(),
            available,
            "ffmpeg availability check"
        );

        available
    }
}

impl Default for FfmpegPitchShifter {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl PitchShifter for FfmpegPitchShifter {
    fn name(&self) -> &'static str {
        "ffmpeg-rubberband"
    }

    async fn shift_pitch(
        &self,
        input: &Path,
        output: &Path,
        pitch_ratio: f64,
    ) -> Result<(), ShiftError> {
        debug!(
            input = %input.display(),
            output = %output.display(),
            pitch_ratio,
            "Running ffmpeg pitch shift"
        );

        let result = Command::new(&self.program)
            .args(Self::args(input, output, pitch_ratio))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ShiftError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("ffmpeg exited with {}", result.status)
            } else {
                stderr
            };
            return Err(ShiftError::Failed(message));
        }

        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(ShiftError::MissingOutput(output.to_path_buf()));
        }

        info!(output = %output.display(), pitch_ratio, "Pitch shift complete");
        Ok(())
    }
}
