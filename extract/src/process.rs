//! Extraction through an external recognizer program.
//!
//! The program is started once per image as `program args... <image-path>`
//! and answers on stdout:
//!
//! ```text
//! success
//! [-0.0913, 0.1022, 0.0478, ...]
//! ```
//!
//! Any first line other than `success` means no face was found.

use std::io;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::extractor::{Extraction, FaceExtractor};

const STATUS_SUCCESS: &str = "success";
const IMAGE_FILE_NAME: &str = "capture.png";

/// Runs an external recognizer process for every image.
///
/// The image is written to a private temporary directory that is removed
/// when the call ends. The child is killed if the call is cancelled.
#[derive(Debug, Clone)]
pub struct ProcessExtractor {
    program: String,
    args: Vec<String>,
}

impl ProcessExtractor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Arguments placed before the image path.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl FaceExtractor for ProcessExtractor {
    async fn extract(&self, image: &[u8]) -> Result<Extraction, ExtractError> {
        if image.is_empty() {
            return Err(ExtractError::EmptyImage);
        }

        let dir =
            tokio::task::spawn_blocking(|| tempfile::Builder::new().prefix("faceid-").tempdir())
                .await
                .map_err(io::Error::other)??;
        let image_path = dir.path().join(IMAGE_FILE_NAME);
        tokio::fs::write(&image_path, image).await?;

        let result = self.run(&image_path).await;

        // A cancelled call drops `dir` in place instead.
        match tokio::task::spawn_blocking(move || dir.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(error = %err, "failed to remove recognizer temp dir"),
            Err(err) => warn!(error = %err, "temp dir cleanup task failed"),
        }
        result
    }
}

impl ProcessExtractor {
    async fn run(&self, image_path: &Path) -> Result<Extraction, ExtractError> {
        debug!(program = %self.program, image = %image_path.display(), "running recognizer");
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(image_path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ExtractError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(ExtractError::Exit {
                code: output.status.code(),
                stderr,
            });
        }
        if !stderr.is_empty() {
            warn!(program = %self.program, %stderr, "recognizer wrote to stderr");
        }

        parse_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parses the recognizer's stdout.
pub fn parse_output(stdout: &str) -> Result<Extraction, ExtractError> {
    let mut lines = stdout.trim().lines().map(str::trim);

    let status = lines.next().unwrap_or_default();
    if !status.eq_ignore_ascii_case(STATUS_SUCCESS) {
        return Ok(Extraction::NoFace);
    }

    let payload = lines
        .next()
        .filter(|line| !line.is_empty())
        .ok_or_else(|| ExtractError::MalformedOutput("missing encoding after success".into()))?;
    let encoding: Vec<f64> = serde_json::from_str(payload)
        .map_err(|err| ExtractError::MalformedOutput(format!("invalid encoding: {err}")))?;
    if encoding.is_empty() {
        return Err(ExtractError::MalformedOutput("empty encoding".into()));
    }

    Ok(Extraction::Encoding(encoding))
}
