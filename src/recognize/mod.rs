use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::cli::ModelSize;
use crate::transcript::TranscriptSegment;
use crate::TranscribeError;

/// Output of one local recognition run.
#[derive(Debug, Clone)]
pub struct Recognition {
    /// Language the recognizer detected, if it reported one
    pub language: Option<String>,

    /// Segments normalized into the unified shape
    pub segments: Vec<TranscriptSegment>,
}

/// Speech-to-text over a downloaded audio file.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn recognize(
        &self,
        audio: &Path,
        model: ModelSize,
    ) -> Result<Recognition, TranscribeError>;
}

/// Recognizer that shells out to the Whisper CLI and reads its JSON output.
///
/// Model loading (and the one-time model download on first use) happens
/// inside the subprocess; nothing is retried or cached here.
pub struct WhisperRecognizer {
    whisper_path: String,
}

/// Whisper's JSON output file; unknown fields (tokens, temperatures, ...) are
/// ignored.
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    language: Option<String>,

    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
}

impl WhisperRecognizer {
    pub fn new(whisper_path: impl Into<String>) -> Self {
        Self {
            whisper_path: whisper_path.into(),
        }
    }
}

#[async_trait]
impl SpeechRecognizer for WhisperRecognizer {
    async fn recognize(
        &self,
        audio: &Path,
        model: ModelSize,
    ) -> Result<Recognition, TranscribeError> {
        let output_dir = audio.parent().ok_or_else(|| {
            TranscribeError::RecognitionFailed("audio file has no parent directory".to_string())
        })?;

        tracing::debug!("Running Whisper ({model}) on {}", audio.display());

        let output = Command::new(&self.whisper_path)
            .arg(audio)
            .arg("--model")
            .arg(model.as_str())
            .arg("--output_format")
            .arg("json")
            .arg("--output_dir")
            .arg(output_dir)
            .arg("--verbose")
            .arg("False")
            .output()
            .await
            .map_err(|e| {
                TranscribeError::RecognitionFailed(format!(
                    "failed to launch {}: {e}",
                    self.whisper_path
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscribeError::RecognitionFailed(
                stderr.trim().to_string(),
            ));
        }

        let stem = audio.file_stem().and_then(|s| s.to_str()).ok_or_else(|| {
            TranscribeError::RecognitionFailed("audio file has no usable name".to_string())
        })?;
        let json_path = output_dir.join(format!("{stem}.json"));

        let raw = fs_err::read_to_string(&json_path).map_err(|e| {
            TranscribeError::RecognitionFailed(format!("missing recognizer output: {e}"))
        })?;
        let parsed: WhisperOutput = serde_json::from_str(&raw).map_err(|e| {
            TranscribeError::RecognitionFailed(format!("unrecognized recognizer output: {e}"))
        })?;

        Ok(recognition_from_output(parsed))
    }
}

/// Adapt `(start, end, text)` triples into the unified segment shape:
/// surrounding whitespace trimmed, `duration = end - start`.
fn recognition_from_output(output: WhisperOutput) -> Recognition {
    let segments = output
        .segments
        .into_iter()
        .map(|seg| TranscriptSegment::new(seg.text.trim(), seg.start, (seg.end - seg.start).max(0.0)))
        .collect();

    Recognition {
        language: output.language,
        segments,
    }
}
