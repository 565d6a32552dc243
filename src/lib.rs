//! YouTube Transcriber - fetch transcripts for YouTube videos with timestamps
//!
//! Prefers the caption track YouTube already hosts for a video and falls back
//! to downloading the audio and transcribing it locally with Whisper when no
//! caption track is available.

pub mod audio;
pub mod captions;
pub mod cli;
pub mod config;
pub mod recognize;
pub mod transcribe;
pub mod transcript;
pub mod utils;
pub mod video;

pub use cli::{Cli, ModelSize};
pub use config::Config;
pub use transcribe::{TranscriptionOptions, TranscriptionPipeline};
pub use transcript::TranscriptSegment;
pub use video::VideoReference;

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Coarse failure kinds surfaced by the pipeline stages.
///
/// Collaborator-specific errors (HTTP, subprocess, filesystem) are mapped to
/// one of these at the call site; the orchestrator only ever looks at the
/// kind when deciding whether to fall back.
#[derive(thiserror::Error, Debug)]
pub enum TranscribeError {
    #[error("invalid YouTube URL provided")]
    InvalidUrl,

    #[error("no YouTube transcript available: {0}")]
    RemoteUnavailable(String),

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("downloaded audio file not found")]
    DownloadedFileNotFound,

    #[error("local transcription failed: {0}")]
    RecognitionFailed(String),
}
