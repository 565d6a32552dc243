use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::transcribe::TranscriptionOptions;

#[derive(Parser)]
#[command(
    name = "yt-transcriber",
    about = "Extract transcripts from YouTube videos with timestamps",
    version,
    long_about = "Fetches the caption track YouTube hosts for a video and falls back to \
downloading the audio and transcribing it locally with Whisper when no captions are available."
)]
pub struct Cli {
    /// YouTube video URL
    #[arg(value_name = "URL")]
    pub url: String,

    /// Include timestamps in output (default: true)
    #[arg(short = 't', long)]
    pub timestamps: bool,

    /// Exclude timestamps from output
    #[arg(long)]
    pub no_timestamps: bool,

    /// Skip the YouTube caption lookup and use local transcription only
    #[arg(short = 'l', long)]
    pub local_only: bool,

    /// Disable the local transcription fallback
    #[arg(long)]
    pub no_local: bool,

    /// Whisper model size for local transcription (default: small)
    #[arg(long, value_enum, value_name = "SIZE")]
    pub model: Option<ModelSize>,
}

impl Cli {
    /// Collapse the flag surface into one immutable options bundle.
    ///
    /// `--no-timestamps` wins over the default-on `--timestamps` flag, and a
    /// missing `--model` falls back to the configured default.
    pub fn options(&self, default_model: ModelSize) -> TranscriptionOptions {
        TranscriptionOptions {
            show_timestamps: !self.no_timestamps,
            local_only: self.local_only,
            no_local: self.no_local,
            model: self.model.unwrap_or(default_model),
        }
    }
}

/// Whisper model size: the accuracy/speed tradeoff for local recognition
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSize {
    Tiny,
    Base,
    Small,
    Medium,
    Large,
}

impl ModelSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSize::Tiny => "tiny",
            ModelSize::Base => "base",
            ModelSize::Small => "small",
            ModelSize::Medium => "medium",
            ModelSize::Large => "large",
        }
    }
}

impl Default for ModelSize {
    fn default() -> Self {
        ModelSize::Small
    }
}

impl std::fmt::Display for ModelSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
