use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::video::VideoReference;
use crate::TranscribeError;

/// Audio container extensions probed after a download reports completion,
/// most preferred first.
const AUDIO_EXTENSIONS: [&str; 4] = ["m4a", "webm", "mp4", "mp3"];

/// Progress notification emitted while audio is being fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadEvent {
    Downloading {
        bytes_so_far: u64,
        bytes_total: Option<u64>,
    },
    Finished,
}

pub type ProgressCallback<'a> = &'a (dyn Fn(DownloadEvent) + Send + Sync);

/// Downloads the best available audio for a video into a workspace directory
/// owned by the caller.
#[async_trait]
pub trait AudioSource: Send + Sync {
    async fn download(
        &self,
        video: &VideoReference,
        workspace: &Path,
        on_progress: ProgressCallback<'_>,
    ) -> Result<PathBuf, TranscribeError>;
}

/// yt-dlp backed audio downloader
pub struct YtDlpDownloader {
    yt_dlp_path: String,
}

// One progress line per update: "<downloaded_bytes>/<total_bytes>"
const PROGRESS_TEMPLATE: &str =
    "download:%(progress.downloaded_bytes)s/%(progress.total_bytes,progress.total_bytes_estimate)s";

impl YtDlpDownloader {
    pub fn new(yt_dlp_path: impl Into<String>) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
        }
    }
}

#[async_trait]
impl AudioSource for YtDlpDownloader {
    async fn download(
        &self,
        video: &VideoReference,
        workspace: &Path,
        on_progress: ProgressCallback<'_>,
    ) -> Result<PathBuf, TranscribeError> {
        let output_template = workspace
            .join(format!("{}.%(ext)s", video.id()))
            .to_string_lossy()
            .into_owned();

        tracing::debug!(
            "Downloading audio for {} into {}",
            video.id(),
            workspace.display()
        );

        let mut command = Command::new(&self.yt_dlp_path);
        command
            .arg("--format")
            .arg("bestaudio[ext=m4a]/bestaudio")
            .arg("--output")
            .arg(&output_template)
            .arg("--no-playlist")
            .arg("--no-warnings")
            .arg("--quiet")
            .arg("--progress")
            .arg("--newline")
            .arg("--progress-template")
            .arg(PROGRESS_TEMPLATE)
            .arg(video.watch_url())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|e| {
            TranscribeError::DownloadFailed(format!("failed to launch {}: {e}", self.yt_dlp_path))
        })?;

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(event) = parse_progress_line(&line) {
                    on_progress(event);
                }
            }
        }

        let output = child.wait_with_output().await.map_err(|e| {
            TranscribeError::DownloadFailed(format!("{} did not finish: {e}", self.yt_dlp_path))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscribeError::DownloadFailed(
                stderr.trim().to_string(),
            ));
        }

        on_progress(DownloadEvent::Finished);

        locate_downloaded_audio(workspace, video.id())
    }
}

/// Probe the expected container extensions in preference order and return the
/// first file present. A download that "finished" without leaving one of
/// these behind is its own failure, distinct from a network error.
pub fn locate_downloaded_audio(
    workspace: &Path,
    video_id: &str,
) -> Result<PathBuf, TranscribeError> {
    for ext in AUDIO_EXTENSIONS {
        let candidate = workspace.join(format!("{video_id}.{ext}"));
        if candidate.exists() {
            return Ok(candidate);
        }
    }
    Err(TranscribeError::DownloadedFileNotFound)
}

/// Parse one `--progress-template` line. Totals show up as `NA` before yt-dlp
/// has an estimate, and as floats once it does.
pub fn parse_progress_line(line: &str) -> Option<DownloadEvent> {
    let (downloaded, total) = line.trim().split_once('/')?;
    let bytes_so_far = downloaded.trim().parse::<f64>().ok()? as u64;
    let bytes_total = total.trim().parse::<f64>().ok().map(|t| t as u64);
    Some(DownloadEvent::Downloading {
        bytes_so_far,
        bytes_total,
    })
}
