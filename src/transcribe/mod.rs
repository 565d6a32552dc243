use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tempfile::TempDir;

use crate::audio::{AudioSource, DownloadEvent, YtDlpDownloader};
use crate::captions::{CaptionSource, YoutubeCaptions};
use crate::cli::ModelSize;
use crate::config::Config;
use crate::recognize::{Recognition, SpeechRecognizer, WhisperRecognizer};
use crate::transcript::render_transcript;
use crate::utils::capitalize;
use crate::video::VideoReference;
use crate::TranscribeError;

/// Options for one transcription run, fixed at startup.
///
/// `local_only` makes `no_local` irrelevant: when the remote path is never
/// attempted there is no fallback to disable.
#[derive(Debug, Clone)]
pub struct TranscriptionOptions {
    pub show_timestamps: bool,
    pub local_only: bool,
    pub no_local: bool,
    pub model: ModelSize,
}

/// Two-tier transcript pipeline: platform captions first, local Whisper
/// recognition as the fallback.
pub struct TranscriptionPipeline<C, A, R> {
    captions: C,
    audio: A,
    recognizer: R,
}

impl TranscriptionPipeline<YoutubeCaptions, YtDlpDownloader, WhisperRecognizer> {
    /// Wire up the production collaborators from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            YoutubeCaptions::new(),
            YtDlpDownloader::new(&config.tools.yt_dlp_path),
            WhisperRecognizer::new(&config.tools.whisper_path),
        )
    }
}

impl<C, A, R> TranscriptionPipeline<C, A, R>
where
    C: CaptionSource,
    A: AudioSource,
    R: SpeechRecognizer,
{
    pub fn new(captions: C, audio: A, recognizer: R) -> Self {
        Self {
            captions,
            audio,
            recognizer,
        }
    }

    /// Run the full fallback pipeline for one URL and print the transcript.
    ///
    /// Remote failure is only terminal when `no_local` is set; every local
    /// failure is terminal. The local attempt happens at most once.
    pub async fn run(&self, url: &str, options: &TranscriptionOptions) -> Result<()> {
        let video = VideoReference::parse(url).ok_or(TranscribeError::InvalidUrl)?;
        println!("Processing video: {}", video.id());

        if !options.local_only {
            println!("🔍 Checking for YouTube captions...");
            match self.captions.fetch(&video).await {
                Ok(segments) => {
                    print!(
                        "{}",
                        render_transcript(&segments, options.show_timestamps, "YouTube captions")
                    );
                    return Ok(());
                }
                Err(err) if options.no_local => {
                    return Err(anyhow::Error::new(err).context("no transcript available"));
                }
                Err(err) => {
                    println!("⚠️  {err}");
                    println!("🔄 Falling back to local transcription...");
                }
            }
        }

        let recognition = self
            .transcribe_locally(&video, options)
            .await
            .context("local transcription failed")?;
        print!(
            "{}",
            render_transcript(
                &recognition.segments,
                options.show_timestamps,
                "local recognition"
            )
        );
        Ok(())
    }

    /// Local path wrapper owning the scoped workspace. The directory is
    /// removed before this returns, on success and failure alike; a panic is
    /// covered by `TempDir`'s `Drop`.
    async fn transcribe_locally(
        &self,
        video: &VideoReference,
        options: &TranscriptionOptions,
    ) -> Result<Recognition> {
        let workspace = TempDir::new().context("failed to create temporary workspace")?;
        let result = self.run_local_steps(video, options, workspace.path()).await;
        if let Err(err) = workspace.close() {
            tracing::warn!("Failed to remove temporary workspace: {err}");
        }
        result
    }

    async fn run_local_steps(
        &self,
        video: &VideoReference,
        options: &TranscriptionOptions,
        workspace: &Path,
    ) -> Result<Recognition> {
        println!("📥 Downloading audio...");
        let progress = ProgressBar::new(0);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
                .unwrap(),
        );

        let on_progress = |event: DownloadEvent| match event {
            DownloadEvent::Downloading {
                bytes_so_far,
                bytes_total,
            } => {
                if let Some(total) = bytes_total {
                    progress.set_length(total);
                }
                progress.set_position(bytes_so_far);
            }
            DownloadEvent::Finished => progress.finish_with_message("Download complete"),
        };

        let audio_path = match self.audio.download(video, workspace, &on_progress).await {
            Ok(path) => path,
            Err(err) => {
                progress.finish_and_clear();
                return Err(err.into());
            }
        };
        println!("✅ Download completed");

        println!("🎙️  Initializing Whisper model...");
        println!(
            "🔄 Loading Whisper '{}' model (this may take a while on first run)...",
            options.model
        );
        println!("📝 Transcribing audio...");
        let recognition = self.recognizer.recognize(&audio_path, options.model).await?;

        if let Some(language) = &recognition.language {
            println!("🌍 Detected language: {}", capitalize(language));
        }

        Ok(recognition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::audio::ProgressCallback;
    use crate::transcript::TranscriptSegment;

    const URL: &str = "https://www.youtube.com/watch?v=abc123";

    struct FakeCaptions {
        segments: Option<Vec<TranscriptSegment>>,
        called: Arc<AtomicBool>,
    }

    impl FakeCaptions {
        fn succeeding() -> (Self, Arc<AtomicBool>) {
            let called = Arc::new(AtomicBool::new(false));
            (
                Self {
                    segments: Some(vec![TranscriptSegment::new("hello", 0.0, 1.5)]),
                    called: called.clone(),
                },
                called,
            )
        }

        fn failing() -> (Self, Arc<AtomicBool>) {
            let called = Arc::new(AtomicBool::new(false));
            (
                Self {
                    segments: None,
                    called: called.clone(),
                },
                called,
            )
        }
    }

    #[async_trait]
    impl CaptionSource for FakeCaptions {
        async fn fetch(
            &self,
            _video: &VideoReference,
        ) -> Result<Vec<TranscriptSegment>, TranscribeError> {
            self.called.store(true, Ordering::SeqCst);
            match &self.segments {
                Some(segments) => Ok(segments.clone()),
                None => Err(TranscribeError::RemoteUnavailable(
                    "captions are disabled for this video".to_string(),
                )),
            }
        }
    }

    struct FakeAudio {
        fail: bool,
        called: Arc<AtomicBool>,
        seen_workspace: Arc<Mutex<Option<PathBuf>>>,
    }

    impl FakeAudio {
        fn new(fail: bool) -> (Self, Arc<AtomicBool>, Arc<Mutex<Option<PathBuf>>>) {
            let called = Arc::new(AtomicBool::new(false));
            let seen_workspace = Arc::new(Mutex::new(None));
            (
                Self {
                    fail,
                    called: called.clone(),
                    seen_workspace: seen_workspace.clone(),
                },
                called,
                seen_workspace,
            )
        }
    }

    #[async_trait]
    impl AudioSource for FakeAudio {
        async fn download(
            &self,
            video: &VideoReference,
            workspace: &Path,
            on_progress: ProgressCallback<'_>,
        ) -> Result<PathBuf, TranscribeError> {
            self.called.store(true, Ordering::SeqCst);
            *self.seen_workspace.lock().unwrap() = Some(workspace.to_path_buf());

            if self.fail {
                return Err(TranscribeError::DownloadFailed(
                    "network unreachable".to_string(),
                ));
            }

            let path = workspace.join(format!("{}.m4a", video.id()));
            fs_err::write(&path, b"audio")
                .map_err(|e| TranscribeError::DownloadFailed(e.to_string()))?;
            on_progress(DownloadEvent::Downloading {
                bytes_so_far: 5,
                bytes_total: Some(5),
            });
            on_progress(DownloadEvent::Finished);
            Ok(path)
        }
    }

    struct FakeRecognizer {
        fail: bool,
    }

    #[async_trait]
    impl SpeechRecognizer for FakeRecognizer {
        async fn recognize(
            &self,
            _audio: &Path,
            _model: ModelSize,
        ) -> Result<Recognition, TranscribeError> {
            if self.fail {
                return Err(TranscribeError::RecognitionFailed(
                    "model blew up".to_string(),
                ));
            }
            Ok(Recognition {
                language: Some("en".to_string()),
                segments: vec![TranscriptSegment::new("hello", 0.0, 1.5)],
            })
        }
    }

    fn options(local_only: bool, no_local: bool) -> TranscriptionOptions {
        TranscriptionOptions {
            show_timestamps: true,
            local_only,
            no_local,
            model: ModelSize::Small,
        }
    }

    fn root_error(err: &anyhow::Error) -> &TranscribeError {
        err.root_cause()
            .downcast_ref::<TranscribeError>()
            .expect("root cause should be a TranscribeError")
    }

    #[tokio::test]
    async fn test_caption_success_skips_local_path() {
        let (captions, _) = FakeCaptions::succeeding();
        let (audio, audio_called, _) = FakeAudio::new(false);
        let pipeline = TranscriptionPipeline::new(captions, audio, FakeRecognizer { fail: false });

        pipeline.run(URL, &options(false, false)).await.unwrap();
        assert!(!audio_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_invalid_url_fails_before_any_collaborator() {
        let (captions, captions_called) = FakeCaptions::succeeding();
        let (audio, audio_called, _) = FakeAudio::new(false);
        let pipeline = TranscriptionPipeline::new(captions, audio, FakeRecognizer { fail: false });

        let err = pipeline
            .run("https://example.com/watch?x=1", &options(false, false))
            .await
            .unwrap_err();

        assert!(matches!(root_error(&err), TranscribeError::InvalidUrl));
        assert!(!captions_called.load(Ordering::SeqCst));
        assert!(!audio_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_local_only_never_queries_captions() {
        let (captions, captions_called) = FakeCaptions::succeeding();
        let (audio, _, _) = FakeAudio::new(false);
        let pipeline = TranscriptionPipeline::new(captions, audio, FakeRecognizer { fail: false });

        // no_local set too: it must not block a local_only run
        pipeline.run(URL, &options(true, true)).await.unwrap();
        assert!(!captions_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_remote_failure_with_no_local_is_terminal() {
        let (captions, _) = FakeCaptions::failing();
        let (audio, audio_called, _) = FakeAudio::new(false);
        let pipeline = TranscriptionPipeline::new(captions, audio, FakeRecognizer { fail: false });

        let err = pipeline.run(URL, &options(false, true)).await.unwrap_err();

        assert!(matches!(
            root_error(&err),
            TranscribeError::RemoteUnavailable(_)
        ));
        assert!(err.to_string().contains("no transcript available"));
        assert!(!audio_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_remote_failure_falls_back_and_removes_workspace() {
        let (captions, captions_called) = FakeCaptions::failing();
        let (audio, audio_called, seen_workspace) = FakeAudio::new(false);
        let pipeline = TranscriptionPipeline::new(captions, audio, FakeRecognizer { fail: false });

        pipeline.run(URL, &options(false, false)).await.unwrap();

        assert!(captions_called.load(Ordering::SeqCst));
        assert!(audio_called.load(Ordering::SeqCst));

        let workspace = seen_workspace.lock().unwrap().clone().unwrap();
        assert!(!workspace.exists());
    }

    #[tokio::test]
    async fn test_failed_recognition_still_removes_workspace() {
        let (captions, _) = FakeCaptions::failing();
        let (audio, _, seen_workspace) = FakeAudio::new(false);
        let pipeline = TranscriptionPipeline::new(captions, audio, FakeRecognizer { fail: true });

        let err = pipeline.run(URL, &options(false, false)).await.unwrap_err();

        assert!(matches!(
            root_error(&err),
            TranscribeError::RecognitionFailed(_)
        ));
        assert!(err.to_string().contains("local transcription failed"));

        let workspace = seen_workspace.lock().unwrap().clone().unwrap();
        assert!(!workspace.exists());
    }

    #[tokio::test]
    async fn test_failed_download_is_terminal_and_removes_workspace() {
        let (captions, _) = FakeCaptions::failing();
        let (audio, _, seen_workspace) = FakeAudio::new(true);
        let pipeline = TranscriptionPipeline::new(captions, audio, FakeRecognizer { fail: false });

        let err = pipeline.run(URL, &options(false, false)).await.unwrap_err();

        assert!(matches!(
            root_error(&err),
            TranscribeError::DownloadFailed(_)
        ));

        let workspace = seen_workspace.lock().unwrap().clone().unwrap();
        assert!(!workspace.exists());
    }

    #[tokio::test]
    async fn test_local_only_uses_local_pipeline() {
        let (captions, _) = FakeCaptions::succeeding();
        let (audio, audio_called, _) = FakeAudio::new(false);
        let pipeline = TranscriptionPipeline::new(captions, audio, FakeRecognizer { fail: false });

        pipeline.run(URL, &options(true, false)).await.unwrap();
        assert!(audio_called.load(Ordering::SeqCst));
    }
}
