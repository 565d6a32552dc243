use async_trait::async_trait;
use serde::Deserialize;

use crate::transcript::TranscriptSegment;
use crate::video::VideoReference;
use crate::TranscribeError;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Lists a video's caption tracks and fetches the cues for one of them.
///
/// Every failure mode (captions disabled, video unavailable, malformed
/// payload) collapses into [`TranscribeError::RemoteUnavailable`] so the
/// orchestrator sees a single "no remote transcript" signal.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    async fn fetch(
        &self,
        video: &VideoReference,
    ) -> Result<Vec<TranscriptSegment>, TranscribeError>;
}

/// One caption track as listed in the watch page player response.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    pub base_url: String,

    #[serde(rename = "languageCode")]
    pub language_code: String,
}

/// Timedtext cue payload (`fmt=json3`).
#[derive(Debug, Deserialize)]
struct CueList {
    #[serde(default)]
    events: Vec<CueEvent>,
}

#[derive(Debug, Deserialize)]
struct CueEvent {
    #[serde(rename = "tStartMs", default)]
    start_ms: u64,

    #[serde(rename = "dDurationMs")]
    duration_ms: Option<u64>,

    #[serde(default)]
    segs: Vec<CueFragment>,
}

#[derive(Debug, Deserialize)]
struct CueFragment {
    #[serde(default)]
    utf8: String,
}

/// Caption client backed by YouTube's watch page and timedtext endpoint.
pub struct YoutubeCaptions {
    client: reqwest::Client,
}

impl YoutubeCaptions {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn list_tracks(
        &self,
        video: &VideoReference,
    ) -> Result<Vec<CaptionTrack>, TranscribeError> {
        let body = self
            .client
            .get(video.watch_url())
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| {
                TranscribeError::RemoteUnavailable(format!("failed to load watch page: {e}"))
            })?
            .error_for_status()
            .map_err(|e| TranscribeError::RemoteUnavailable(format!("video unavailable: {e}")))?
            .text()
            .await
            .map_err(|e| {
                TranscribeError::RemoteUnavailable(format!("failed to read watch page: {e}"))
            })?;

        let raw = extract_json_array(&body, "captionTracks").ok_or_else(|| {
            TranscribeError::RemoteUnavailable("captions are disabled for this video".to_string())
        })?;

        let tracks: Vec<CaptionTrack> = serde_json::from_str(raw).map_err(|e| {
            TranscribeError::RemoteUnavailable(format!("unrecognized caption track listing: {e}"))
        })?;

        if tracks.is_empty() {
            return Err(TranscribeError::RemoteUnavailable(
                "no caption tracks listed for this video".to_string(),
            ));
        }

        Ok(tracks)
    }

    async fn fetch_cues(
        &self,
        track: &CaptionTrack,
    ) -> Result<Vec<TranscriptSegment>, TranscribeError> {
        let url = format!("{}&fmt=json3", track.base_url);

        let cues: CueList = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| {
                TranscribeError::RemoteUnavailable(format!("failed to fetch caption cues: {e}"))
            })?
            .error_for_status()
            .map_err(|e| {
                TranscribeError::RemoteUnavailable(format!("caption track unavailable: {e}"))
            })?
            .json()
            .await
            .map_err(|e| {
                TranscribeError::RemoteUnavailable(format!("unrecognized caption cue payload: {e}"))
            })?;

        Ok(segments_from_cues(cues))
    }
}

impl Default for YoutubeCaptions {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptionSource for YoutubeCaptions {
    async fn fetch(
        &self,
        video: &VideoReference,
    ) -> Result<Vec<TranscriptSegment>, TranscribeError> {
        tracing::debug!("Listing caption tracks for video {}", video.id());
        let tracks = self.list_tracks(video).await?;

        let track = pick_track(&tracks).ok_or_else(|| {
            TranscribeError::RemoteUnavailable("no caption tracks listed for this video".to_string())
        })?;

        tracing::debug!("Fetching caption cues (language: {})", track.language_code);
        let segments = self.fetch_cues(track).await?;

        if segments.is_empty() {
            return Err(TranscribeError::RemoteUnavailable(
                "caption track contained no cues".to_string(),
            ));
        }

        Ok(segments)
    }
}

/// English first; otherwise whatever YouTube happens to list first. The
/// listing order is not part of any contract, so the fallback pick can vary
/// between calls.
pub fn pick_track(tracks: &[CaptionTrack]) -> Option<&CaptionTrack> {
    tracks
        .iter()
        .find(|t| t.language_code == "en" || t.language_code.starts_with("en-"))
        .or_else(|| tracks.first())
}

fn segments_from_cues(cues: CueList) -> Vec<TranscriptSegment> {
    cues.events
        .into_iter()
        .filter_map(|event| {
            if event.segs.is_empty() {
                return None;
            }
            let text = event
                .segs
                .iter()
                .map(|seg| seg.utf8.as_str())
                .collect::<String>()
                .replace('\n', " ")
                .trim()
                .to_string();
            if text.is_empty() {
                return None;
            }
            Some(TranscriptSegment::new(
                text,
                event.start_ms as f64 / 1000.0,
                event.duration_ms.unwrap_or(0) as f64 / 1000.0,
            ))
        })
        .collect()
}

/// Locate the JSON array following `"key":` in a blob of page source.
/// Bracket matching skips over string literals and escapes.
fn extract_json_array<'a>(haystack: &'a str, key: &str) -> Option<&'a str> {
    let marker = format!("\"{key}\":");
    let after = haystack.find(&marker)? + marker.len();
    let rest = &haystack[after..];

    let open = rest.find('[')?;
    if !rest[..open].trim().is_empty() {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in rest[open..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&rest[open..=open + i]);
                }
            }
            _ => {}
        }
    }

    None
}
