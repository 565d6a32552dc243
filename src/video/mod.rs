use std::sync::LazyLock;

use regex::Regex;

/// Ordered URL shapes a video identifier can be extracted from. The first
/// pattern that matches wins; the identifier is truncated at the first `&`,
/// newline, `?` or `#`.
static ID_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([^&\n?#]+)")
            .expect("valid video id pattern"),
        Regex::new(r"youtube\.com/watch\?.*v=([^&\n?#]+)").expect("valid video id pattern"),
    ]
});

/// Extract a YouTube video identifier from a URL. No network access; a URL
/// is considered valid exactly when extraction succeeds.
pub fn extract_video_id(url: &str) -> Option<String> {
    ID_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(url).map(|caps| caps[1].to_string()))
}

/// A validated reference to a single YouTube video, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoReference {
    id: String,
}

impl VideoReference {
    /// Parse a URL into a video reference; `None` if no identifier pattern
    /// matches.
    pub fn parse(url: &str) -> Option<Self> {
        extract_video_id(url).map(|id| Self { id })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Canonical watch URL, used when handing the video to yt-dlp.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

impl std::fmt::Display for VideoReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}
