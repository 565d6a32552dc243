/// One unit of transcript text, regardless of whether it came from a caption
/// track or local recognition.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    /// Segment text
    pub text: String,

    /// Start offset in seconds
    pub start: f64,

    /// Duration in seconds; 0 when the source did not report one
    pub duration: f64,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }
}

const SEPARATOR_WIDTH: usize = 60;

/// Format seconds as `HH:MM:SS` past the hour mark, `MM:SS` below it.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

/// Render segments into the printable transcript block: header naming the
/// source, separator rule, one line per segment, closing rule and a segment
/// count. Tolerates an empty segment list.
pub fn render_transcript(
    segments: &[TranscriptSegment],
    show_timestamps: bool,
    source: &str,
) -> String {
    let separator = "=".repeat(SEPARATOR_WIDTH);
    let mut out = String::new();

    out.push_str(&format!("\nTranscript (Source: {source})\n\n"));
    out.push_str(&separator);
    out.push('\n');

    for segment in segments {
        if show_timestamps {
            out.push_str(&format!(
                "[{}] {}\n",
                format_timestamp(segment.start),
                segment.text
            ));
        } else {
            out.push_str(&segment.text);
            out.push('\n');
        }
    }

    out.push('\n');
    out.push_str(&separator);
    out.push_str(&format!("\nTotal segments: {}\n", segments.len()));
    out
}
