use std::process::Stdio;

use crate::config::Config;

/// Check whether the external tools the local fallback shells out to are
/// available. Missing tools are reported, not fatal: the caption path needs
/// neither.
pub async fn check_dependencies(config: &Config) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(&config.tools.yt_dlp_path, "--version").await {
        missing.push(format!(
            "{} - required for the audio download fallback",
            config.tools.yt_dlp_path
        ));
    }

    // The openai-whisper CLI has no --version flag
    if !check_command_available(&config.tools.whisper_path, "--help").await {
        missing.push(format!(
            "{} - required for local speech recognition",
            config.tools.whisper_path
        ));
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str, probe_arg: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg(probe_arg)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Uppercase the first letter, for language names coming out of the
/// recognizer ("en" → "En", "english" → "English").
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
