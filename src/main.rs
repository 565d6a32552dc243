use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yt_transcriber::cli::Cli;
use yt_transcriber::config::Config;
use yt_transcriber::transcribe::TranscriptionPipeline;
use yt_transcriber::utils;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yt_transcriber=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> yt_transcriber::Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    // Check for the external tools the local fallback shells out to
    // (non-fatal: the caption path needs neither)
    let missing_deps = utils::check_dependencies(&config).await;
    if !missing_deps.is_empty() && !cli.no_local {
        eprintln!("⚠️  Dependency check warnings:");
        for dep in missing_deps {
            eprintln!("   • {}", dep);
        }
        eprintln!("   (Continuing anyway - only the local fallback needs them)");
    }

    let options = cli.options(config.defaults.model);
    let pipeline = TranscriptionPipeline::from_config(&config);

    tracing::info!("Starting transcription for URL: {}", cli.url);
    pipeline.run(&cli.url, &options).await
}
