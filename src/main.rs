use anyhow::{Context, Result};
use clap::Parser;
use secure_share::clock::SystemClock;
use secure_share::events::next_event;
use secure_share::logger::{init_logging, DEFAULT_FILTER};
use secure_share::random::{RandomSource, ThreadRandom};
use secure_share::result::format_file_size;
use secure_share::{FileDescriptor, UploadConfig, UploadController, UploadHistory};
use std::path::PathBuf;
use std::sync::Arc;

/// Run a file through the secure upload pipeline
#[derive(Parser, Debug)]
#[command(name = "secure-share")]
#[command(version, about, long_about = None)]
struct Cli {
    /// File name as selected by the user
    name: String,

    /// File size in bytes
    #[arg(long)]
    size: u64,

    /// Declared MIME type
    #[arg(long, default_value = "")]
    media_type: String,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for reproducible codes, scores and suggestions
    #[arg(long)]
    seed: Option<u64>,

    /// Skip the simulated stage delays
    #[arg(long)]
    instant: bool,

    /// Print every event as a JSON line
    #[arg(long)]
    events: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(DEFAULT_FILTER).context("Failed to initialize logging")?;

    let mut config = match &cli.config {
        Some(path) => UploadConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => UploadConfig::default(),
    };
    if cli.instant {
        let instant = UploadConfig::instant();
        config.stage_durations = instant.stage_durations;
        config.progress = instant.progress;
    }

    let random: Arc<dyn RandomSource> = match cli.seed {
        Some(seed) => Arc::new(ThreadRandom::seeded(seed)),
        None => Arc::new(ThreadRandom::new()),
    };
    let history = Arc::new(UploadHistory::new());
    let controller = UploadController::builder()
        .config(config)
        .clock(Arc::new(SystemClock))
        .random(random)
        .sink(history.clone())
        .build();

    let printer = if cli.events {
        let mut rx = controller.subscribe();
        Some(tokio::spawn(async move {
            while let Some(event) = next_event(&mut rx).await {
                if let Ok(line) = serde_json::to_string(&event) {
                    println!("{}", line);
                }
            }
        }))
    } else {
        None
    };

    tracing::info!(
        "Processing {} ({})",
        cli.name,
        format_file_size(cli.size)
    );
    let outcome = controller
        .accept_file(FileDescriptor::new(&cli.name, cli.size, &cli.media_type))
        .await;

    // Closing the channel ends the printer once it has drained
    drop(controller);
    if let Some(printer) = printer {
        let _ = printer.await;
    }

    let result = outcome?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    tracing::info!("{} upload(s) recorded", history.len());
    Ok(())
}
