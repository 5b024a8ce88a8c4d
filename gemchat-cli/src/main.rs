use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod audio_sink;
mod commands;
mod formatter;
mod interactive_app;

use crate::interactive_app::InteractiveApp;

#[derive(Parser, Debug)]
#[command(name = "gemchat")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Terminal chat with Gemini: images, recipes and read-aloud replies")]
struct Args {
    /// Settings file to use instead of ~/.gemchat/settings.toml
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Prebuilt voice for read-aloud, for this session only
    #[arg(long, value_name = "NAME")]
    voice: Option<String>,

    /// Disable ANSI colors
    #[arg(long)]
    no_color: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_tracing()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<()> {
    info!(
        settings = ?args.settings,
        voice = ?args.voice,
        no_color = args.no_color,
        "CLI startup"
    );

    let mut app = InteractiveApp::new(args.settings, args.voice, !args.no_color)?;
    app.run().await
}

fn setup_tracing() -> Result<()> {
    use std::fs;
    use tracing_subscriber::fmt;

    let home = dirs::home_dir().context("Failed to get home directory")?;
    let trace_dir = home.join(".gemchat").join("trace");
    fs::create_dir_all(&trace_dir)?;

    let log_file = trace_dir.join("gemchat.log");
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Log to a file so tracing output never interleaves with the REPL
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter)
        .init();

    info!("Tracing initialized to {:?}", log_file);
    Ok(())
}
