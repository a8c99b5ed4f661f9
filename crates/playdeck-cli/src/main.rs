//! Playdeck CLI - Headless Video Player
//!
//! Features:
//! - Playlist inspection
//! - Saved playback positions and bookmarks
//! - Theme preference
//! - Scripted playback through the real media binding

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use playdeck_core::PlayerConfig;
use std::path::PathBuf;

mod commands;
mod output;
mod playlist;
mod script;

/// Playdeck CLI - Playlist video player
#[derive(Parser)]
#[command(name = "playdeck")]
#[command(author = "Playdeck Developers")]
#[command(version)]
#[command(about = "Headless playlist video player", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json, table)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// JSON file holding positions, bookmarks and the theme
    #[arg(short, long, default_value = "playdeck-store.json")]
    store: PathBuf,

    /// Player configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the videos of a playlist file
    Playlist {
        /// Path to the playlist JSON
        playlist: PathBuf,
    },

    /// Show saved playback positions
    History {
        /// Path to the playlist JSON
        playlist: PathBuf,
    },

    /// List or add bookmarks
    Bookmarks {
        /// Path to the playlist JSON
        playlist: PathBuf,

        /// Only this video
        #[arg(long)]
        video: Option<String>,

        /// Append a bookmark at this many seconds (needs --video)
        #[arg(long)]
        add: Option<f64>,
    },

    /// Play a playlist on the headless media element
    Play {
        /// Path to the playlist JSON
        playlist: PathBuf,

        /// Script of steps to run (default: play for --seconds)
        #[arg(long)]
        script: Option<PathBuf>,

        /// Seconds to play when no script is given
        #[arg(long, default_value = "60")]
        seconds: f64,

        /// Clock step in seconds
        #[arg(long, default_value = "1")]
        step: f64,

        /// Advance the clock in real time
        #[arg(long)]
        realtime: bool,

        /// Directory for screenshots and recordings
        #[arg(long, default_value = ".")]
        downloads: PathBuf,
    },

    /// Show or toggle the theme preference
    Theme {
        /// Flip between light and dark
        #[arg(long)]
        toggle: bool,

        /// Print the CSS variables of the theme
        #[arg(long)]
        css: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    playdeck_core::init();

    let config = match &cli.config {
        Some(path) => PlayerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PlayerConfig::default(),
    };

    let ctx = commands::Context {
        format: output::OutputFormat::from(cli.format.as_str()),
        store: cli.store,
        config,
    };

    match cli.command {
        Commands::Playlist { playlist } => {
            commands::playlist(&ctx, &playlist)?;
        }
        Commands::History { playlist } => {
            commands::history(&ctx, &playlist)?;
        }
        Commands::Bookmarks { playlist, video, add } => {
            commands::bookmarks(&ctx, &playlist, video, add)?;
        }
        Commands::Play { playlist, script, seconds, step, realtime, downloads } => {
            let opts = commands::PlayOptions {
                script,
                seconds,
                step,
                realtime,
                downloads,
            };
            commands::play(&ctx, &playlist, opts).await?;
        }
        Commands::Theme { toggle, css } => {
            commands::theme(&ctx, toggle, css)?;
        }
    }

    Ok(())
}
