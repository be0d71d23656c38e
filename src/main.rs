//! Flagboard
//!
//! Keeps the "flags captured per team" chart live from a scoreboard feed.
//!
//! - `flagboard run` - connect to the feed and serve the status API
//! - `flagboard replay <file>` - push a recorded feed through the chart offline
//! - `flagboard config` - print the default configuration

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flagboard::api::{self, AppState};
use flagboard::chart::{ChartAdapter, ChartSnapshot, SeriesChart};
use flagboard::config::{generate_default_config, Config, LoggingConfig};
use flagboard::listener::{feed_endpoint, DispatchOutcome, Dispatcher, ScoreboardListener};
use flagboard::scoreboard::HistoryDataset;

#[derive(Parser)]
#[command(name = "flagboard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Live flags-captured chart for a competition scoreboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Follow the scoreboard feed
    Run {
        /// Scoreboard WebSocket base URL (overrides config)
        #[arg(long)]
        url: Option<String>,
        /// Render-time history JSON to seed the chart with
        #[arg(long)]
        history: Option<PathBuf>,
        /// Don't serve the status API
        #[arg(long)]
        no_api: bool,
    },

    /// Replay recorded feed frames (one JSON message per line)
    Replay {
        /// Recorded frames
        messages: PathBuf,
        /// Render-time history JSON to seed the chart with
        #[arg(long)]
        history: Option<PathBuf>,
        /// Print the final chart as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, report) = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    init_tracing(&config.logging);
    report.log();

    match cli.command {
        Commands::Run {
            url,
            history,
            no_api,
        } => run(config, url, history, no_api).await,
        Commands::Replay {
            messages,
            history,
            json,
        } => replay(&config, &messages, history.as_deref(), json),
        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Wrote default config to {}", path.display());
                }
                None => print!("{}", content),
            }
            Ok(())
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("flagboard={},tower_http=info", logging.level).into());

    if logging.is_json() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn build_dispatcher(
    config: &Config,
    history: Option<&Path>,
) -> anyhow::Result<(Dispatcher, tokio::sync::watch::Receiver<ChartSnapshot>)> {
    let widget = SeriesChart::new(config.chart.options());
    let (mut dispatcher, snapshots) =
        Dispatcher::new(ChartAdapter::with_window(widget, config.chart.window));

    if let Some(path) = history {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read history {}", path.display()))?;
        let history = HistoryDataset::from_json(&text)?;
        let series = dispatcher.seed(&history);
        tracing::info!(series, path = %path.display(), "Seeded chart from history file");
    }

    Ok((dispatcher, snapshots))
}

async fn run(
    mut config: Config,
    url: Option<String>,
    history: Option<PathBuf>,
    no_api: bool,
) -> anyhow::Result<()> {
    tracing::info!("Flagboard v{}", env!("CARGO_PKG_VERSION"));

    if let Some(url) = url {
        config.listener.url = url;
    }

    let (dispatcher, snapshots) = build_dispatcher(&config, history.as_deref())?;
    let endpoint = feed_endpoint(&config.listener.url, &config.listener.path)?;
    let listener =
        ScoreboardListener::new(endpoint, config.listener.reconnect_policy(), dispatcher);
    let connection = listener.connection_state();

    let mut feed = tokio::spawn(listener.run());

    if config.api.enabled && !no_api {
        let state = AppState::new(snapshots, connection);
        let server = config.api.server();
        tokio::select! {
            result = api::serve(state, &server) => {
                feed.abort();
                result?;
            }
            result = &mut feed => {
                result??;
            }
        }
    } else {
        tokio::select! {
            _ = api::shutdown_signal() => {
                feed.abort();
            }
            result = &mut feed => {
                result??;
            }
        }
    }

    tracing::info!("Flagboard stopped");
    Ok(())
}

fn replay(
    config: &Config,
    messages: &Path,
    history: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let (mut dispatcher, snapshots) = build_dispatcher(config, history)?;

    let text = std::fs::read_to_string(messages)
        .with_context(|| format!("Failed to read {}", messages.display()))?;

    let mut rejected = 0usize;
    let mut frames = 0usize;
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        frames += 1;
        if let DispatchOutcome::Rejected(e) = dispatcher.handle_text(line) {
            tracing::warn!(line = line_no + 1, error = %e, "Rejected frame");
            rejected += 1;
        }
    }

    let snapshot = snapshots.borrow().clone();
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!(
        "{} ({} frames, {} rejected, revision {})",
        snapshot.options.title, frames, rejected, snapshot.revision
    );
    for series in &snapshot.series {
        match series.latest() {
            Some(point) => {
                let at = chrono::DateTime::from_timestamp_millis(point.x())
                    .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                println!(
                    "  {:<24} {:>3} points  latest {} at {}",
                    series.name,
                    series.data.len(),
                    snapshot.options.tooltip(&series.name, point.y()),
                    at
                );
            }
            None => println!("  {:<24}   0 points", series.name),
        }
    }

    Ok(())
}
