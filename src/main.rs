//! CLI entry point for the race pace predictor.
//!
//! Provides subcommands for predicting a finishing order from a grid of
//! qualifying times and for listing the events of a season.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use race_pace::{
    grid::GridConfig,
    infra::{
        cache::CachedSource,
        ergast::{DEFAULT_BASE_URL, ErgastClient},
    },
    output::{append_predictions, print_pretty, render_report, to_json},
    prediction::predict_race,
    services::{SessionId, SessionKind},
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEFAULT_SEASON: u16 = 2024;
const DEFAULT_EVENT: &str = "British Grand Prix";
const DEFAULT_CACHE_DIR: &str = "./f1_cache";

#[derive(Parser)]
#[command(name = "race_pace")]
#[command(about = "Predicts race finishing order from qualifying pace", long_about = None)]
struct Cli {
    /// Base URL of the Ergast-compatible timing API
    #[arg(long, global = true, env = "RACE_PACE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Train on a historical session and rank the grid (default)
    Predict(PredictArgs),
    /// List the events of a season
    Events {
        /// Season year
        #[arg(short, long, default_value_t = DEFAULT_SEASON)]
        season: u16,
    },
}

#[derive(Args)]
struct PredictArgs {
    /// Season of the historical session
    #[arg(short, long, default_value_t = DEFAULT_SEASON)]
    season: u16,

    /// Event name or round number of the historical session
    #[arg(short, long, default_value = DEFAULT_EVENT)]
    event: String,

    /// Session type: R (race) or Q (qualifying)
    #[arg(long = "session", default_value = "R")]
    kind: SessionKind,

    /// Directory where fetched sessions are cached
    #[arg(long, default_value = DEFAULT_CACHE_DIR)]
    cache_dir: PathBuf,

    /// JSON grid config; defaults to the built-in 2025 British Grand Prix grid
    #[arg(short, long)]
    grid: Option<PathBuf>,

    /// CSV file to append the ranking to
    #[arg(short, long)]
    output: Option<String>,

    /// Print the report as JSON instead of a table
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl Default for PredictArgs {
    fn default() -> Self {
        Self {
            season: DEFAULT_SEASON,
            event: DEFAULT_EVENT.to_string(),
            kind: SessionKind::Race,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            grid: None,
            output: None,
            json: false,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/race_pace.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("race_pace.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli
        .command
        .unwrap_or_else(|| Commands::Predict(PredictArgs::default()))
    {
        Commands::Predict(args) => predict(&cli.base_url, args).await?,
        Commands::Events { season } => {
            let client = ErgastClient::new(&cli.base_url)?;
            let events = client.schedule(season).await?;

            info!(season, total = events.len(), "Schedule fetched");
            for event in &events {
                println!("{:>3}  {}", event.round, event.name);
            }
        }
    }

    Ok(())
}

/// Loads the grid, runs the pipeline against the cached provider and prints
/// the ranking.
#[tracing::instrument(skip(args), fields(season = args.season, event = %args.event))]
async fn predict(base_url: &str, args: PredictArgs) -> Result<()> {
    let config = match &args.grid {
        Some(path) => GridConfig::load(path)?,
        None => GridConfig::british_grand_prix_2025(),
    };
    let session = SessionId::new(args.season, args.event, args.kind);

    let source = CachedSource::new(ErgastClient::new(base_url)?, &args.cache_dir)?;
    let report = predict_race(&source, &config, &session).await?;
    print_pretty(&report);

    if args.json {
        println!("{}", to_json(&report)?);
    } else {
        println!("{}", render_report(&report));
    }

    if let Some(output) = &args.output {
        append_predictions(output, &report)?;
        info!(output = %output, rows = report.ranking.len(), "Ranking appended");
    }

    Ok(())
}
