//! CLI entry point for the steam_charts pipeline.
//!
//! Provides subcommands for scraping the steamcharts.com top list into a flat
//! CSV table, cleaning leading low-signal months per game, loading the table
//! into SQLite, and rendering trend charts.

mod infra;
mod services;

use std::collections::HashMap;
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::infra::steamcharts::SteamChartsClient;
use crate::services::leaderboard::Leaderboard;
use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use steam_charts::{
    clean::{CleanConfig, clean_dataset},
    error::{Failure, RunReport},
    output::{list_candidate_tables, print_report, read_dataset, write_dataset},
    plot::{DEFAULT_GAMES, render_trends},
    store::Store,
};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "steam_charts")]
#[command(about = "Collects and analyzes steamcharts.com player-count history", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the top-games listing and per-game history into a CSV table
    Scrape {
        /// Number of games to fetch (prompts for a scope when omitted)
        #[arg(short, long)]
        limit: Option<usize>,

        /// CSV file to write (defaults to a name based on the scope)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pause between detail-page requests, in milliseconds
        #[arg(long, default_value_t = 500)]
        delay_ms: u64,
    },
    /// Remove each game's leading months below the signal threshold
    Clean {
        /// Input table (prompts among steam*.csv candidates when omitted)
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,

        /// CSV file to write the cleaned table to
        #[arg(short, long, default_value = "steam_data_cleaned.csv")]
        output: PathBuf,

        /// Minimum average players for a month to count as meaningful
        #[arg(long, default_value_t = 500.0)]
        min_avg_players: f64,

        /// Consecutive qualifying months required for a starting point
        #[arg(long, default_value_t = 2)]
        min_consecutive_months: usize,
    },
    /// Load a table into SQLite with derived date fields and summary views
    Load {
        /// Input table (prompts among steam*.csv candidates when omitted)
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,

        /// Database file (defaults to the input name with a .db extension)
        #[arg(short, long)]
        database: Option<PathBuf>,
    },
    /// Render a multi-panel player-trend chart from a cleaned table
    Plot {
        /// Cleaned input table
        #[arg(short, long, default_value = "steam_data_cleaned.csv")]
        input: PathBuf,

        /// Chart image file to write
        #[arg(short, long, default_value = "cleaned_player_trends.png")]
        output: PathBuf,

        /// Games to plot, one panel each (repeatable, up to four)
        #[arg(short, long)]
        games: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/steam_charts.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("steam_charts.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape {
            limit,
            output,
            delay_ms,
        } => scrape(limit, output, delay_ms).await?,
        Commands::Clean {
            input,
            output,
            min_avg_players,
            min_consecutive_months,
        } => clean(input, output, min_avg_players, min_consecutive_months)?,
        Commands::Load { input, database } => load(input, database)?,
        Commands::Plot {
            input,
            output,
            games,
        } => plot(input, output, games)?,
    }

    Ok(())
}

/// Fetches the listing, then every game's detail page sequentially. Per-game
/// failures are recorded and skipped; a listing failure aborts the run.
#[tracing::instrument(skip(output))]
async fn scrape(limit: Option<usize>, output: Option<PathBuf>, delay_ms: u64) -> Result<()> {
    let limit = match limit {
        Some(n) => Some(n),
        None => prompt_scope()?,
    };
    let output = output.unwrap_or_else(|| default_output_name(limit));

    let client = SteamChartsClient::new(Duration::from_millis(delay_ms));

    info!("Fetching top games list");
    let mut games = client.top_games().await?;
    info!(count = games.len(), "Games found");

    if let Some(n) = limit {
        games.truncate(n);
        info!(limit = n, "Limiting run to first games");
    }

    let total = games.len();
    let mut dataset = Vec::new();
    let mut report = RunReport::default();

    for (i, game) in games.iter().enumerate() {
        info!(index = i + 1, total, appid = game.appid, game = %game.name, "Fetching history");
        match client.game_history(game).await {
            Ok(extraction) => {
                info!(records = extraction.observations.len(), "History fetched");
                report.extend(extraction.failures);
                dataset.extend(extraction.observations);
            }
            Err(e) => {
                warn!(appid = game.appid, game = %game.name, error = %e, "Skipping game");
                report.record(Failure::Network {
                    appid: game.appid,
                    game_name: game.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    write_dataset(&output, &dataset)?;
    info!(path = %output.display(), records = dataset.len(), "Dataset written");

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in &dataset {
        *counts.entry(row.game_name.as_str()).or_default() += 1;
    }
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    for (name, records) in counts.iter().take(10) {
        info!(game = %name, records, "Records per game");
    }

    print_report(&report)?;
    Ok(())
}

fn clean(
    input: Option<PathBuf>,
    output: PathBuf,
    min_avg_players: f64,
    min_consecutive_months: usize,
) -> Result<()> {
    let input = resolve_input(input)?;
    let rows = read_dataset(&input)?;
    info!(path = %input.display(), rows = rows.len(), "Loaded dataset");

    let config = CleanConfig {
        min_avg_players,
        min_consecutive_months,
    };
    let before = rows.len();
    let cleaned = clean_dataset(rows, &config);
    info!(
        before,
        after = cleaned.len(),
        removed = before - cleaned.len(),
        "Cleaning complete"
    );

    write_dataset(&output, &cleaned)?;
    info!(path = %output.display(), "Cleaned dataset written");
    Ok(())
}

fn load(input: Option<PathBuf>, database: Option<PathBuf>) -> Result<()> {
    let input = resolve_input(input)?;
    let database = database.unwrap_or_else(|| input.with_extension("db"));
    let rows = read_dataset(&input)?;
    info!(path = %input.display(), rows = rows.len(), "Loaded dataset");

    let mut store = Store::open(&database)?;
    let loaded = store.load_dataset(&rows)?;

    let mut report = RunReport::default();
    report.extend(loaded.dropped);
    print_report(&report)?;

    let summary = store.summary()?;
    info!(
        games = summary.games,
        history_rows = summary.history_rows,
        path = %database.display(),
        "Database ready"
    );
    if let Some((from, to)) = summary.year_range {
        info!(from, to, "Year range");
    }
    for (rank, (game, avg_players)) in summary.top_games.iter().enumerate() {
        info!(rank = rank + 1, game = %game, avg_players = %format!("{avg_players:.0}"), "Top game by latest average");
    }
    Ok(())
}

fn plot(input: PathBuf, output: PathBuf, games: Vec<String>) -> Result<()> {
    let rows = read_dataset(&input)?;
    let games = if games.is_empty() {
        DEFAULT_GAMES.iter().map(|s| s.to_string()).collect()
    } else {
        games
    };
    render_trends(&rows, &games, &output)
}

fn default_output_name(limit: Option<usize>) -> PathBuf {
    match limit {
        Some(n) => PathBuf::from(format!("steam_top{n}_with_names.csv")),
        None => PathBuf::from("steam_top100_with_names.csv"),
    }
}

/// Uses the given path, or when absent finds `steam*.csv` candidates in the
/// current directory: fatal if none, automatic if one, prompted otherwise.
fn resolve_input(input: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = input {
        return Ok(path);
    }

    let candidates = list_candidate_tables(".")?;
    match candidates.len() {
        0 => bail!("no steam*.csv input tables found in the current directory"),
        1 => {
            info!(path = %candidates[0].display(), "Using input table");
            Ok(candidates[0].clone())
        }
        _ => prompt_file_choice(&candidates),
    }
}

fn prompt_scope() -> Result<Option<usize>> {
    println!("Steam player-count scraper");
    println!("1. Test with 5 games");
    println!("2. Process the full top list (takes a few minutes)");
    let answer = prompt("Enter choice (1 or 2): ")?;
    Ok(if answer.trim() == "1" { Some(5) } else { None })
}

fn prompt_file_choice(candidates: &[PathBuf]) -> Result<PathBuf> {
    println!("Found input tables:");
    for (i, path) in candidates.iter().enumerate() {
        println!("  {}. {}", i + 1, path.display());
    }
    let answer = prompt(&format!(
        "Enter file number (1-{}) or press Enter for newest: ",
        candidates.len()
    ))?;
    let index = match answer.trim().parse::<usize>() {
        Ok(n) if (1..=candidates.len()).contains(&n) => n - 1,
        _ => 0, // newest first
    };
    Ok(candidates[index].clone())
}

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line)
}
