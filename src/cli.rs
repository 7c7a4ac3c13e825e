//! CLI definition and dispatch.
//!
//! Every command opens the SQLite store named in the config file, runs one
//! engine or query operation and writes its result to stdout as JSON.
//! Progress and diagnostics go to stderr through `tracing`.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::sqlite_adapter::SqliteAdapter;
use crate::domain::asset::{self, AssetClass};
use crate::domain::config_validation::validate_config;
use crate::domain::engine::{BatchFailure, SignalEngine, SymbolBatch};
use crate::domain::error::GekkoError;
use crate::domain::query::SignalQueryService;
use crate::domain::settings::SignalSettings;
use crate::domain::signal::{SignalType, Timeframe};
use crate::ports::config_port::ConfigPort;
use crate::ports::feed_port::PriceFeed;

pub const DEFAULT_LOG_FILTER: &str = "gekko_signals=info";

#[derive(Parser, Debug)]
#[command(
    name = "gekko-signals",
    about = "Moving-average crossover signals for tracked markets"
)]
pub struct Cli {
    /// INI config file
    #[arg(short, long, global = true, default_value = "gekko.ini")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the schema and seed metadata for the tracked universe
    Init,
    /// Ingest one symbol's CSV prices and detect crossovers
    Ingest {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        asset_class: Option<AssetClass>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        timeframe: Option<Timeframe>,
    },
    /// Ingest every CSV file in the data directory
    IngestAll {
        #[arg(long)]
        asset_class: Option<AssetClass>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        timeframe: Option<Timeframe>,
    },
    /// Recent crossover signals
    Signals {
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        days: Option<i64>,
        #[arg(long = "type")]
        signal_type: Option<SignalType>,
    },
    /// Recent bullish crossovers, optionally for one asset class
    Bullish {
        #[arg(long)]
        days: Option<i64>,
        #[arg(long)]
        asset_class: Option<AssetClass>,
    },
    /// Bullish and bearish counts over a window
    Summary {
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        days: Option<i64>,
    },
    /// Latest stored records for a symbol
    Series {
        #[arg(long)]
        symbol: String,
        #[arg(long, default_value_t = 30)]
        limit: usize,
    },
    /// Latest record, short-term trend and recent history
    Overview {
        #[arg(long)]
        symbol: String,
        #[arg(long, default_value_t = 30)]
        days: i64,
    },
    /// Top gainers and losers over a window
    Trending {
        #[arg(long, default_value_t = 30)]
        days: i64,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Tracked symbols grouped by asset class
    Symbols,
    /// Validate the config file
    Validate,
}

pub fn run(cli: Cli) -> ExitCode {
    let stdout = io::stdout();
    match execute(&cli, &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Run one command, writing its JSON result to `out`.
pub fn execute(cli: &Cli, out: &mut dyn Write) -> Result<(), GekkoError> {
    let config = load_config(&cli.config)?;
    validate_config(&config)?;

    if let Command::Validate = cli.command {
        info!("{} is valid", cli.config.display());
        return Ok(());
    }

    let settings = SignalSettings::from_config(&config)?;
    let store = open_store(&config)?;

    match &cli.command {
        Command::Init => {
            let engine = SignalEngine::new(&store, settings);
            let created = engine.initialize_tracked_symbols()?;
            write_json(out, &serde_json::json!({ "symbols_created": created }))
        }
        Command::Ingest {
            symbol,
            asset_class,
            start,
            end,
            data_dir,
            timeframe,
        } => {
            let feed = CsvAdapter::new(resolve_data_dir(&config, data_dir.as_deref())?);
            let class = asset_class
                .or_else(|| asset::default_class(symbol))
                .ok_or_else(|| unknown_class(symbol))?;
            let points = feed.fetch_prices(symbol, date_or_min(*start), date_or_max(*end))?;

            let timeframe = timeframe.unwrap_or(settings.timeframe);
            let engine = SignalEngine::new(&store, settings);
            let report = engine.ingest(symbol, class, points, timeframe)?;
            write_json(out, &report)
        }
        Command::IngestAll {
            asset_class,
            start,
            end,
            data_dir,
            timeframe,
        } => {
            let feed = CsvAdapter::new(resolve_data_dir(&config, data_dir.as_deref())?);
            let symbols = feed.available_symbols()?;
            info!("ingesting {} symbols", symbols.len());

            let (batches, skipped) = collect_batches(
                &feed,
                &symbols,
                *asset_class,
                date_or_min(*start),
                date_or_max(*end),
            );

            let timeframe = timeframe.unwrap_or(settings.timeframe);
            let engine = SignalEngine::new(&store, settings);
            let mut report = engine.ingest_batch(batches, timeframe);
            report.failed.extend(skipped);
            report.failed.sort_by(|a, b| a.symbol.cmp(&b.symbol));
            write_json(out, &report)
        }
        Command::Signals {
            symbol,
            days,
            signal_type,
        } => {
            let query = SignalQueryService::new(&store);
            let days = days.unwrap_or(settings.recent_days);
            write_json(
                out,
                &query.recent_signals(symbol.as_deref(), days, *signal_type)?,
            )
        }
        Command::Bullish { days, asset_class } => {
            let query = SignalQueryService::new(&store);
            let days = days.unwrap_or(settings.recent_days);
            write_json(out, &query.bullish_signals(days, *asset_class)?)
        }
        Command::Summary { symbol, days } => {
            let query = SignalQueryService::new(&store);
            let days = days.unwrap_or(settings.recent_days);
            write_json(out, &query.signal_summary(symbol.as_deref(), days)?)
        }
        Command::Series { symbol, limit } => {
            let query = SignalQueryService::new(&store);
            write_json(out, &query.latest_timeseries(symbol, *limit)?)
        }
        Command::Overview { symbol, days } => {
            let query = SignalQueryService::new(&store);
            write_json(out, &query.overview(symbol, *days)?)
        }
        Command::Trending { days, limit } => {
            let query = SignalQueryService::new(&store);
            write_json(out, &query.trending(*days, *limit)?)
        }
        Command::Symbols => {
            let query = SignalQueryService::new(&store);
            write_json(out, &query.tracked_symbols()?)
        }
        Command::Validate => Ok(()),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, GekkoError> {
    info!("loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

/// Log filter from `[logging] filter`, if the config file can be read.
pub fn config_log_filter(path: &Path) -> Option<String> {
    FileConfigAdapter::from_file(path)
        .ok()
        .and_then(|c| c.get_string("logging", "filter"))
}

pub fn open_store(config: &dyn ConfigPort) -> Result<SqliteAdapter, GekkoError> {
    let store = SqliteAdapter::from_config(config)?;
    store.initialize_schema()?;
    Ok(store)
}

/// `--data-dir` wins over `[csv] data_dir`.
pub fn resolve_data_dir(
    config: &dyn ConfigPort,
    override_dir: Option<&Path>,
) -> Result<PathBuf, GekkoError> {
    if let Some(dir) = override_dir {
        return Ok(dir.to_path_buf());
    }
    config
        .get_string("csv", "data_dir")
        .map(PathBuf::from)
        .ok_or_else(|| GekkoError::ConfigMissing {
            section: "csv".into(),
            key: "data_dir".into(),
        })
}

/// Fetch each symbol from `feed`. Symbols that cannot be fetched or have no
/// known asset class are returned as failures instead of batches.
pub fn collect_batches(
    feed: &dyn PriceFeed,
    symbols: &[String],
    class_override: Option<AssetClass>,
    start: NaiveDate,
    end: NaiveDate,
) -> (Vec<SymbolBatch>, Vec<BatchFailure>) {
    let mut batches = Vec::new();
    let mut failed = Vec::new();

    for symbol in symbols {
        let fetched = class_override
            .or_else(|| asset::default_class(symbol))
            .ok_or_else(|| unknown_class(symbol))
            .and_then(|class| Ok((class, feed.fetch_prices(symbol, start, end)?)));

        match fetched {
            Ok((asset_class, points)) => batches.push(SymbolBatch {
                symbol: symbol.clone(),
                asset_class,
                points,
            }),
            Err(e) => {
                warn!("skipping {} ({})", symbol, e);
                failed.push(BatchFailure {
                    symbol: symbol.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    (batches, failed)
}

fn unknown_class(symbol: &str) -> GekkoError {
    GekkoError::NotFound {
        symbol: symbol.to_string(),
        detail: "not in the tracked catalog; pass --asset-class".to_string(),
    }
}

fn date_or_min(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or(NaiveDate::MIN)
}

fn date_or_max(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or(NaiveDate::MAX)
}

fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<(), GekkoError> {
    serde_json::to_writer_pretty(&mut *out, value).map_err(io::Error::from)?;
    writeln!(out)?;
    Ok(())
}
