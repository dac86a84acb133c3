//! The `tether` binary: run one SQL statement through a managed connection.
//!
//! Loads configuration, initialises structured logging, opens a
//! `ConnectionManager` over the SQLite driver, and prints the outcome:
//! one JSON array per result row, or `{"rows_affected": N}`.

mod config;

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use tether_db::{ConnectionManager, IdleTimeout, QueryOutcome, SqliteDriver};
use tether_types::Value;
use tracing_subscriber::EnvFilter;

/// Run a SQL statement against the configured database.
#[derive(Parser)]
#[command(name = "tether")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, env = "TETHER_CONFIG_PATH", default_value = "tether.toml")]
    config: String,

    /// Override the idle timeout, in seconds. Zero disables eviction.
    #[arg(long, allow_negative_numbers = true)]
    idle_timeout: Option<i64>,

    /// The statement to run.
    sql: String,

    /// Positional parameters. Integers bind as integers, anything else as text.
    params: Vec<String>,
}

fn parse_param(raw: &str) -> Value {
    raw.parse::<i64>()
        .map_or_else(|_| Value::from(raw), Value::Integer)
}

fn run(cli: &Cli, config: &config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let idle_timeout = cli
        .idle_timeout
        .map_or_else(|| config.database.idle_timeout(), IdleTimeout::from_secs);
    let driver = SqliteDriver::new(config.database.sqlite_settings());

    let mut db = ConnectionManager::builder(driver, config.database.credentials())
        .idle_timeout(idle_timeout)
        .connect()?;

    let params: Vec<Value> = cli.params.iter().map(|p| parse_param(p)).collect();
    let outcome = db.query(&cli.sql, &params)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match outcome {
        QueryOutcome::Rows(rows) => {
            for row in rows {
                writeln!(out, "{}", serde_json::to_string(&row)?)?;
            }
        }
        QueryOutcome::Affected(n) => {
            writeln!(out, "{}", serde_json::json!({ "rows_affected": n }))?;
        }
    }

    db.close()?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config::load_config(Some(&cli.config)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("tether: {e}");
            return ExitCode::FAILURE;
        }
    };

    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    tracing::debug!(path = %cli.config, database = ?config.database, "resolved configuration");

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "statement failed");
            eprintln!("tether: {e}");
            ExitCode::FAILURE
        }
    }
}
