mod config;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use logsift_logs::{IngestionPipeline, RecordStore};
use logsift_types::FilterSpec;

use crate::config::{Config, DEFAULT_CONFIG_PATH};

/// Failures listed after an ingest before the rest are summarized
const MAX_REPORTED_FAILURES: usize = 20;

/// Logsift - load web-server access logs into SQLite and query them
#[derive(Parser, Debug)]
#[command(name = "logsift")]
#[command(author, version, about, long_about = None, arg_required_else_help = true)]
struct Args {
    /// Configuration file (created with defaults if missing)
    #[arg(long, global = true, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the access log into the database
    Parse {
        /// Log file to read instead of the configured one
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },

    /// Show stored log records, newest first
    Show {
        /// Only records from this client address
        #[arg(long)]
        ip: Option<String>,

        /// Only records whose URL contains this text
        #[arg(long)]
        keyword: Option<String>,

        /// Earliest timestamp, e.g. 2024-01-01
        #[arg(long)]
        date_from: Option<String>,

        /// Latest timestamp, e.g. 2024-01-31
        #[arg(long)]
        date_to: Option<String>,

        /// Maximum number of rows
        #[arg(long, default_value_t = logsift_types::DEFAULT_LIMIT)]
        limit: usize,

        /// Print JSON lines instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::load_or_init(&args.config)?;

    match args.command {
        Command::Parse { file } => run_parse(&config, file),
        Command::Show {
            ip,
            keyword,
            date_from,
            date_to,
            limit,
            json,
        } => {
            let spec = FilterSpec {
                ip,
                keyword,
                date_from,
                date_to,
                limit: Some(limit),
            }
            .normalized();
            run_show(&config, &spec, json)
        }
    }
}

fn open_store(config: &Config) -> Result<RecordStore> {
    let path = config.database_path();
    RecordStore::open(&path).with_context(|| format!("failed to open database {}", path.display()))
}

fn run_parse(config: &Config, file: Option<PathBuf>) -> Result<()> {
    let log_path = file.unwrap_or_else(|| config.log_path());
    let store = open_store(config)?;

    println!("Reading log file: {}", log_path.display());
    let result = IngestionPipeline::new(&store)
        .ingest_file(&log_path)
        .with_context(|| format!("failed to ingest {}", log_path.display()))?;

    for failure in result.failures.iter().take(MAX_REPORTED_FAILURES) {
        println!("  line {}: {}", failure.line_number, failure.reason);
    }
    if result.failures.len() > MAX_REPORTED_FAILURES {
        println!(
            "  ... and {} more",
            result.failures.len() - MAX_REPORTED_FAILURES
        );
    }

    println!("Processed: {}/{}", result.inserted, result.attempted);
    if let Some(db) = store.path() {
        println!("Saved to database: {}", db.display());
    }
    Ok(())
}

fn run_show(config: &Config, spec: &FilterSpec, json: bool) -> Result<()> {
    let store = open_store(config)?;
    let records = store.search(spec).context("query failed")?;

    if json {
        print!("{}", render::render_json_lines(&records)?);
    } else {
        print!("{}", render::render_table(&records));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_are_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn test_show_args() {
        let args = Args::parse_from([
            "logsift", "show", "--ip", "127.0.0.1", "--date-from", "2024-01-01", "--limit", "20",
        ]);
        match args.command {
            Command::Show {
                ip,
                date_from,
                keyword,
                limit,
                json,
                ..
            } => {
                assert_eq!(ip.as_deref(), Some("127.0.0.1"));
                assert_eq!(date_from.as_deref(), Some("2024-01-01"));
                assert_eq!(keyword, None);
                assert_eq!(limit, 20);
                assert!(!json);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(args.config, PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn test_parse_args_with_config() {
        let args = Args::parse_from(["logsift", "parse", "--config", "/etc/logsift.toml"]);
        assert_eq!(args.config, PathBuf::from("/etc/logsift.toml"));
        assert!(matches!(args.command, Command::Parse { file: None }));
    }

    #[test]
    fn test_parse_against_temp_config() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        std::fs::create_dir_all(&log_dir).unwrap();
        std::fs::write(
            log_dir.join("access.log"),
            "127.0.0.1 - - [10/Oct/2023:13:55:36 +0000] \"GET /index.html HTTP/1.1\" 200 512 \"-\" \"Mozilla/5.0\"\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.database.uri = format!("sqlite:///{}", dir.path().join("logs.db").display());
        config.logs.directory = log_dir;

        run_parse(&config, None).unwrap();
        let store = open_store(&config).unwrap();
        assert_eq!(store.count().unwrap(), 1);

        let missing = run_parse(&config, Some(dir.path().join("missing.log")));
        assert!(missing.is_err());
    }
}
