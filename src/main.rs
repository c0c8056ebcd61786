use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};

use taskd::cli::TaskClient;
use taskd::config::DaemonConfig;
use taskd::store::TaskStore;
use taskd::AppContext;

#[derive(Parser)]
#[command(
    name = "taskd",
    about = "taskd — durable task-list daemon with a line-delimited JSON protocol",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// TCP server port
    #[arg(long, env = "TASKD_PORT")]
    port: Option<u16>,

    /// Data directory for the task file, backups, and config.toml
    #[arg(long, env = "TASKD_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TASKD_LOG")]
    log: Option<String>,

    /// Bind address (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "TASKD_BIND")]
    bind_address: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "TASKD_LOG_FILE")]
    log_file: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the daemon in the foreground (default when no subcommand given).
    ///
    /// Examples:
    ///   taskd serve
    ///   taskd
    Serve,
    /// Show daemon status (reachable, task count, uptime-independent).
    ///
    /// Connects to the running daemon and prints a summary line.
    /// Exits 0 if healthy, 1 if stopped or unresponsive.
    ///
    /// Examples:
    ///   taskd status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // ── Logging setup ────────────────────────────────────────────────────────
    // Init once — must happen before any tracing calls.
    let log_level = args.log.as_deref().unwrap_or("info").to_owned();
    let log_format = std::env::var("TASKD_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let _file_guard = setup_logging(&log_level, args.log_file.as_deref(), &log_format);

    match args.command {
        Some(Command::Status) => {
            let config = DaemonConfig::new(args.port, args.data_dir, Some("error".to_string()), args.bind_address);
            let exit_code = run_status(&config).await;
            std::process::exit(exit_code);
        }
        None | Some(Command::Serve) => {
            run_server(args.port, args.data_dir, args.log, args.bind_address).await?;
        }
    }

    Ok(())
}

async fn run_server(
    port: Option<u16>,
    data_dir: Option<std::path::PathBuf>,
    log: Option<String>,
    bind_address: Option<String>,
) -> Result<()> {
    let config = Arc::new(DaemonConfig::new(port, data_dir, log, bind_address));

    // Startup-time storage failure is fatal — no point serving without a
    // usable backing file.
    let store = Arc::new(TaskStore::new(config.tasks_file(), config.backup_dir()));
    store
        .initialize()
        .await
        .with_context(|| format!("failed to initialize task store at {}", config.tasks_file().display()))?;

    let ctx = Arc::new(AppContext::new(config, store));
    taskd::ipc::run(ctx).await
}

/// Connect to the daemon and print a one-line summary. Returns the exit code.
async fn run_status(config: &DaemonConfig) -> i32 {
    let addr = format!("{}:{}", config.bind_address, config.port);
    let client = TaskClient::connect(&addr)
        .await
        .map(|c| c.with_timeout(Some(std::time::Duration::from_secs(3))));
    match client {
        Ok(mut client) => match client.get_all_tasks().await {
            Ok(tasks) => {
                let open = tasks.iter().filter(|t| !t.completed).count();
                println!(
                    "taskd running on {addr} — {} tasks ({} open)",
                    tasks.len(),
                    open
                );
                0
            }
            Err(e) => {
                eprintln!("taskd unresponsive on {addr}: {e:#}");
                1
            }
        },
        Err(e) => {
            eprintln!("taskd not running on {addr}: {e:#}");
            1
        }
    }
}

/// Initialize the tracing subscriber.
/// If `log_file` is set, logs go to both stdout and a daily-rolling file.
/// Returns a `WorkerGuard` that must stay alive for the process lifetime.
///
/// `log_format` may be `"pretty"` (default, human-readable compact format)
/// or `"json"` (structured JSON for log aggregators).
///
/// If the log directory cannot be created, falls back to stdout-only logging
/// with a warning — never panics.
fn setup_logging(
    log_level: &str,
    log_file: Option<&std::path::Path>,
    log_format: &str,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let use_json = log_format == "json";

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let filename = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("taskd.log"));

        // Ensure the directory exists before tracing-appender tries to open it.
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "warn: could not create log directory '{}': {e} — falling back to stdout",
                dir.display()
            );
            if use_json {
                tracing_subscriber::fmt().json().with_env_filter(log_level).init();
            } else {
                tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
            }
            return None;
        }

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        if use_json {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().json())
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().compact())
                .with(fmt::layer().with_writer(non_blocking))
                .init();
        }

        Some(guard)
    } else if use_json {
        tracing_subscriber::fmt().json().with_env_filter(log_level).init();
        None
    } else {
        tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
        None
    }
}
