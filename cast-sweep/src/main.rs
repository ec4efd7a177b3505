//! cast-sweep - Background daemon for settling pending shares
//!
//! Publishing returns before the platforms finish processing, so some
//! shares are stored with a remote id and no public URL. cast-sweep
//! periodically polls the gateway for those and patches the records
//! once the platforms resolve.

use clap::Parser;
use libcrosscast::logging::LoggingConfig;
use libcrosscast::settle::Settler;
use libcrosscast::{Config, Database, HttpGateway, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "cast-sweep")]
#[command(version)]
#[command(about = "Background daemon for settling pending shares")]
#[command(long_about = "\
cast-sweep - Background daemon for settling pending shares

DESCRIPTION:
    cast-sweep is a long-running daemon that watches the Crosscast
    database for shares the gateway accepted but whose public URL is
    not known yet, and polls the gateway until they settle.

    Each sweep issues one status query per unresolved share. Shares
    that resolve get their public URL and final content recorded;
    shares the platform rejected are marked failed; anything still
    pending is left for the next sweep.

USAGE:
    # Run in foreground (logs to stderr)
    cast-sweep

    # Run with custom sweep interval
    cast-sweep --sweep-interval 60

    # Enable verbose logging
    cast-sweep --verbose

SIGNALS:
    SIGTERM, SIGINT - Graceful shutdown (finishes current sweep)

CONFIGURATION:
    Configuration file: ~/.config/crosscast/config.toml
    Database location: ~/.local/share/crosscast/posts.db

    [settlement]
    sweep_interval_secs = 300  # seconds between sweeps

EXIT CODES:
    0 - Clean shutdown
    1 - Runtime error
    2 - Gateway authentication error
")]
struct Cli {
    /// Sweep interval in seconds (overrides config)
    #[arg(long, value_name = "SECONDS")]
    #[arg(help = "How often to poll for unresolved shares (default: 300)")]
    sweep_interval: Option<u64>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    #[arg(help = "Enable verbose logging (useful for debugging)")]
    verbose: bool,

    /// Run once and exit (for testing)
    #[arg(long, hide = true)]
    #[arg(help = "Sweep once and exit (for testing)")]
    once: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Load configuration
    let config = Config::load()?;
    let db = Database::new(&config.database.path).await?;
    let gateway = Arc::new(HttpGateway::from_config(&config.gateway)?);
    let settler = Settler::new(gateway, db, config.settlement.clone());

    info!("cast-sweep daemon starting");

    // Set up graceful shutdown
    let shutdown = Arc::new(AtomicBool::new(false));
    setup_signal_handlers(shutdown.clone())?;

    let sweep_interval = cli
        .sweep_interval
        .unwrap_or(config.settlement.sweep_interval_secs);
    info!("Sweep interval: {}s", sweep_interval);

    if cli.once {
        let settled = settler.sweep().await?;
        info!("cast-sweep: settled {} share(s), exiting", settled);
    } else {
        run_daemon_loop(&settler, sweep_interval, shutdown).await?;
    }

    info!("cast-sweep daemon stopped");
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool) {
    LoggingConfig::from_env("info", verbose).init();
}

/// Set up signal handlers for graceful shutdown
fn setup_signal_handlers(shutdown: Arc<AtomicBool>) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(|e| {
        libcrosscast::CrosscastError::InvalidInput(format!("Signal setup failed: {}", e))
    })?;

    // Spawn thread to handle signals
    let shutdown_clone = shutdown.clone();
    std::thread::spawn(move || {
        for sig in signals.forever() {
            match sig {
                SIGTERM | SIGINT => {
                    info!("Received shutdown signal, stopping gracefully...");
                    shutdown_clone.store(true, Ordering::Relaxed);
                    break;
                }
                _ => {}
            }
        }
    });

    Ok(())
}

/// Main daemon loop
async fn run_daemon_loop(
    settler: &Settler<HttpGateway>,
    sweep_interval: u64,
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    loop {
        // Check for shutdown signal
        if shutdown.load(Ordering::Relaxed) {
            info!("Shutdown requested, stopping daemon loop");
            break;
        }

        match settler.sweep().await {
            Ok(0) => {}
            Ok(settled) => info!("Settled {} share(s)", settled),
            Err(e) => error!("Sweep failed: {}", e),
        }

        // Sleep until next sweep (check shutdown every second)
        for _ in 0..sweep_interval {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            sleep(Duration::from_secs(1)).await;
        }
    }

    Ok(())
}
