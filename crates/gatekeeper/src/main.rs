//! # Gatekeeper - Puzzle Gate login form
//!
//! Runs the login form in the terminal: credentials, the jigsaw CAPTCHA, and
//! the attempt lockout, driven by one command per line on stdin.

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use gatekeeper::captcha::FileImage;
use gatekeeper::config::{AppConfig, ConfigOverrides};
use gatekeeper::{LoginGate, LoginSession, StaticDirectory, SystemClock, host};
use gatekeeper_common::constants::DEFAULT_CONFIG_PATH;

/// Puzzle Gate - login form with jigsaw CAPTCHA
#[derive(Parser, Debug)]
#[command(name = "gatekeeper")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Puzzle image (overrides config)
    #[arg(short, long, env = "GATEKEEPER_IMAGE")]
    image: Option<PathBuf>,

    /// Fixed seed for tile placement (overrides config)
    #[arg(long, env = "GATEKEEPER_SEED")]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level, args.json_logs)?;

    info!("Starting Gatekeeper v{}", env!("CARGO_PKG_VERSION"));

    let overrides = ConfigOverrides {
        image_path: args.image.clone(),
        seed: args.seed,
    };
    let config = AppConfig::load(&args.config, &overrides)?;
    info!(path = %args.config, "Configuration loaded");

    let directory = StaticDirectory::new(config.accounts.clone());
    if directory.is_empty() {
        warn!("No accounts configured, every login will be rejected");
    } else {
        info!(accounts = directory.len(), "Account directory ready");
    }

    let rng = match config.captcha.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut session = LoginSession::new(
        Box::new(FileImage::new(&config.captcha.image_path)),
        config.puzzle_settings(),
        LoginGate::new(config.lockout_policy()?),
        Box::new(directory),
        rng,
    )
    .context("Cannot show the login form without a puzzle image")?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel::<()>(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(());
        }
    });

    let mut stdout = tokio::io::stdout();
    let account = host::run(
        &mut session,
        &SystemClock,
        BufReader::new(tokio::io::stdin()),
        &mut stdout,
        config.poll_interval(),
        shutdown_rx,
    )
    .await?;

    match account {
        Some(account) => info!(
            email = %account.email,
            role = %account.role,
            landing = ?account.role.landing_view(),
            "Handing off to landing view"
        ),
        None => info!("Login form closed without signing in"),
    }

    Ok(())
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr so they don't interleave with form output
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}
