//! # Sellerbot Configuration Validator
//!
//! Loads the layered configuration for an environment, validates it, and
//! prints the effective result. Exits non-zero when validation fails.

use anyhow::{Context, Result};
use clap::Parser;
use sellerbot_core::config::ConfigManager;
use sellerbot_core::constants::JobType;
use std::path::PathBuf;
use std::process;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "config-validator")]
#[command(about = "Validate Sellerbot configuration files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Environment to validate; defaults to SELLERBOT_ENV or development
    #[arg(short, long)]
    environment: Option<String>,

    /// Configuration directory (default: config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print the effective configuration as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    match validate(&cli) {
        Ok(()) => info!("Configuration validation completed successfully"),
        Err(e) => {
            error!("Configuration validation failed: {e:#}");
            eprintln!("❌ {e:#}");
            process::exit(1);
        }
    }
}

fn validate(cli: &Cli) -> Result<()> {
    let environment = cli
        .environment
        .clone()
        .unwrap_or_else(ConfigManager::detect_environment);

    let manager = ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), &environment)
        .with_context(|| format!("loading configuration for '{environment}'"))?;
    let config = manager.config();

    if cli.json {
        let rendered =
            serde_json::to_string_pretty(config).context("rendering configuration as JSON")?;
        println!("{rendered}");
        return Ok(());
    }

    println!("🔧 Sellerbot configuration");
    println!("Environment: {}", manager.environment());
    println!("Directory:   {}", manager.config_directory().display());
    println!();
    println!(
        "execution    timeout {}ms, {} attempts, inbox {}",
        config.execution.unit_timeout_ms,
        config.execution.max_attempts,
        config.execution.command_buffer
    );
    println!(
        "backoff      {}ms x{} up to {}ms",
        config.backoff.initial_backoff_ms,
        config.backoff.backoff_multiplier,
        config.backoff.max_backoff_ms
    );
    println!("alerts       keep {}", config.alerts.max_retained);
    match &config.persistence.path {
        Some(path) => println!(
            "persistence  {:?} at {}",
            config.persistence.backend,
            path.display()
        ),
        None => println!("persistence  {:?}", config.persistence.backend),
    }
    for job_type in JobType::ALL {
        let policy = config.jobs.policy(job_type);
        println!(
            "job          {:<16} {}",
            job_type.as_str(),
            if policy.auto_resume_on_restart {
                "auto-resume on restart"
            } else {
                "wait for operator on restart"
            }
        );
    }
    println!();
    println!("✅ Configuration is valid");
    Ok(())
}
