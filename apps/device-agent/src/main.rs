//! Device Agent CLI
//!
//! Offline tooling around the device registration model.
//!
//! # Usage
//!
//! ```bash
//! # Render a persisted device record as API callers see it
//! device-agent render device.json
//!
//! # Find the service configuration for a running service
//! device-agent resolve services.json --org acme --url https://svc --arch x86_64 --version 1.4.2
//!
//! # Validate service descriptors
//! device-agent validate services.json
//!
//! # Print the effective configuration
//! device-agent --config agent.yaml check
//! ```

// CLI tools are expected to print to stdout/stderr
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use device_registry_sdk::ServiceCandidate;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{AgentConfig, LogFormat, LoggingConfig};

/// Device Agent - device registration and service configuration tooling
#[derive(Parser, Debug)]
#[command(name = "device-agent")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a persisted device record through the redaction boundary
    Render {
        /// Persisted device record (JSON)
        path: PathBuf,
        /// Print JSON instead of the one-line summary
        #[arg(long)]
        json: bool,
    },
    /// Resolve the service configuration for a running service
    Resolve {
        /// Service descriptors (JSON array)
        path: PathBuf,
        #[arg(long)]
        org: String,
        #[arg(long)]
        url: String,
        #[arg(long)]
        arch: String,
        /// Version of the running service
        #[arg(long = "version", value_name = "VERSION")]
        service_version: String,
        /// Only include attributes that may be sent to a counterparty
        #[arg(long)]
        counterparty: bool,
    },
    /// Validate service descriptors
    Validate {
        /// Service descriptors (JSON array)
        path: PathBuf,
    },
    /// Validate configuration and print it
    Check,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = AgentConfig::load(cli.config.as_deref())?;
    init_logging(&config.logging, cli.verbose);
    tracing::debug!(config = ?cli.config, "Configuration loaded");

    match cli.command {
        Commands::Render { path, json } => commands::render(&path, json),
        Commands::Resolve {
            path,
            org,
            url,
            arch,
            service_version,
            counterparty,
        } => commands::resolve(
            &config.device_registry,
            &path,
            &ServiceCandidate::new(org, url, arch, service_version),
            counterparty,
        ),
        Commands::Validate { path } => commands::validate(&path),
        Commands::Check => commands::check(&config),
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level;
/// `-v` flags raise the configured level.
fn init_logging(logging: &LoggingConfig, verbose: u8) {
    let level = match verbose {
        0 => logging.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}
