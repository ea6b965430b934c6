//! skyshim — multi-cloud control plane shim.
//!
//! # Usage
//!
//! ```text
//! skyshim init
//! skyshim status --format json
//! skyshim deploy
//! skyshim scale --provider aws --cpu 91.5
//! skyshim snapshot --data-dir /var/lib/skyshim
//! skyshim show --data-dir /var/lib/skyshim status-1718000000
//! ```
//!
//! Provider clients are in-memory sandboxes; seed a fleet with
//! `sandbox_instances = "N"` under `[providers.<name>]`, optionally with a
//! provider-native `sandbox_state` such as `"deallocated"`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::OutputFormat;

#[derive(Parser)]
#[command(
    name = "skyshim",
    about = "skyshim — one control plane over AWS, GCP and Azure",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to the config file.
    #[arg(short, long, global = true, default_value = "skyshim.toml")]
    config: PathBuf,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an example config file
    Init {
        /// Application name for the scaffolded deployment.
        #[arg(long, default_value = "web")]
        app: String,
        /// Container image reference.
        #[arg(long, default_value = "nginx:1.27")]
        image: String,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// List instances on every configured provider
    Status {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Deploy the configured application and alarm on every provider
    Deploy {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Apply one metrics sample to a provider's scaling policy
    Scale {
        /// Target provider (aws, gcp, azure).
        #[arg(short, long)]
        provider: String,
        /// CPU utilization, in percent.
        #[arg(long)]
        cpu: f64,
        /// Memory utilization, in percent.
        #[arg(long, default_value = "0")]
        memory: f64,
        /// Disk utilization, in percent.
        #[arg(long, default_value = "0")]
        disk: f64,
        /// Scale-up threshold; defaults to monitoring.cpu_threshold.
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Capture a status report into the report store
    Snapshot {
        /// Directory holding the report store.
        #[arg(long, default_value = "/var/lib/skyshim")]
        data_dir: PathBuf,
    },
    /// Print a stored report exactly as it was written
    Show {
        /// Directory holding the report store.
        #[arg(long, default_value = "/var/lib/skyshim")]
        data_dir: PathBuf,
        /// Report key; lists available keys when omitted.
        key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json)?;

    match cli.command {
        Commands::Init { app, image, force } => commands::init::init(&cli.config, &app, &image, force),
        Commands::Status { format } => commands::status::status(&cli.config, format).await,
        Commands::Deploy { format } => commands::deploy::deploy(&cli.config, format).await,
        Commands::Scale {
            provider,
            cpu,
            memory,
            disk,
            threshold,
        } => commands::scale::scale(&cli.config, &provider, cpu, memory, disk, threshold).await,
        Commands::Snapshot { data_dir } => commands::report::snapshot(&cli.config, &data_dir).await,
        Commands::Show { data_dir, key } => commands::report::show(&data_dir, key.as_deref()),
    }
}

fn init_tracing(json: bool) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info,skyshim=debug"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
