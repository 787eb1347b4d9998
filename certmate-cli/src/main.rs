//! Settings maintenance CLI for CertMate
//!
//! Inspects, heals and edits the settings document through the same guarded
//! store the server uses. Logs go to stderr; command output goes to stdout.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use certmate_app::{AppStateBuilder, StoreConfig};
use certmate_core::traits::NoopBackupHook;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::Outcome;

#[derive(Parser)]
#[command(name = "certmate-settings")]
#[command(about = "Inspect and maintain the CertMate settings store")]
#[command(version)]
struct Cli {
    /// JSON store config (directories, lock timeout, token policy)
    #[arg(short, long, conflicts_with = "base_dir")]
    config: Option<PathBuf>,

    /// Base directory holding data/, certificates/ and backups/
    #[arg(short, long)]
    base_dir: Option<PathBuf>,

    /// Overwrite the settings file without keeping a backup of the prior content
    #[arg(long)]
    no_backup: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the settings document (loading heals and persists it if needed)
    Show {
        /// Print the API bearer token in clear
        #[arg(long)]
        reveal: bool,
    },
    /// Report problems with the stored document without modifying it
    Check,
    /// Upgrade legacy single-account provider configs
    Migrate,
    /// Generate and store a new API bearer token
    RotateToken,
    /// Set the ACME account email
    SetEmail { email: String },
    /// Add a domain to the managed list
    AddDomain { domain: String },
    /// Print the resolved directories
    Paths,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_ansi(false),
        )
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(Outcome::Success) => ExitCode::SUCCESS,
        Ok(Outcome::Problems) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<Outcome> {
    let config = resolve_config(&cli)?;
    let mut builder = AppStateBuilder::new().config(config);
    if cli.no_backup {
        builder = builder.backup_hook(Arc::new(NoopBackupHook));
    }
    let state = builder
        .build()
        .context("Failed to initialize settings store")?;

    match cli.command {
        Command::Show { reveal } => commands::show(&state, reveal),
        Command::Check => Ok(commands::check(&state)),
        Command::Migrate => Ok(commands::migrate(&state)),
        Command::RotateToken => commands::rotate_token(&state),
        Command::SetEmail { email } => commands::set_email(&state, &email),
        Command::AddDomain { domain } => commands::add_domain(&state, &domain),
        Command::Paths => Ok(commands::paths(&state)),
    }
}

fn resolve_config(cli: &Cli) -> anyhow::Result<StoreConfig> {
    if let Some(path) = &cli.config {
        return StoreConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }

    let base = match &cli.base_dir {
        Some(base) => base.clone(),
        None => dirs::data_dir()
            .context("Could not determine the platform data directory; pass --base-dir")?
            .join("certmate"),
    };
    let base = std::path::absolute(&base)
        .with_context(|| format!("Invalid base directory {}", base.display()))?;
    tracing::debug!("Using base directory {}", base.display());
    Ok(StoreConfig::from_base_dir(base))
}
