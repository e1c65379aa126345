//! videoup entry point.

mod app;
mod config;
mod passphrase;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Uploads every video in a folder, resuming interrupted uploads.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the TOML configuration file [default: config.toml beside the executable]
    #[arg(long, short)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let path = match args.config {
        Some(p) => p,
        None => config::default_path()?,
    };
    let config = config::Config::load(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.log_level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %path.display(),
        "starting videoup"
    );

    let rt = tokio::runtime::Runtime::new()?;
    let summary = rt.block_on(app::run(config))?;

    if summary.is_success() {
        return Ok(());
    }
    if summary.interrupted {
        anyhow::bail!("interrupted; run again to resume");
    }
    anyhow::bail!(
        "{} file(s) failed: {}",
        summary.failed.len(),
        summary.failed.join(", ")
    )
}
