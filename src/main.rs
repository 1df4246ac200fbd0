use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use shimloader::config::LoaderSettings;
use shimloader::host::StaticEnv;
use shimloader::inject::file::FileInjector;
use shimloader::inject::Executor;
use shimloader::loader::{BatchResult, Loader};

#[derive(Parser)]
#[command(name = "shimloader", about = "Load missing capability shims before app startup.")]
struct Cli {
    /// Directory the shims load from (overrides config and context)
    #[arg(short, long)]
    base_path: Option<String>,

    /// Load shims concurrently instead of in registry order
    #[arg(long)]
    concurrent: bool,

    /// Capability the host already has (repeatable)
    #[arg(long = "have", value_name = "CAPABILITY")]
    have: Vec<String>,
}

/// Stand-in host execution surface: acknowledge each shim in the log.
struct LogExecutor;

impl Executor for LogExecutor {
    fn execute(&self, address: &str, bytes: &[u8]) -> Result<(), String> {
        info!("executed shim {address} ({} bytes)", bytes.len());
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("shimloader=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let env = Arc::new(StaticEnv::new(cli.have));
    let mut config = LoaderSettings::load().into_load_config(env);
    if let Some(base) = cli.base_path {
        config = config.base_path(base);
    }
    if cli.concurrent {
        config = config.ordered(false);
    }

    let loader = Loader::new(Arc::new(FileInjector::new(Arc::new(LogExecutor))));
    let handle = loader.start(&config)?;
    info!("batch {} started", handle.id());

    // A failed batch is not fatal: report it and let startup continue.
    match handle.wait().await {
        BatchResult::AllSucceeded => info!("all capability shims loaded"),
        BatchResult::AtLeastOneFailed(failure) => warn!(
            "shim load failed for {}: {}; continuing without full remediation",
            failure.address, failure.reason
        ),
    }

    Ok(())
}
