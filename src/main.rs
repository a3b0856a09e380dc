//! Binary entry point that wires environment bootstrap, logging and
//! configuration, then serves the smart-mirror HTTP front-end.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use mirror_agent::{assistant, config::AppConfig};

#[tokio::main]
/// Loads `.env`, initializes tracing (`RUST_LOG` overrides the default
/// `mirror_agent=info`), and runs the agent until shutdown.
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mirror_agent=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    assistant::run_mirror_agent(AppConfig::from_env()).await
}
