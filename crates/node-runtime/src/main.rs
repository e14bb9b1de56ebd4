//! # Murmur Node
//!
//! ```text
//! murmur-node [CONFIG]     run a node (CONFIG defaults to $MURMUR_CONFIG)
//! murmur-node keygen       print a fresh key pair
//! ```
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (file, then `MURMUR_*` environment overrides)
//! 2. Install the tracing subscriber
//! 3. Validate configuration and load the node key
//! 4. Start the swarm listener and the daemon ticks
//! 5. Run until Ctrl+C, then shut down

use anyhow::{Context, Result};
use mm_01_signatures::KeyPair;
use node_runtime::{NodeConfig, NodeRuntime};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn load_config(path: Option<String>) -> Result<NodeConfig> {
    let mut config = match path {
        Some(path) => NodeConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => NodeConfig::default(),
    };
    config
        .apply_env_overrides()
        .context("applying environment overrides")?;
    Ok(config)
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level {level:?}"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))
}

fn keygen() -> Result<()> {
    let keys = KeyPair::generate().context("generating key pair")?;
    let encoded = keys.encode();
    println!("secret_key = \"{}\"", encoded.secret_key);
    println!("# public key: {}", encoded.public_key);
    println!("# murmur address: {}", keys.address());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let arg = std::env::args().nth(1);
    if arg.as_deref() == Some("keygen") {
        return keygen();
    }

    let config = load_config(arg.or_else(|| std::env::var("MURMUR_CONFIG").ok()))?;
    init_tracing(&config.log)?;

    let node = NodeRuntime::new(config).context("failed to initialize node")?;
    node.start().await.context("failed to start node")?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl+C")?;

    node.shutdown().await;
    Ok(())
}
