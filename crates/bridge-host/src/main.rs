//! Surface Bridge host
//!
//! Opens a window that plays the compositor and drives a native surface
//! provider through the bridge lifecycle. The provider and surface size come
//! from the JSON file named by `SURFACE_BRIDGE_CONFIG`.

mod compositor;
mod shell;

use anyhow::{Context, Result};
use bridge_core::BridgeConfig;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

// Use mimalloc as the global allocator for reduced memory fragmentation
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> Result<()> {
    // Initialize logging; RUST_LOG overrides the default level
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    info!("Surface Bridge starting...");

    let config = BridgeConfig::from_env().context("failed to load configuration")?;
    info!("Surface {}x{}, provider: {:?}", config.width, config.height, config.provider);

    let provider = bridge_native::provider_from_config(&config.provider)
        .context("failed to open surface provider")?;

    shell::run(&config, provider)?;

    info!("Surface Bridge shutting down");
    Ok(())
}
