//! Local Store demo
//!
//! Registers a slow "user" cache, fires a round of concurrent lookups that
//! coalesce into a single production, then a round of sequential lookups
//! served from memory, and prints the resulting statistics.

use std::time::{Duration, Instant};

use anyhow::Context;
use tokio::task::JoinSet;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use local_store::{CacheRegistry, Config};

const CACHE_NAME: &str = "user";

/// Main entry point for the demo.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Register the demo cache in a fresh registry
/// 4. Run concurrent then sequential lookups
/// 5. Print statistics as JSON
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "local_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: default_capacity={}, demo_callers={}, demo_delay_ms={}",
        config.default_capacity, config.demo_callers, config.demo_delay_ms
    );

    let registry = CacheRegistry::from_config(&config);
    let delay = Duration::from_millis(config.demo_delay_ms);
    registry.create(CACHE_NAME, move |key: String| async move {
        tokio::time::sleep(delay).await;
        Ok(key)
    });

    // Concurrent round: one production shared by every caller
    let started = Instant::now();
    let mut callers = JoinSet::new();
    for index in 0..config.demo_callers {
        let cache = registry.require::<String>(CACHE_NAME)?;
        callers.spawn(async move {
            info!(index, "concurrent lookup started");
            let user = cache.get("user").await;
            info!(index, ?user, "concurrent lookup finished");
            user
        });
    }
    while let Some(joined) = callers.join_next().await {
        joined.context("lookup task panicked")??;
    }
    info!(elapsed = ?started.elapsed(), "concurrent round done");

    // Sequential round: every lookup is a hit
    let started = Instant::now();
    let cache = registry.require::<String>(CACHE_NAME)?;
    for index in 0..config.demo_callers {
        let user = cache.get("user").await?;
        info!(index, %user, "sequential lookup finished");
    }
    info!(elapsed = ?started.elapsed(), "sequential round done");

    let stats = serde_json::to_string_pretty(&cache.stats())?;
    println!("{stats}");
    Ok(())
}
