//! Collection driver: fetch recent closed markets from the Gamma catalog,
//! sample each market's trade history under the configured budget, and
//! write the flattened rows to CSV.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use polymarket_collector::catalog::GammaClient;
use polymarket_collector::collector::Collector;
use polymarket_collector::dataset;
use polymarket_collector::fetch::http::DataApiClient;
use polymarket_collector::{CollectorConfig, RateLimiter, TradeSampler};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();

    let cfg = CollectorConfig::load_default()?;
    tracing::info!(
        weeks_back = cfg.weeks_back,
        markets_per_window = cfg.markets_per_window,
        max_trades_per_market = cfg.max_trades_per_market,
        num_windows = cfg.num_windows,
        "starting collection"
    );

    std::fs::create_dir_all(&cfg.output_dir)?;

    let limiter = Arc::new(RateLimiter::new(Duration::from_millis(
        cfg.min_request_interval_ms,
    )));

    let gamma = GammaClient::new(limiter.clone())?;
    let markets = gamma
        .fetch_recent_closed(cfg.weeks_back, cfg.markets_per_window)
        .await?;
    tracing::info!(markets = markets.len(), "catalog fetched");
    dataset::save_raw_markets(&cfg.output_dir.join("raw_markets.json"), &markets)?;

    let fetcher = DataApiClient::new(limiter)?;
    let sampler = TradeSampler::with_config(fetcher, cfg.sampler);
    let collector = Collector::new(sampler, cfg.clone());

    let mut rng = match cfg.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let (rows, stats) = collector.collect(&markets, &mut rng).await?;

    let out_path = cfg.output_dir.join(format!(
        "polymarket_trades_{}.csv",
        Utc::now().format("%Y%m%d_%H%M%S")
    ));
    dataset::write_rows(&out_path, &rows)?;

    tracing::info!(
        markets_with_trades = stats.markets_with_trades,
        markets_sampled = stats.markets_sampled,
        skipped_no_resolution = stats.markets_skipped_no_resolution,
        skipped_no_trades = stats.markets_skipped_no_trades,
        trades_total = stats.trades_total,
        path = %out_path.display(),
        "collection complete"
    );

    Ok(())
}
