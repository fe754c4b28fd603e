// src/telemetry.rs
use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on whatever exporter
/// the embedding process installs).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "collector_pages_fetched_total",
            "Pages fetched from the data API."
        );
        describe_counter!(
            "sampler_fetch_errors_total",
            "Page fetches that failed and were absorbed."
        );
        describe_counter!(
            "sampler_markets_small_total",
            "Markets whose full history fit under the probe threshold."
        );
        describe_counter!(
            "sampler_markets_large_total",
            "Markets that crossed the probe threshold."
        );
        describe_counter!(
            "sampler_window_trades_total",
            "Trades collected from older-span windows."
        );
        describe_counter!(
            "collector_markets_skipped_total",
            "Markets skipped for missing resolution or trades."
        );
        describe_gauge!(
            "collector_last_market_ts",
            "Unix ts when the collector last finished a market."
        );
        describe_histogram!(
            "sampler_market_ms",
            "Wall time spent sampling one market, in milliseconds."
        );
    });
}
