// src/collector.rs
//! Multi-market collection driver: resolve each catalog entry, sample its
//! trade history under the configured budget, flatten, and checkpoint.
//! One market's fetch trouble never aborts the run.

use anyhow::Result;
use metrics::{counter, gauge};
use rand::Rng;
use serde::Serialize;

use crate::catalog::Market;
use crate::config::CollectorConfig;
use crate::dataset::{self, TradeRow};
use crate::fetch::types::PageFetcher;
use crate::resolution;
use crate::sampler::TradeSampler;
use crate::telemetry::ensure_metrics_described;

#[derive(Debug, Default, Clone, Serialize)]
pub struct CollectorStats {
    pub markets_with_trades: usize,
    pub markets_skipped_no_resolution: usize,
    pub markets_skipped_no_trades: usize,
    pub markets_sampled: usize,
    pub trades_total: usize,
}

pub struct Collector<F: PageFetcher> {
    sampler: TradeSampler<F>,
    cfg: CollectorConfig,
}

impl<F: PageFetcher> Collector<F> {
    pub fn new(sampler: TradeSampler<F>, cfg: CollectorConfig) -> Self {
        Self { sampler, cfg }
    }

    /// Run collection over `markets`. Checkpoint CSVs go to the configured
    /// output dir every `checkpoint_every` markets; checkpoint I/O errors
    /// propagate, fetch errors never do.
    pub async fn collect<R: Rng>(
        &self,
        markets: &[Market],
        rng: &mut R,
    ) -> Result<(Vec<TradeRow>, CollectorStats)> {
        ensure_metrics_described();

        let mut rows: Vec<TradeRow> = Vec::new();
        let mut stats = CollectorStats::default();

        for (i, market) in markets.iter().enumerate() {
            let Some(resolved) = resolution::resolve_market(market) else {
                stats.markets_skipped_no_resolution += 1;
                counter!("collector_markets_skipped_total").increment(1);
                tracing::debug!(
                    market = market.condition_id.as_deref().unwrap_or("<no id>"),
                    "skipped: no valid resolution data"
                );
                continue;
            };

            let result = self
                .sampler
                .sample(
                    &resolved.condition_id,
                    self.cfg.max_trades_per_market,
                    self.cfg.num_windows,
                    rng,
                )
                .await;

            if result.trades.is_empty() {
                stats.markets_skipped_no_trades += 1;
                counter!("collector_markets_skipped_total").increment(1);
                tracing::debug!(market = %resolved.condition_id, "skipped: no trades found");
                continue;
            }

            stats.markets_with_trades += 1;
            if result.was_sampled {
                stats.markets_sampled += 1;
            }
            tracing::info!(
                market = %resolved.condition_id,
                question = preview(&resolved.question, 60),
                trades = result.trades.len(),
                sampled = result.was_sampled,
                progress = %format!("{}/{}", i + 1, markets.len()),
                "market collected"
            );

            rows.extend(dataset::flatten(&result.trades, &resolved, result.was_sampled));
            gauge!("collector_last_market_ts").set(chrono::Utc::now().timestamp().max(0) as f64);

            if self.cfg.checkpoint_every > 0 && (i + 1) % self.cfg.checkpoint_every == 0 {
                let path = self
                    .cfg
                    .output_dir
                    .join(format!("trades_progress_{}.csv", i + 1));
                dataset::write_rows(&path, &rows)?;
                tracing::info!(
                    rows = rows.len(),
                    path = %path.display(),
                    "progress checkpoint written"
                );
            }
        }

        stats.trades_total = rows.len();
        Ok((rows, stats))
    }
}

/// First `max` characters, respecting char boundaries (questions can carry
/// arbitrary unicode).
fn preview(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_respects_char_boundaries() {
        assert_eq!(preview("short", 60), "short");
        assert_eq!(preview("příliš žluťoučký", 6), "příliš");
    }
}
