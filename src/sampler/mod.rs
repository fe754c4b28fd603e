// src/sampler/mod.rs
//! Bounded-budget, time-stratified sampling of one market's trade history.
//!
//! Control flow per market: size probe → (small: done) | (large: range
//! estimate → window sampling → merge). Fetch failures are absorbed at the
//! phase that hit them; `sample` never fails outright, it returns whatever
//! was collected.

pub mod config;
mod merge;
mod probe;
pub mod windows;

use std::collections::HashSet;
use std::time::Instant;

use metrics::{counter, histogram};
use rand::Rng;

use crate::fetch::types::{PageFetcher, Trade, TradeKey};
use crate::telemetry::ensure_metrics_described;

pub use self::config::SamplerConfig;
pub use self::windows::{partition, TimeWindow};

use self::probe::ProbeStatus;

/// Outcome of sampling one market.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SampleResult {
    /// Ascending by timestamp, unique by identity, never above the budget.
    pub trades: Vec<Trade>,
    /// False only when the full reachable history was returned.
    pub was_sampled: bool,
}

pub struct TradeSampler<F: PageFetcher> {
    fetcher: F,
    cfg: SamplerConfig,
}

impl<F: PageFetcher> TradeSampler<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_config(fetcher, SamplerConfig::default())
    }

    pub fn with_config(fetcher: F, cfg: SamplerConfig) -> Self {
        Self { fetcher, cfg }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.cfg
    }

    /// Collect at most `budget` trades for `market`, stratifying the older
    /// span into `num_windows` (capped) equal-duration windows when the
    /// history is larger than the probe threshold.
    ///
    /// The rng only influences which in-window rows survive a quota
    /// overshoot; the newest-probed segment is deterministic.
    pub async fn sample<R: Rng>(
        &self,
        market: &str,
        budget: usize,
        num_windows: usize,
        rng: &mut R,
    ) -> SampleResult {
        ensure_metrics_described();
        let started = Instant::now();
        let result = self.sample_inner(market, budget, num_windows, rng).await;
        histogram!("sampler_market_ms").record(started.elapsed().as_secs_f64() * 1_000.0);
        result
    }

    async fn sample_inner<R: Rng>(
        &self,
        market: &str,
        budget: usize,
        num_windows: usize,
        rng: &mut R,
    ) -> SampleResult {
        let cfg = &self.cfg;
        let outcome = probe::probe_size(&self.fetcher, market, cfg).await;

        if outcome.trades.is_empty() {
            // A clean empty history is complete; a faulted one may not be.
            return SampleResult {
                trades: Vec::new(),
                was_sampled: outcome.status == ProbeStatus::Faulted,
            };
        }

        match outcome.status {
            ProbeStatus::Exhausted => {
                counter!("sampler_markets_small_total").increment(1);
                let total = outcome.trades.len();
                let trades = merge::finalize(outcome.trades, Vec::new(), budget);
                let truncated = trades.len() < total;
                return SampleResult {
                    trades,
                    was_sampled: truncated,
                };
            }
            ProbeStatus::Faulted => {
                // Partial probe: the unfetched tail makes this a truncation risk.
                return SampleResult {
                    trades: merge::finalize(outcome.trades, Vec::new(), budget),
                    was_sampled: true,
                };
            }
            ProbeStatus::Threshold => {}
        }

        counter!("sampler_markets_large_total").increment(1);
        let probed = outcome.trades;

        if probed.len() >= budget {
            // The newest segment alone exhausts the budget.
            return SampleResult {
                trades: merge::finalize(probed, Vec::new(), budget),
                was_sampled: true,
            };
        }

        // Pages arrive newest-first, so the probe's last row is its oldest.
        let boundary = probed.iter().map(|t| t.timestamp).min().unwrap_or(0);
        let newest_ts = probed.iter().map(|t| t.timestamp).max().unwrap_or(0);

        let estimate = probe::estimate_range(&self.fetcher, market, cfg, boundary).await;
        tracing::debug!(
            market,
            oldest_reachable = estimate.oldest_reachable,
            exhausted = estimate.exhausted,
            boundary,
            "range estimate"
        );

        let total_span = newest_ts.saturating_sub(estimate.oldest_reachable);
        let older_span = boundary.saturating_sub(estimate.oldest_reachable);
        if total_span < cfg.min_span_secs || older_span < cfg.min_span_secs {
            // Too narrow to stratify; the probed tail still got cut off.
            return SampleResult {
                trades: merge::finalize(probed, Vec::new(), budget),
                was_sampled: true,
            };
        }

        let remaining = budget - probed.len();
        let n = num_windows.clamp(1, cfg.max_windows);
        // Integer division; any leftover budget is left unspent, not
        // redistributed across windows.
        let quota = remaining / n;

        let mut seen: HashSet<TradeKey> = probed.iter().map(|t| t.key()).collect();
        let mut older: Vec<Trade> = Vec::new();
        for window in partition(estimate.oldest_reachable, boundary, n) {
            let got = windows::sample_window(
                &self.fetcher,
                market,
                window,
                quota,
                cfg,
                &mut seen,
                rng,
            )
            .await;
            older.extend(got);
        }

        SampleResult {
            trades: merge::finalize(probed, older, budget),
            was_sampled: true,
        }
    }
}
