// src/sampler/probe.rs
//! Newest-first size probe and the backward range estimate for markets
//! that cross the probe threshold.

use metrics::counter;

use crate::fetch::types::{PageFetcher, Trade};
use crate::sampler::config::SamplerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProbeStatus {
    /// A short page ended the history; everything reachable is in hand.
    Exhausted,
    /// The probe threshold was reached; the market is large.
    Threshold,
    /// A fetch failed; the probe kept its partial data.
    Faulted,
}

pub(crate) struct ProbeOutcome {
    pub trades: Vec<Trade>,
    pub status: ProbeStatus,
}

/// Page newest-first until the history runs out or `probe_threshold` rows
/// have accumulated. Each page's oldest timestamp becomes the next cursor,
/// so pages are disjoint by construction; dedup still happens downstream
/// because writes landing mid-run can shift pagination.
pub(crate) async fn probe_size<F>(fetcher: &F, market: &str, cfg: &SamplerConfig) -> ProbeOutcome
where
    F: PageFetcher + ?Sized,
{
    let mut trades: Vec<Trade> = Vec::new();
    let mut before: Option<u64> = None;

    while trades.len() < cfg.probe_threshold {
        let page = match fetcher.fetch_page(market, cfg.page_size, before).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(market, error = ?e, "size probe stopped by fetch failure");
                counter!("sampler_fetch_errors_total").increment(1);
                return ProbeOutcome {
                    trades,
                    status: ProbeStatus::Faulted,
                };
            }
        };

        let short = page.len() < cfg.page_size;
        if let Some(oldest) = page.last() {
            before = Some(oldest.timestamp);
        }
        trades.extend(page);

        if short {
            return ProbeOutcome {
                trades,
                status: ProbeStatus::Exhausted,
            };
        }
    }

    ProbeOutcome {
        trades,
        status: ProbeStatus::Threshold,
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RangeEstimate {
    /// Oldest timestamp observed. A bound, not an exact value: the true
    /// oldest record may be earlier if the probe cap was hit first.
    pub oldest_reachable: u64,
    pub exhausted: bool,
}

/// Keep paging backward a bounded number of times purely to estimate how
/// far the history extends. Intervening rows are not retained; only the
/// running oldest timestamp is.
pub(crate) async fn estimate_range<F>(
    fetcher: &F,
    market: &str,
    cfg: &SamplerConfig,
    boundary: u64,
) -> RangeEstimate
where
    F: PageFetcher + ?Sized,
{
    let mut oldest = boundary;

    for _ in 0..cfg.range_probe_pages {
        let page = match fetcher.fetch_page(market, cfg.page_size, Some(oldest)).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(market, error = ?e, "range probe stopped by fetch failure");
                counter!("sampler_fetch_errors_total").increment(1);
                break;
            }
        };

        let short = page.len() < cfg.page_size;
        if let Some(last) = page.last() {
            if last.timestamp < oldest {
                oldest = last.timestamp;
            }
        }
        if short {
            return RangeEstimate {
                oldest_reachable: oldest,
                exhausted: true,
            };
        }
    }

    RangeEstimate {
        oldest_reachable: oldest,
        exhausted: false,
    }
}
