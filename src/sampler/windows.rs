// src/sampler/windows.rs
//! Equal-duration stratification of the older span, one capped quota per
//! window, deduplicated against everything already collected.

use std::collections::HashSet;

use metrics::counter;
use rand::Rng;

use crate::fetch::types::{PageFetcher, Trade, TradeKey};
use crate::sampler::config::SamplerConfig;

/// Half-open `[start, end)` slice of the older span, in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: u64,
    pub end: u64,
}

impl TimeWindow {
    pub fn contains(&self, ts: u64) -> bool {
        self.start <= ts && ts < self.end
    }
}

/// Split `[oldest, boundary)` into `n` equal-duration contiguous windows.
/// The last window absorbs the integer-division remainder so the union
/// covers the span exactly.
pub fn partition(oldest: u64, boundary: u64, n: usize) -> Vec<TimeWindow> {
    if boundary <= oldest {
        return Vec::new();
    }
    let span = boundary - oldest;
    let n = (n.max(1) as u64).min(span);
    let width = span / n;

    (0..n)
        .map(|i| TimeWindow {
            start: oldest + i * width,
            end: if i == n - 1 {
                boundary
            } else {
                oldest + (i + 1) * width
            },
        })
        .collect()
}

/// Pull up to `quota` unseen trades whose timestamps fall inside `window`,
/// paging backward from just past the window's end.
///
/// Stops on: quota reached, short page, cursor past the window start, or
/// the per-window attempt cap. A fetch failure ends only this window;
/// whatever was collected so far is kept. If the final page overshoots the
/// quota, the candidate set is downsampled with the injected rng.
pub(crate) async fn sample_window<F, R>(
    fetcher: &F,
    market: &str,
    window: TimeWindow,
    quota: usize,
    cfg: &SamplerConfig,
    seen: &mut HashSet<TradeKey>,
    rng: &mut R,
) -> Vec<Trade>
where
    F: PageFetcher + ?Sized,
    R: Rng,
{
    if quota == 0 || window.end <= window.start {
        return Vec::new();
    }

    let mut candidates: Vec<Trade> = Vec::new();
    // The cursor is exclusive; starting one past the end admits the whole
    // window and the filter below enforces the half-open bound.
    let mut before = window.end + 1;
    let mut attempts = 0usize;

    while candidates.len() < quota && attempts < cfg.window_page_attempts {
        attempts += 1;
        let page = match fetcher.fetch_page(market, cfg.page_size, Some(before)).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(
                    market,
                    window_start = window.start,
                    window_end = window.end,
                    error = ?e,
                    "window fetch failed; keeping partial window"
                );
                counter!("sampler_fetch_errors_total").increment(1);
                break;
            }
        };

        let short = page.len() < cfg.page_size;
        let page_oldest = page.last().map(|t| t.timestamp);

        for t in page {
            if !window.contains(t.timestamp) {
                continue;
            }
            let key = t.key();
            if seen.insert(key) {
                candidates.push(t);
            }
        }

        match page_oldest {
            // Everything below this page is older than the window.
            Some(ts) if ts < window.start => break,
            Some(ts) => before = ts,
            None => break,
        }
        if short {
            break;
        }
    }

    if candidates.len() > quota {
        let picked = rand::seq::index::sample(rng, candidates.len(), quota);
        let mut keep: Vec<Trade> = picked.iter().map(|i| candidates[i].clone()).collect();
        keep.sort_by_key(|t| t.timestamp);
        counter!("sampler_window_trades_total").increment(keep.len() as u64);
        keep
    } else {
        counter!("sampler_window_trades_total").increment(candidates.len() as u64);
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_covers_span_with_equal_widths() {
        let windows = partition(1_000, 2_000, 4);
        assert_eq!(windows.len(), 4);
        assert_eq!(windows[0], TimeWindow { start: 1_000, end: 1_250 });
        assert_eq!(windows[3], TimeWindow { start: 1_750, end: 2_000 });
        // Contiguous: each window starts where the previous one ended.
        for pair in windows.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn last_window_absorbs_remainder() {
        let windows = partition(0, 10, 3);
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].end - windows[0].start, 3);
        assert_eq!(windows[2], TimeWindow { start: 6, end: 10 });
    }

    #[test]
    fn degenerate_spans_yield_no_windows() {
        assert!(partition(5, 5, 3).is_empty());
        assert!(partition(9, 5, 3).is_empty());
    }

    #[test]
    fn zero_window_request_is_clamped_to_one() {
        let windows = partition(0, 100, 0);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0], TimeWindow { start: 0, end: 100 });
    }

    #[test]
    fn window_bounds_are_half_open() {
        let w = TimeWindow { start: 10, end: 20 };
        assert!(w.contains(10));
        assert!(w.contains(19));
        assert!(!w.contains(20));
        assert!(!w.contains(9));
    }
}
