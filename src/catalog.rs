// src/catalog.rs
//! Gamma API market catalog: closed markets fetched over weekly date
//! windows, highest volume first, deduplicated by condition id.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::fetch::rate_limit::RateLimiter;

pub const GAMMA_API_URL: &str = "https://gamma-api.polymarket.com";

const MARKETS_PAGE_SIZE: usize = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One market as returned by the Gamma API. Fields the collector does not
/// interpret ride along in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    #[serde(default)]
    pub condition_id: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub closed: bool,
    /// JSON-encoded array of outcome labels, e.g. `"[\"Yes\", \"No\"]"`.
    #[serde(default)]
    pub outcomes: Option<String>,
    /// JSON-encoded array of final prices, parallel to `outcomes`.
    #[serde(default)]
    pub outcome_prices: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub closed_time: Option<String>,
    #[serde(default, rename = "volumeNum")]
    pub volume: f64,
    #[serde(default, rename = "liquidityNum")]
    pub liquidity: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

pub struct GammaClient {
    client: reqwest::Client,
    base_url: String,
    limiter: Arc<RateLimiter>,
}

impl GammaClient {
    pub fn new(limiter: Arc<RateLimiter>) -> Result<Self> {
        Self::with_base_url(GAMMA_API_URL, limiter)
    }

    pub fn with_base_url(base_url: impl Into<String>, limiter: Arc<RateLimiter>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building gamma http client")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            limiter,
        })
    }

    async fn fetch_markets_page(
        &self,
        limit: usize,
        offset: usize,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<Market>> {
        self.limiter.acquire().await;

        let url = format!("{}/markets", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("closed", "true".to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
                ("order", "volume".to_string()),
                ("ascending", "false".to_string()),
                ("end_date_min", start_date.to_string()),
                ("end_date_max", end_date.to_string()),
            ])
            .send()
            .await
            .context("markets page request")?
            .error_for_status()
            .context("markets page status")?;

        let markets: Vec<Market> = resp.json().await.context("decoding markets page")?;
        metrics::counter!("collector_pages_fetched_total").increment(1);
        Ok(markets)
    }

    /// Paginate one date window until `max_markets` or a short page.
    pub async fn fetch_window(
        &self,
        start_date: &str,
        end_date: &str,
        max_markets: usize,
    ) -> Result<Vec<Market>> {
        let mut markets: Vec<Market> = Vec::new();
        let mut offset = 0usize;

        while markets.len() < max_markets {
            let limit = MARKETS_PAGE_SIZE.min(max_markets - markets.len());
            let page = self
                .fetch_markets_page(limit, offset, start_date, end_date)
                .await?;
            let short = page.len() < limit;
            markets.extend(page);
            if short {
                break;
            }
            offset += MARKETS_PAGE_SIZE;
        }

        Ok(markets)
    }

    /// Walk weekly windows back from now, collecting closed markets and
    /// dropping repeats across windows. A failed window is logged and
    /// skipped; catalog fetching never aborts the run.
    pub async fn fetch_recent_closed(
        &self,
        weeks_back: u32,
        markets_per_window: usize,
    ) -> Result<Vec<Market>> {
        let now = Utc::now();
        let mut all: Vec<Market> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for week in 0..weeks_back {
            let end = now - chrono::Duration::weeks(i64::from(week));
            let start = end - chrono::Duration::weeks(1);
            let start_str = start.format("%Y-%m-%d").to_string();
            let end_str = end.format("%Y-%m-%d").to_string();

            match self.fetch_window(&start_str, &end_str, markets_per_window).await {
                Ok(batch) => {
                    let fetched = batch.len();
                    let before = all.len();
                    dedup_into(&mut all, &mut seen, batch);
                    tracing::info!(
                        window_start = %start_str,
                        window_end = %end_str,
                        fetched,
                        new = all.len() - before,
                        "catalog window fetched"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        window_start = %start_str,
                        window_end = %end_str,
                        error = ?e,
                        "catalog window failed; continuing"
                    );
                }
            }
        }

        Ok(all)
    }
}

/// Append `batch` to `all`, keeping the first market seen per condition id.
/// Markets without a condition id cannot be traded against and are dropped.
pub(crate) fn dedup_into(all: &mut Vec<Market>, seen: &mut HashSet<String>, batch: Vec<Market>) {
    for market in batch {
        let Some(cid) = market.condition_id.clone() else {
            continue;
        };
        if seen.insert(cid) {
            all.push(market);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market(cid: Option<&str>) -> Market {
        serde_json::from_value(serde_json::json!({
            "conditionId": cid,
            "closed": true,
        }))
        .unwrap()
    }

    #[test]
    fn markets_deserialize_from_gamma_shape() {
        let raw = serde_json::json!({
            "conditionId": "0x1",
            "question": "Will it rain?",
            "closed": true,
            "outcomes": "[\"Yes\", \"No\"]",
            "outcomePrices": "[\"1\", \"0\"]",
            "closedTime": "2026-01-02 12:00:00+00",
            "volumeNum": 1234.5,
            "slug": "will-it-rain"
        });
        let m: Market = serde_json::from_value(raw).unwrap();
        assert_eq!(m.condition_id.as_deref(), Some("0x1"));
        assert_eq!(m.volume, 1234.5);
        assert_eq!(m.extra.get("slug").and_then(|v| v.as_str()), Some("will-it-rain"));
    }

    #[test]
    fn dedup_keeps_first_occurrence_and_drops_idless() {
        let mut all = Vec::new();
        let mut seen = HashSet::new();
        dedup_into(&mut all, &mut seen, vec![market(Some("a")), market(Some("b"))]);
        dedup_into(&mut all, &mut seen, vec![market(Some("a")), market(None)]);
        assert_eq!(all.len(), 2);
    }
}
