// src/fetch/http.rs
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;

use crate::fetch::rate_limit::RateLimiter;
use crate::fetch::types::{PageFetcher, Trade};

pub const DATA_API_URL: &str = "https://data-api.polymarket.com";

/// Per-request wall clock bound. There is no whole-operation deadline;
/// a market's sampling run is bounded only by its page count.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Trade-history client for the data API.
///
/// Every request goes through the shared [`RateLimiter`], so several
/// clients (catalog + trades) stay under one process-wide request budget.
pub struct DataApiClient {
    client: reqwest::Client,
    base_url: String,
    limiter: Arc<RateLimiter>,
}

impl DataApiClient {
    pub fn new(limiter: Arc<RateLimiter>) -> Result<Self> {
        Self::with_base_url(DATA_API_URL, limiter)
    }

    pub fn with_base_url(base_url: impl Into<String>, limiter: Arc<RateLimiter>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building data api http client")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            limiter,
        })
    }
}

#[async_trait]
impl PageFetcher for DataApiClient {
    async fn fetch_page(
        &self,
        market: &str,
        limit: usize,
        before: Option<u64>,
    ) -> Result<Vec<Trade>> {
        self.limiter.acquire().await;

        let url = format!("{}/trades", self.base_url);
        let mut req = self.client.get(&url).query(&[
            ("market", market.to_string()),
            ("limit", limit.to_string()),
        ]);
        if let Some(b) = before {
            req = req.query(&[("before", b.to_string())]);
        }

        let resp = req
            .send()
            .await
            .context("trades page request")?
            .error_for_status()
            .context("trades page status")?;
        let trades: Vec<Trade> = resp.json().await.context("decoding trades page")?;

        counter!("collector_pages_fetched_total").increment(1);
        Ok(trades)
    }
}
