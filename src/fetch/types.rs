// src/fetch/types.rs
use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};

/// One historical trade as returned by the data API.
///
/// Only the fields the collector interprets are typed; the rest of the
/// payload rides along untouched in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    /// Unix seconds. The API returns pages in non-increasing order.
    #[serde(deserialize_with = "de_timestamp")]
    pub timestamp: u64,
    /// On-chain transaction hash; the stable identity when present.
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub size: f64,
    /// "BUY" or "SELL".
    #[serde(default)]
    pub side: Option<String>,
    /// Outcome label the trade was placed on, e.g. "Yes".
    #[serde(default)]
    pub outcome: Option<String>,
    /// Untyped remainder of the payload (wallet, asset id, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Stable identity used to deduplicate across overlapping pages.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TradeKey {
    Tx(String),
    /// Rows without a usable hash fall back to their timestamp.
    Ts(u64),
}

impl Trade {
    pub fn key(&self) -> TradeKey {
        match &self.transaction_hash {
            Some(h) if !h.is_empty() => TradeKey::Tx(h.clone()),
            _ => TradeKey::Ts(self.timestamp),
        }
    }
}

/// One bounded page request against a market's trade history.
///
/// Pages come back newest-first and strictly below `before` when a cursor
/// is given. Returning fewer than `limit` rows is the sole exhaustion
/// signal; callers must not infer anything else from page contents.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(
        &self,
        market: &str,
        limit: usize,
        before: Option<u64>,
    ) -> Result<Vec<Trade>>;
}

/// The API has emitted timestamps both as integers and as decimal strings.
fn de_timestamp<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    struct TsVisitor;

    impl serde::de::Visitor<'_> for TsVisitor {
        type Value = u64;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a unix timestamp as an integer or string")
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<u64, E> {
            Ok(v)
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<u64, E> {
            u64::try_from(v).map_err(|_| E::custom("negative timestamp"))
        }

        fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<u64, E> {
            if v < 0.0 {
                return Err(E::custom("negative timestamp"));
            }
            Ok(v as u64)
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<u64, E> {
            v.parse().map_err(E::custom)
        }
    }

    deserializer.deserialize_any(TsVisitor)
}
