// tests/collector_run.rs
// Driver smoke test: resolution filtering, sampling, flattening, and
// checkpoint/final CSV output against a scripted trade source.

use anyhow::Result;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;

use polymarket_collector::catalog::Market;
use polymarket_collector::collector::Collector;
use polymarket_collector::dataset;
use polymarket_collector::{CollectorConfig, PageFetcher, Trade, TradeSampler};

/// Small fixed history for every market it is asked about.
struct StubFetcher {
    trades: Vec<Trade>,
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch_page(
        &self,
        _market: &str,
        limit: usize,
        before: Option<u64>,
    ) -> Result<Vec<Trade>> {
        Ok(self
            .trades
            .iter()
            .filter(|t| before.map_or(true, |b| t.timestamp < b))
            .take(limit)
            .cloned()
            .collect())
    }
}

fn market(cid: &str, closed: bool, prices: &str) -> Market {
    serde_json::from_value(serde_json::json!({
        "conditionId": cid,
        "question": format!("Question for {cid}?"),
        "closed": closed,
        "outcomes": "[\"Yes\", \"No\"]",
        "outcomePrices": prices,
        "closedTime": "2026-03-01T12:00:00Z",
        "volumeNum": 10.0,
    }))
    .unwrap()
}

fn trades(count: usize) -> Vec<Trade> {
    (0..count)
        .map(|i| Trade {
            timestamp: 1_772_359_200 - i as u64 * 60,
            transaction_hash: Some(format!("0x{i:04x}")),
            price: 0.7,
            size: 2.0,
            side: Some("BUY".to_string()),
            outcome: Some("Yes".to_string()),
            extra: serde_json::Map::new(),
        })
        .collect()
}

#[tokio::test]
async fn resolved_markets_are_collected_and_checkpointed() {
    let out_dir = std::env::temp_dir().join("polymarket_collector_driver_test");
    let _ = std::fs::remove_dir_all(&out_dir);
    std::fs::create_dir_all(&out_dir).unwrap();

    let cfg = CollectorConfig {
        output_dir: out_dir.clone(),
        max_trades_per_market: 1_000,
        checkpoint_every: 1,
        ..CollectorConfig::default()
    };

    let sampler = TradeSampler::with_config(StubFetcher { trades: trades(25) }, cfg.sampler);
    let collector = Collector::new(sampler, cfg);
    let mut rng = StdRng::seed_from_u64(11);

    let markets = vec![
        market("0xresolved", true, "[\"1\", \"0\"]"),
        market("0xopen", false, "[\"1\", \"0\"]"),
        market("0xunsettled", true, "[\"0.5\", \"0.5\"]"),
    ];

    let (rows, stats) = collector.collect(&markets, &mut rng).await.unwrap();

    assert_eq!(stats.markets_with_trades, 1);
    assert_eq!(stats.markets_skipped_no_resolution, 2);
    assert_eq!(stats.markets_skipped_no_trades, 0);
    assert_eq!(stats.markets_sampled, 0);
    assert_eq!(stats.trades_total, 25);

    assert_eq!(rows.len(), 25);
    assert!(rows.iter().all(|r| r.condition_id == "0xresolved"));
    assert!(rows.iter().all(|r| r.won), "Yes trades on a Yes-resolved market");

    // checkpoint_every = 1, so the first collected market wrote a checkpoint.
    let checkpoint = out_dir.join("trades_progress_1.csv");
    let content = std::fs::read_to_string(checkpoint).unwrap();
    assert_eq!(content.lines().count(), 26); // header + 25 rows

    // The final dataset writes wherever the caller points it.
    let final_path = out_dir.join("final.csv");
    dataset::write_rows(&final_path, &rows).unwrap();
    assert!(final_path.exists());
}

#[tokio::test]
async fn empty_market_counts_as_skipped() {
    let cfg = CollectorConfig {
        output_dir: std::env::temp_dir(),
        checkpoint_every: 0,
        ..CollectorConfig::default()
    };
    let sampler = TradeSampler::with_config(StubFetcher { trades: Vec::new() }, cfg.sampler);
    let collector = Collector::new(sampler, cfg);
    let mut rng = StdRng::seed_from_u64(11);

    let markets = vec![market("0xquiet", true, "[\"0\", \"1\"]")];
    let (rows, stats) = collector.collect(&markets, &mut rng).await.unwrap();

    assert!(rows.is_empty());
    assert_eq!(stats.markets_skipped_no_trades, 1);
    assert_eq!(stats.markets_with_trades, 0);
}
