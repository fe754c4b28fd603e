// src/config.rs
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::sampler::SamplerConfig;

const ENV_PATH: &str = "COLLECTOR_CONFIG_PATH";

/// Run-level configuration for the collection driver. Everything has a
/// default, so a missing config file means "collect with stock settings".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CollectorConfig {
    pub output_dir: PathBuf,
    /// How many weekly catalog windows to walk back from now.
    pub weeks_back: u32,
    pub markets_per_window: usize,
    /// The per-market record budget.
    pub max_trades_per_market: usize,
    /// Requested stratification windows (the sampler caps this).
    pub num_windows: usize,
    /// Write a progress CSV every N markets; 0 disables checkpoints.
    pub checkpoint_every: usize,
    /// Minimum spacing between any two API requests.
    pub min_request_interval_ms: u64,
    /// Fixed seed for reproducible window sampling; absent = OS entropy.
    pub rng_seed: Option<u64>,
    pub sampler: SamplerConfig,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("polymarket_data"),
            weeks_back: 8,
            markets_per_window: 100,
            max_trades_per_market: 10_000,
            num_windows: 10,
            checkpoint_every: 50,
            min_request_interval_ms: 100,
            rng_seed: None,
            sampler: SamplerConfig::default(),
        }
    }
}

impl CollectorConfig {
    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        parse_config(&content, ext.as_str())
    }

    /// Load using env var + fallbacks:
    /// 1) $COLLECTOR_CONFIG_PATH
    /// 2) config/collector.toml
    /// 3) config/collector.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("COLLECTOR_CONFIG_PATH points to non-existent path"));
        }
        let toml_p = PathBuf::from("config/collector.toml");
        if toml_p.exists() {
            return Self::load_from(&toml_p);
        }
        let json_p = PathBuf::from("config/collector.json");
        if json_p.exists() {
            return Self::load_from(&json_p);
        }
        Ok(Self::default())
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<CollectorConfig> {
    // Try TOML first if hinted, JSON otherwise; fall through to the other.
    if hint_ext == "toml" {
        if let Ok(cfg) = toml::from_str(s) {
            return Ok(cfg);
        }
    }
    if let Ok(cfg) = serde_json::from_str(s) {
        return Ok(cfg);
    }
    if hint_ext != "toml" {
        if let Ok(cfg) = toml::from_str(s) {
            return Ok(cfg);
        }
    }
    Err(anyhow!("unsupported config format"))
}
