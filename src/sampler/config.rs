// src/sampler/config.rs
use serde::{Deserialize, Serialize};

/// Tunables for the trade sampler. Defaults mirror production collection
/// runs against the data API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SamplerConfig {
    /// Rows accumulated newest-first before a market counts as large.
    pub probe_threshold: usize,
    /// Page size requested per fetch (the API caps at 500).
    pub page_size: usize,
    /// Extra backward probe pages used only to bound the oldest timestamp.
    pub range_probe_pages: usize,
    /// Spans narrower than this are not worth stratifying.
    pub min_span_secs: u64,
    /// Page fetches allowed per window before giving up on its quota.
    pub window_page_attempts: usize,
    /// Hard cap on window count, bounding worst-case request volume.
    pub max_windows: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            probe_threshold: 2_000,
            page_size: 500,
            range_probe_pages: 5,
            min_span_secs: 3_600,
            window_page_attempts: 3,
            max_windows: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: SamplerConfig = toml::from_str("probe_threshold = 100").unwrap();
        assert_eq!(cfg.probe_threshold, 100);
        assert_eq!(cfg.page_size, 500);
        assert_eq!(cfg.max_windows, 5);
    }
}
