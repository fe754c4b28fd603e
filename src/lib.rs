// src/lib.rs
// Public library surface for integration tests (and potential reuse).
//
// The algorithmic core lives in `sampler`; `fetch` is the transport seam
// it consumes. The remaining modules are the collection pipeline around
// the core: catalog discovery, resolution, row flattening, and the
// multi-market driver.

pub mod catalog;
pub mod collector;
pub mod config;
pub mod dataset;
pub mod fetch;
pub mod resolution;
pub mod sampler;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::config::CollectorConfig;
pub use crate::fetch::rate_limit::RateLimiter;
pub use crate::fetch::types::{PageFetcher, Trade, TradeKey};
pub use crate::sampler::{SampleResult, SamplerConfig, TimeWindow, TradeSampler};
