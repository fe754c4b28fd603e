// src/fetch/mod.rs
pub mod http;
pub mod rate_limit;
pub mod types;
