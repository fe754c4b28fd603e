// src/dataset.rs
//! Flattening sampled trades into analysis rows, plus CSV/JSON
//! persistence. CSV is written by hand: header once, RFC 4180 quoting.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use serde::Serialize;

use crate::catalog::Market;
use crate::fetch::types::Trade;
use crate::resolution::{parse_resolution_time, ResolvedMarket};

/// One flat row: a trade joined with its market's resolution data.
#[derive(Debug, Clone, Serialize)]
pub struct TradeRow {
    pub condition_id: String,
    pub question: String,
    pub category: Option<String>,
    pub trade_timestamp: u64,
    pub trade_time_utc: String,
    pub resolved_at: Option<String>,
    pub time_to_resolution_hours: Option<f64>,
    pub price: f64,
    pub size: f64,
    pub side: Option<String>,
    pub outcome: Option<String>,
    pub won: bool,
    pub volume_total: f64,
    pub was_sampled: bool,
}

/// Join trades with their market. Trades without an outcome label cannot
/// be scored and are dropped.
pub fn flatten(trades: &[Trade], market: &ResolvedMarket, was_sampled: bool) -> Vec<TradeRow> {
    let resolved_time = market
        .resolved_at
        .as_deref()
        .and_then(parse_resolution_time);

    trades
        .iter()
        .filter_map(|trade| {
            let outcome = trade.outcome.clone()?;
            let trade_time = Utc.timestamp_opt(i64::try_from(trade.timestamp).ok()?, 0).single()?;
            let time_to_resolution_hours = resolved_time
                .map(|resolved| (resolved - trade_time).num_seconds() as f64 / 3_600.0);
            let won = market
                .tokens
                .get(&outcome)
                .map(|token| token.winner)
                .unwrap_or(false);

            Some(TradeRow {
                condition_id: market.condition_id.clone(),
                question: market.question.clone(),
                category: market.category.clone(),
                trade_timestamp: trade.timestamp,
                trade_time_utc: trade_time.to_rfc3339(),
                resolved_at: market.resolved_at.clone(),
                time_to_resolution_hours,
                price: trade.price,
                size: trade.size,
                side: trade.side.clone(),
                outcome: Some(outcome),
                won,
                volume_total: market.volume,
                was_sampled,
            })
        })
        .collect()
}

const CSV_HEADER: &str = "condition_id,question,category,trade_timestamp,trade_time_utc,\
resolved_at,time_to_resolution_hours,price,size,side,outcome,won,volume_total,was_sampled";

/// Streaming CSV writer for trade rows.
pub struct TradeCsv {
    writer: BufWriter<File>,
}

impl TradeCsv {
    /// Create (or truncate) the file and write the header row.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("creating csv at {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{CSV_HEADER}").context("writing csv header")?;
        Ok(Self { writer })
    }

    pub fn write_row(&mut self, row: &TradeRow) -> Result<()> {
        writeln!(
            self.writer,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            esc(&row.condition_id),
            esc(&row.question),
            esc(row.category.as_deref().unwrap_or("")),
            row.trade_timestamp,
            esc(&row.trade_time_utc),
            esc(row.resolved_at.as_deref().unwrap_or("")),
            row.time_to_resolution_hours
                .map(|h| h.to_string())
                .unwrap_or_default(),
            row.price,
            row.size,
            esc(row.side.as_deref().unwrap_or("")),
            esc(row.outcome.as_deref().unwrap_or("")),
            row.won,
            row.volume_total,
            row.was_sampled,
        )
        .context("writing csv row")
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer.flush().context("flushing csv")
    }
}

/// Write all rows to `path` in one go (checkpoints and final output).
pub fn write_rows(path: &Path, rows: &[TradeRow]) -> Result<()> {
    let mut csv = TradeCsv::create(path)?;
    for row in rows {
        csv.write_row(row)?;
    }
    csv.finish()
}

/// Save the raw catalog next to the dataset for later re-processing.
pub fn save_raw_markets(path: &Path, markets: &[Market]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("creating raw markets file at {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), markets)
        .context("serializing raw markets")
}

/// RFC 4180: quote fields containing separators, quotes or newlines;
/// double embedded quotes.
fn esc(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
