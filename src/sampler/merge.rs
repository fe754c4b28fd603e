// src/sampler/merge.rs
use std::collections::HashSet;

use crate::fetch::types::{Trade, TradeKey};

/// Combine probed-newest rows with windowed samples: dedup by identity
/// (first occurrence wins, so the newest-probed copy survives any
/// collision), order ascending by timestamp, and enforce the budget.
///
/// Truncation drops the *oldest* overflow — the newest-probed segment is
/// never displaced by older samples.
pub(crate) fn finalize(newest: Vec<Trade>, older: Vec<Trade>, budget: usize) -> Vec<Trade> {
    let mut seen: HashSet<TradeKey> = HashSet::with_capacity(newest.len() + older.len());
    let mut out: Vec<Trade> = Vec::with_capacity(newest.len() + older.len());

    for t in newest.into_iter().chain(older) {
        if seen.insert(t.key()) {
            out.push(t);
        }
    }

    out.sort_by_key(|t| t.timestamp);

    if out.len() > budget {
        let excess = out.len() - budget;
        out.drain(0..excess);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(hash: &str, ts: u64) -> Trade {
        Trade {
            timestamp: ts,
            transaction_hash: Some(hash.to_string()),
            price: 0.5,
            size: 1.0,
            side: None,
            outcome: None,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn duplicates_collapse_and_output_is_ascending() {
        let newest = vec![trade("c", 30), trade("b", 20)];
        let older = vec![trade("b", 20), trade("a", 10)];
        let out = finalize(newest, older, 10);
        let keys: Vec<_> = out.iter().map(|t| t.transaction_hash.clone().unwrap()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn truncation_drops_the_oldest_rows() {
        let newest = vec![trade("d", 40), trade("c", 30)];
        let older = vec![trade("b", 20), trade("a", 10)];
        let out = finalize(newest, older, 3);
        assert_eq!(out.len(), 3);
        assert_eq!(out.first().unwrap().timestamp, 20);
        assert_eq!(out.last().unwrap().timestamp, 40);
    }

    #[test]
    fn hashless_rows_dedup_by_timestamp() {
        let mut a = trade("", 7);
        a.transaction_hash = None;
        let mut b = trade("", 7);
        b.transaction_hash = Some(String::new());
        let out = finalize(vec![a], vec![b], 10);
        assert_eq!(out.len(), 1);
    }
}
