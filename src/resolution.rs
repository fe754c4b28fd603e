// src/resolution.rs
//! Winner determination for closed markets. The Gamma API reports final
//! outcome prices; the winning token settles at (effectively) 1.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

use crate::catalog::Market;

/// Final prices are not always exactly "1"; anything this close counts.
const WINNER_PRICE_CUTOFF: f64 = 0.99;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TokenOutcome {
    pub index: usize,
    pub winner: bool,
}

/// A closed market with a determined winner, ready for trade collection.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedMarket {
    pub condition_id: String,
    pub question: String,
    pub category: Option<String>,
    pub created_at: Option<String>,
    pub end_date: Option<String>,
    pub resolved_at: Option<String>,
    pub winning_outcome: String,
    pub volume: f64,
    pub liquidity: f64,
    /// Outcome label → settlement flag, for marking trades won/lost.
    pub tokens: HashMap<String, TokenOutcome>,
}

/// Extract resolution data from a market, or `None` when the market is
/// still open, malformed, or settled without a clear winner.
pub fn resolve_market(market: &Market) -> Option<ResolvedMarket> {
    if !market.closed {
        return None;
    }
    let condition_id = market.condition_id.clone()?;

    // Outcomes and prices arrive as JSON-encoded string arrays.
    let outcomes: Vec<String> = serde_json::from_str(market.outcomes.as_deref()?).ok()?;
    let prices: Vec<String> = serde_json::from_str(market.outcome_prices.as_deref()?).ok()?;
    if outcomes.is_empty() || prices.is_empty() {
        return None;
    }

    let mut tokens: HashMap<String, TokenOutcome> = HashMap::new();
    let mut winning_outcome: Option<String> = None;

    for (index, (outcome, price)) in outcomes.iter().zip(prices.iter()).enumerate() {
        let price: f64 = price.parse().unwrap_or(0.0);
        let winner = price > WINNER_PRICE_CUTOFF;
        tokens.insert(outcome.clone(), TokenOutcome { index, winner });
        if winner {
            winning_outcome = Some(outcome.clone());
        }
    }

    Some(ResolvedMarket {
        condition_id,
        question: market.question.clone().unwrap_or_default(),
        category: market.category.clone(),
        created_at: market.created_at.clone(),
        end_date: market.end_date.clone(),
        resolved_at: market.closed_time.clone(),
        winning_outcome: winning_outcome?,
        volume: market.volume,
        liquidity: market.liquidity,
        tokens,
    })
}

/// Resolution timestamps arrive in several shapes: RFC 3339 with `Z`,
/// a bare `+00` offset, a full `+00:00`, or naive. Normalize, then parse.
pub fn parse_resolution_time(raw: &str) -> Option<DateTime<Utc>> {
    let mut s = raw.trim().to_string();
    if let Some(stripped) = s.strip_suffix('Z') {
        s = format!("{stripped}+00:00");
    }
    if s.ends_with("+00") {
        s.push_str(":00");
    }
    // The Gamma API separates date and time with a space.
    let rfc = s.replacen(' ', "T", 1);
    if let Ok(dt) = DateTime::parse_from_rfc3339(&rfc) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed_market(outcomes: &str, prices: &str) -> Market {
        serde_json::from_value(serde_json::json!({
            "conditionId": "0xcond",
            "question": "Who wins?",
            "closed": true,
            "outcomes": outcomes,
            "outcomePrices": prices,
            "closedTime": "2026-03-01T10:00:00Z",
            "volumeNum": 10.0,
        }))
        .unwrap()
    }

    #[test]
    fn yes_no_market_resolves_to_winner() {
        let m = closed_market(r#"["Yes", "No"]"#, r#"["1", "0"]"#);
        let r = resolve_market(&m).unwrap();
        assert_eq!(r.winning_outcome, "Yes");
        assert!(r.tokens["Yes"].winner);
        assert!(!r.tokens["No"].winner);
        assert_eq!(r.tokens["No"].index, 1);
    }

    #[test]
    fn open_or_unresolved_markets_are_rejected() {
        let mut open = closed_market(r#"["Yes", "No"]"#, r#"["1", "0"]"#);
        open.closed = false;
        assert!(resolve_market(&open).is_none());

        // Mid prices: nothing settled at 1.
        let unresolved = closed_market(r#"["Yes", "No"]"#, r#"["0.6", "0.4"]"#);
        assert!(resolve_market(&unresolved).is_none());

        let malformed = closed_market("not json", r#"["1", "0"]"#);
        assert!(resolve_market(&malformed).is_none());
    }

    #[test]
    fn resolution_time_formats_all_parse() {
        let expect = parse_resolution_time("2026-03-01T10:00:00+00:00").unwrap();
        for raw in [
            "2026-03-01T10:00:00Z",
            "2026-03-01T10:00:00+00",
            "2026-03-01 10:00:00+00",
            "2026-03-01T10:00:00",
            "2026-03-01 10:00:00",
        ] {
            assert_eq!(parse_resolution_time(raw), Some(expect), "failed for {raw}");
        }
        assert!(parse_resolution_time("yesterday").is_none());
    }
}
