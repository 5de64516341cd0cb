//! Odds summarization.
//!
//! Reduces a raw multi-bookmaker odds payload into a compact per-market
//! consensus/best-price structure. The summary is what the rest of the
//! pipeline (and the model prompt) sees — never the full bookmaker dump.

use tracing::debug;

use crate::types::{
    EventOdds, MarketKey, MoneylineSummary, OddsSummary, SpreadSummary, TotalSummary,
};

/// Literal outcome names used by the totals market.
const OVER: &str = "Over";
const UNDER: &str = "Under";

/// Build an [`OddsSummary`] from one event's raw bookmaker quotes.
///
/// Outcomes are classified by market key and side: home/away by exact
/// team-name match, over/under by literal outcome name. An outcome
/// naming neither team is silently dropped — that is missing data,
/// not an error. An empty bookmaker list yields an all-zero summary
/// with `bookmaker_count == 0`.
pub fn summarize(event: &EventOdds) -> OddsSummary {
    let mut ml_home: Vec<i32> = Vec::new();
    let mut ml_away: Vec<i32> = Vec::new();
    let mut sp_home: Vec<i32> = Vec::new();
    let mut sp_away: Vec<i32> = Vec::new();
    let mut sp_home_line: Option<f64> = None;
    let mut sp_away_line: Option<f64> = None;
    let mut tot_over: Vec<i32> = Vec::new();
    let mut tot_under: Vec<i32> = Vec::new();
    let mut tot_line: Option<f64> = None;

    for bookmaker in &event.bookmakers {
        for market in &bookmaker.markets {
            for outcome in &market.outcomes {
                match market.key {
                    MarketKey::H2h => {
                        if outcome.name == event.home_team {
                            ml_home.push(outcome.price);
                        } else if outcome.name == event.away_team {
                            ml_away.push(outcome.price);
                        }
                    }
                    MarketKey::Spreads => {
                        // Lines take the first observed point per side;
                        // only prices are averaged.
                        if outcome.name == event.home_team {
                            sp_home.push(outcome.price);
                            if sp_home_line.is_none() {
                                sp_home_line = outcome.point;
                            }
                        } else if outcome.name == event.away_team {
                            sp_away.push(outcome.price);
                            if sp_away_line.is_none() {
                                sp_away_line = outcome.point;
                            }
                        }
                    }
                    MarketKey::Totals => {
                        if outcome.name == OVER {
                            tot_over.push(outcome.price);
                            if tot_line.is_none() {
                                tot_line = outcome.point;
                            }
                        } else if outcome.name == UNDER {
                            tot_under.push(outcome.price);
                        }
                    }
                    MarketKey::Unsupported => {}
                }
            }
        }
    }

    debug!(
        event_id = %event.id,
        ml_home = ml_home.len(),
        ml_away = ml_away.len(),
        books = event.bookmakers.len(),
        "Odds summarized"
    );

    OddsSummary {
        home_team: event.home_team.clone(),
        away_team: event.away_team.clone(),
        moneyline: MoneylineSummary {
            home_consensus: consensus(&ml_home),
            away_consensus: consensus(&ml_away),
            home_best: best(&ml_home),
            away_best: best(&ml_away),
        },
        spread: SpreadSummary {
            home_line: sp_home_line.unwrap_or(0.0),
            away_line: sp_away_line.unwrap_or(0.0),
            home_odds: consensus(&sp_home),
            away_odds: consensus(&sp_away),
        },
        total: TotalSummary {
            line: tot_line.unwrap_or(0.0),
            over_odds: consensus(&tot_over),
            under_odds: consensus(&tot_under),
        },
        bookmaker_count: event.bookmakers.len(),
    }
}

/// Arithmetic mean of gathered prices, truncated to integer; 0 if empty.
fn consensus(prices: &[i32]) -> i32 {
    if prices.is_empty() {
        return 0;
    }
    let sum: i64 = prices.iter().map(|&p| p as i64).sum();
    (sum as f64 / prices.len() as f64) as i32
}

/// Numerically greatest American-odds value; 0 if empty.
///
/// For underdogs (positive) this is the highest payout; for favorites
/// (negative) it is the least negative, i.e. the cheapest favorite
/// price. NOT "best for the bettor" in general — downstream code must
/// keep the sign semantics in mind. Preserved as-is for compatibility
/// with the upstream feed conventions.
fn best(prices: &[i32]) -> i32 {
    prices.iter().copied().max().unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
