//! Mock providers for integration testing.
//!
//! Deterministic `OddsProvider` / `ResearchProvider` /
//! `InferenceProvider` implementations with controllable responses
//! and failure injection — all in-memory.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use edgescout::llm::InferenceProvider;
use edgescout::providers::{OddsProvider, ResearchProvider};
use edgescout::types::{
    BookmakerOdds, EventOdds, MarketKey, MarketOdds, MatchupSummary, OddsOutcome, TeamSummary,
};

// ---------------------------------------------------------------------------
// Event builders
// ---------------------------------------------------------------------------

/// Build a moneyline-only event quoted by the given (home, away)
/// price pairs, one bookmaker per pair.
pub fn ml_event(id: &str, home: &str, away: &str, books: &[(i32, i32)]) -> EventOdds {
    let bookmakers = books
        .iter()
        .enumerate()
        .map(|(i, &(home_price, away_price))| BookmakerOdds {
            key: format!("book{i}"),
            title: format!("Book {i}"),
            markets: vec![MarketOdds {
                key: MarketKey::H2h,
                outcomes: vec![
                    OddsOutcome { name: home.to_string(), price: home_price, point: None },
                    OddsOutcome { name: away.to_string(), price: away_price, point: None },
                ],
            }],
        })
        .collect();

    EventOdds {
        id: id.to_string(),
        sport_key: "basketball_nba".to_string(),
        home_team: home.to_string(),
        away_team: away.to_string(),
        commence_time: Utc::now() + Duration::hours(6),
        bookmakers,
    }
}

/// An event with no bookmaker quotes at all.
pub fn empty_event(id: &str, home: &str, away: &str) -> EventOdds {
    EventOdds {
        id: id.to_string(),
        sport_key: "basketball_nba".to_string(),
        home_team: home.to_string(),
        away_team: away.to_string(),
        commence_time: Utc::now() + Duration::hours(6),
        bookmakers: Vec::new(),
    }
}

/// Books averaging home -160 with a soft -130 outlier: heuristic edge
/// ≈ 0.05, comfortably above the 0.03 default threshold.
pub fn soft_books() -> Vec<(i32, i32)> {
    vec![(-175, 140), (-175, 140), (-130, 140)]
}

// ---------------------------------------------------------------------------
// Mock odds provider
// ---------------------------------------------------------------------------

/// Serves a fixed event list; can be switched into a failing state.
pub struct MockOddsProvider {
    events: Vec<EventOdds>,
    force_error: Mutex<Option<String>>,
    pub fetch_count: AtomicU64,
}

impl MockOddsProvider {
    pub fn new(events: Vec<EventOdds>) -> Self {
        Self {
            events,
            force_error: Mutex::new(None),
            fetch_count: AtomicU64::new(0),
        }
    }

    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }
}

#[async_trait]
impl OddsProvider for MockOddsProvider {
    async fn fetch_odds(&self, _sport_key: &str) -> Result<Vec<EventOdds>> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);
        if let Some(msg) = self.force_error.lock().unwrap().clone() {
            anyhow::bail!("{msg}");
        }
        Ok(self.events.clone())
    }

    fn name(&self) -> &str {
        "mock-odds"
    }
}

// ---------------------------------------------------------------------------
// Mock research provider
// ---------------------------------------------------------------------------

/// Returns canned research text, failing for configured home teams.
pub struct MockResearchProvider {
    failing_home_teams: Vec<String>,
    pub call_count: AtomicU64,
}

impl MockResearchProvider {
    pub fn failing_for(home_teams: &[&str]) -> Self {
        Self {
            failing_home_teams: home_teams.iter().map(|s| s.to_string()).collect(),
            call_count: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl ResearchProvider for MockResearchProvider {
    async fn matchup_context(
        &self,
        _sport_key: &str,
        home_team: &str,
        away_team: &str,
    ) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if self.failing_home_teams.iter().any(|t| t == home_team) {
            anyhow::bail!("research backend unreachable");
        }
        Ok(format!("=== MATCHUP: {away_team} @ {home_team} ===\nBoth teams healthy."))
    }

    async fn matchup_summary(
        &self,
        _sport_key: &str,
        home_team: &str,
        away_team: &str,
    ) -> Result<MatchupSummary> {
        Ok(MatchupSummary {
            home: TeamSummary { name: home_team.to_string(), ..Default::default() },
            away: TeamSummary { name: away_team.to_string(), ..Default::default() },
            generated_at: Utc::now(),
        })
    }

    fn name(&self) -> &str {
        "mock-research"
    }
}

// ---------------------------------------------------------------------------
// Scripted inference provider
// ---------------------------------------------------------------------------

/// Pops one scripted response per call, in order.
pub struct ScriptedInference {
    responses: Mutex<Vec<Result<serde_json::Value>>>,
}

impl ScriptedInference {
    pub fn new(responses: Vec<Result<serde_json::Value>>) -> Self {
        Self { responses: Mutex::new(responses) }
    }
}

#[async_trait]
impl InferenceProvider for ScriptedInference {
    async fn complete_json(&self, _system: &str, _prompt: &str) -> Result<serde_json::Value> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            anyhow::bail!("no scripted response left");
        }
        responses.remove(0)
    }

    fn model_name(&self) -> &str {
        "scripted/test-model"
    }
}
