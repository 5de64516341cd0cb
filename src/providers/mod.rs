//! External collaborator contracts.
//!
//! Defines the provider traits the decision pipeline consumes and the
//! concrete HTTP clients:
//! - The Odds API — raw multi-bookmaker odds retrieval
//! - ESPN site API — free team/injury/news research
//! - Kalshi — portfolio balance (prompt context only)
//!
//! All transport concerns (timeouts, retries) live here; the core
//! treats any provider failure as an ordinary recoverable error for
//! the single event involved.

pub mod odds_api;
pub mod espn;
pub mod kalshi;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{AccountBalance, EventOdds, MatchupSummary};

/// Abstraction over raw odds retrieval.
///
/// Implementors return the typed [`EventOdds`] shape; an empty list
/// means "no events", never an error.
#[async_trait]
pub trait OddsProvider: Send + Sync {
    /// Fetch current odds for every upcoming event of a sport.
    async fn fetch_odds(&self, sport_key: &str) -> Result<Vec<EventOdds>>;

    /// Provider name for logging and identification.
    fn name(&self) -> &str;
}

/// Abstraction over team/matchup research.
///
/// Missing data is not an error: implementors return a "data
/// unavailable" sentinel text and only fail on transport errors.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    /// Fetch and format research context for one matchup.
    async fn matchup_context(
        &self,
        sport_key: &str,
        home_team: &str,
        away_team: &str,
    ) -> Result<String>;

    /// Fetch the underlying structured bundle (for callers that want
    /// more than the formatted text block).
    async fn matchup_summary(
        &self,
        sport_key: &str,
        home_team: &str,
        away_team: &str,
    ) -> Result<MatchupSummary>;

    /// Provider name for logging and identification.
    fn name(&self) -> &str;
}

/// Abstraction over the trading/portfolio platform.
///
/// Consumed only for prompt context in the model-judged path; order
/// placement is out of scope here.
#[async_trait]
pub trait TradingPlatform: Send + Sync {
    /// Current account balance.
    async fn get_balance(&self) -> Result<AccountBalance>;

    /// Platform name for logging and identification.
    fn name(&self) -> &str;
}
