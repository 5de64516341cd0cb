//! Shared types for the EDGESCOUT engine.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that provider, engine, and
//! dashboard modules can depend on them without circular references.
//!
//! Wire payloads are parsed into these types at the collaborator
//! boundary (parse, don't validate) so the decision pipeline never
//! re-checks key presence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Event odds (raw, externally sourced)
// ---------------------------------------------------------------------------

/// One upcoming event with quotes from every contributing bookmaker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventOdds {
    pub id: String,
    #[serde(default)]
    pub sport_key: String,
    pub home_team: String,
    pub away_team: String,
    pub commence_time: DateTime<Utc>,
    #[serde(default)]
    pub bookmakers: Vec<BookmakerOdds>,
}

impl fmt::Display for EventOdds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} ({}, {} books)",
            self.away_team,
            self.home_team,
            self.commence_time.format("%Y-%m-%d %H:%M UTC"),
            self.bookmakers.len(),
        )
    }
}

impl EventOdds {
    /// Conventional "Away @ Home" event label.
    pub fn event_name(&self) -> String {
        format!("{} @ {}", self.away_team, self.home_team)
    }
}

/// All markets quoted by a single bookmaker for one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmakerOdds {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub markets: Vec<MarketOdds>,
}

/// One market (moneyline, spread, total) quoted by one bookmaker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketOdds {
    pub key: MarketKey,
    #[serde(default)]
    pub outcomes: Vec<OddsOutcome>,
}

/// One side of one market.
///
/// `price` is an American-odds signed integer; 0 means "no quote".
/// `point` carries the spread/total line where applicable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsOutcome {
    pub name: String,
    #[serde(default)]
    pub price: i32,
    #[serde(default)]
    pub point: Option<f64>,
}

/// Market identifiers as used by the odds feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketKey {
    H2h,
    Spreads,
    Totals,
    /// Any market key the pipeline does not evaluate (props etc.).
    #[serde(other)]
    Unsupported,
}

impl fmt::Display for MarketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketKey::H2h => write!(f, "h2h"),
            MarketKey::Spreads => write!(f, "spreads"),
            MarketKey::Totals => write!(f, "totals"),
            MarketKey::Unsupported => write!(f, "unsupported"),
        }
    }
}

// ---------------------------------------------------------------------------
// Odds summary (derived, immutable once built)
// ---------------------------------------------------------------------------

/// Compact per-market consensus/best-price reduction of an `EventOdds`.
///
/// Built once by `engine::summarizer::summarize` and never mutated;
/// decisions embed a clone as their odds snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsSummary {
    pub home_team: String,
    pub away_team: String,
    pub moneyline: MoneylineSummary,
    pub spread: SpreadSummary,
    pub total: TotalSummary,
    /// Number of bookmaker entries in the source payload, regardless of
    /// how many contributed matching outcomes.
    pub bookmaker_count: usize,
}

impl fmt::Display for OddsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} | ML {}/{} (best {}/{}) | {} books",
            self.away_team,
            self.home_team,
            self.moneyline.away_consensus,
            self.moneyline.home_consensus,
            self.moneyline.away_best,
            self.moneyline.home_best,
            self.bookmaker_count,
        )
    }
}

impl OddsSummary {
    /// Whether the summary carries any usable moneyline quote.
    pub fn has_moneyline(&self) -> bool {
        self.moneyline.home_consensus != 0 || self.moneyline.away_consensus != 0
    }
}

/// Moneyline consensus/best prices per side.
///
/// "best" is the numerically greatest American-odds value: the highest
/// payout for underdogs (positive) but the cheapest price for favorites
/// (negative). Callers must not read it as "best for the bettor"
/// without the sign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneylineSummary {
    pub home_consensus: i32,
    pub away_consensus: i32,
    pub home_best: i32,
    pub away_best: i32,
}

/// Spread line and mean price per side. Lines are the first observed
/// per side; only prices are averaged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpreadSummary {
    pub home_line: f64,
    pub away_line: f64,
    pub home_odds: i32,
    pub away_odds: i32,
}

/// Totals line (first observed over line) and mean over/under prices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TotalSummary {
    pub line: f64,
    pub over_odds: i32,
    pub under_odds: i32,
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which side of a market a bet takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetSide {
    Home,
    Away,
    Over,
    Under,
}

impl fmt::Display for BetSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetSide::Home => write!(f, "home"),
            BetSide::Away => write!(f, "away"),
            BetSide::Over => write!(f, "over"),
            BetSide::Under => write!(f, "under"),
        }
    }
}

impl std::str::FromStr for BetSide {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "home" => Ok(BetSide::Home),
            "away" => Ok(BetSide::Away),
            "over" => Ok(BetSide::Over),
            "under" => Ok(BetSide::Under),
            _ => Err(anyhow::anyhow!("Unknown bet side: {s}")),
        }
    }
}

/// The market a bet is placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetType {
    Moneyline,
    Spread,
    Total,
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetType::Moneyline => write!(f, "moneyline"),
            BetType::Spread => write!(f, "spread"),
            BetType::Total => write!(f, "total"),
        }
    }
}

/// The verdict of a single event analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    PlaceBet,
    Skip,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::PlaceBet => write!(f, "place_bet"),
            Verdict::Skip => write!(f, "skip"),
        }
    }
}

// ---------------------------------------------------------------------------
// Bet decision (pipeline output)
// ---------------------------------------------------------------------------

/// A fully synthesized betting decision for one event.
///
/// Created once per event analysis and never mutated afterwards;
/// the scanner only appends completed decisions to its log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetDecision {
    pub decision_id: String,
    pub event_id: String,
    pub event_name: String,
    pub sport: String,
    pub home_team: String,
    pub away_team: String,
    pub commence_time: DateTime<Utc>,

    pub verdict: Verdict,
    pub bet_type: Option<BetType>,
    pub bet_side: Option<BetSide>,
    /// Trust in the verdict, 0–1.
    pub confidence: f64,
    /// Fractional edge estimate; synonymous with edge here, can be negative.
    pub expected_value: f64,
    pub win_probability: f64,

    pub reasoning: String,
    pub key_insights: Vec<String>,
    pub risk_factors: Vec<String>,

    /// Snapshot of the odds summary the decision was based on.
    pub odds_snapshot: OddsSummary,
    /// Research text shown to the model / appended to reasoning, if any.
    pub research_summary: Option<String>,

    pub created_at: DateTime<Utc>,
    /// `"local-heuristic"` or the external model identifier.
    pub model_used: String,
}

impl fmt::Display for BetDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.verdict {
            Verdict::PlaceBet => write!(
                f,
                "{} | BET {} {} | conf={:.0}% ev={:.2}% p(win)={:.0}% [{}]",
                self.event_name,
                self.bet_type.map(|t| t.to_string()).unwrap_or_default(),
                self.bet_side.map(|s| s.to_string()).unwrap_or_default(),
                self.confidence * 100.0,
                self.expected_value * 100.0,
                self.win_probability * 100.0,
                self.model_used,
            ),
            Verdict::Skip => write!(
                f,
                "{} | SKIP | {} [{}]",
                self.event_name, self.reasoning, self.model_used,
            ),
        }
    }
}

impl BetDecision {
    /// Whether this decision passes the recommendation filter.
    pub fn is_actionable(&self, min_confidence: f64) -> bool {
        self.verdict == Verdict::PlaceBet
            && self.confidence >= min_confidence
            && self.expected_value > 0.0
    }
}

// ---------------------------------------------------------------------------
// Research bundle
// ---------------------------------------------------------------------------

/// Season record for one team.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamRecord {
    pub wins: u32,
    pub losses: u32,
    pub win_pct: f64,
    pub point_diff: f64,
    pub home_record: Option<String>,
    pub away_record: Option<String>,
}

/// One entry from a team's injury report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjuryReport {
    pub player: String,
    pub position: Option<String>,
    /// Free-text status as reported: "Out", "Doubtful", "Questionable"…
    pub status: String,
}

impl InjuryReport {
    /// Whether the player is likely unavailable for the matchup.
    pub fn likely_out(&self) -> bool {
        matches!(self.status.to_lowercase().as_str(), "out" | "doubtful")
    }
}

/// One completed game from a team's recent schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResult {
    pub opponent: String,
    pub won: bool,
    pub team_score: u32,
    pub opponent_score: u32,
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} vs {} ({}-{})",
            if self.won { "W" } else { "L" },
            self.opponent,
            self.team_score,
            self.opponent_score,
        )
    }
}

/// A news headline relevant to a team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub published: Option<DateTime<Utc>>,
}

/// Everything gathered about one team from the free data source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamSummary {
    pub name: String,
    pub record: Option<TeamRecord>,
    pub injuries: Vec<InjuryReport>,
    pub recent_games: Vec<GameResult>,
    pub news: Vec<Headline>,
}

impl TeamSummary {
    /// Fraction of recent games won, if any were found.
    pub fn recent_form(&self) -> Option<f64> {
        if self.recent_games.is_empty() {
            return None;
        }
        let wins = self.recent_games.iter().filter(|g| g.won).count();
        Some(wins as f64 / self.recent_games.len() as f64)
    }

    /// Count of players listed OUT or DOUBTFUL.
    pub fn injuries_out(&self) -> usize {
        self.injuries.iter().filter(|i| i.likely_out()).count()
    }

    /// Whether any data source produced anything for this team.
    pub fn has_data(&self) -> bool {
        self.record.is_some() || !self.recent_games.is_empty() || !self.injuries.is_empty()
    }
}

/// Combined research bundle for one matchup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchupSummary {
    pub home: TeamSummary,
    pub away: TeamSummary,
    pub generated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

/// Account balance from the trading platform, in dollars.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AccountBalance {
    pub available: f64,
    pub total_value: f64,
}

impl fmt::Display for AccountBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "available=${:.2} total=${:.2}",
            self.available, self.total_value,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for EDGESCOUT.
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    #[error("Odds provider error: {0}")]
    OddsProvider(String),

    #[error("Research provider error: {0}")]
    Research(String),

    #[error("Inference error ({model}): {message}")]
    Inference { model: String, message: String },

    #[error("Model response schema violation: {0}")]
    Schema(String),

    #[error("Trading platform error: {0}")]
    Trading(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
