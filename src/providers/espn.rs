//! Free sports research via the public ESPN site API.
//!
//! Replaces a paid research service: standings, injuries, recent
//! results, and news come from `site.api.espn.com`, unauthenticated.
//! Missing data is never an error — each lookup degrades to an empty
//! section and the formatter renders a "limited data" sentinel when
//! nothing at all was found.
//!
//! Matchup bundles are cached with a time-boxed validity window; the
//! decision pipeline treats the cache as a strict value-returning
//! lookup and never manages expiry itself.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, warn};

use super::ResearchProvider;
use crate::engine::research;
use crate::types::{GameResult, Headline, InjuryReport, MatchupSummary, TeamRecord, TeamSummary};

const BASE_URL: &str = "https://site.api.espn.com/apis/site/v2/sports";
const PROVIDER_NAME: &str = "espn";

/// Recent games considered for form.
const RECENT_GAMES: usize = 5;

/// Headlines kept per team.
const NEWS_LIMIT: usize = 5;

/// Injury entries kept per team.
const INJURY_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// Sport mapping
// ---------------------------------------------------------------------------

/// ESPN path segments for an odds-feed sport key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaguePath {
    pub sport: &'static str,
    pub league: &'static str,
}

/// Map odds-feed sport keys onto ESPN's sport/league URL segments.
/// Unknown keys fall back to NFL, matching the feed's primary sport.
pub fn league_path(sport_key: &str) -> LeaguePath {
    match sport_key {
        "americanfootball_nfl" => LeaguePath { sport: "football", league: "nfl" },
        "americanfootball_ncaaf" => LeaguePath { sport: "football", league: "college-football" },
        "basketball_nba" => LeaguePath { sport: "basketball", league: "nba" },
        "basketball_ncaab" => LeaguePath { sport: "basketball", league: "mens-college-basketball" },
        "baseball_mlb" => LeaguePath { sport: "baseball", league: "mlb" },
        "icehockey_nhl" => LeaguePath { sport: "hockey", league: "nhl" },
        _ => LeaguePath { sport: "football", league: "nfl" },
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

struct CacheEntry {
    summary: MatchupSummary,
    inserted_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct EspnClient {
    http: Client,
    cache: Mutex<HashMap<String, CacheEntry>>,
    cache_ttl: Duration,
}

impl EspnClient {
    pub fn new(cache_ttl_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent("Mozilla/5.0 (compatible; EDGESCOUT/0.1.0)")
            .build()
            .context("Failed to build ESPN HTTP client")?;

        Ok(Self {
            http,
            cache: Mutex::new(HashMap::new()),
            cache_ttl: Duration::seconds(cache_ttl_secs as i64),
        })
    }

    // -- HTTP --------------------------------------------------------------

    /// GET a JSON document; any failure becomes `None` so one broken
    /// endpoint never sinks the whole bundle.
    async fn get_json(&self, url: &str) -> Option<Value> {
        match self.http.get(url).send().await {
            Ok(response) if response.status().is_success() => match response.json().await {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(url, error = %e, "ESPN payload parse failed");
                    None
                }
            },
            Ok(response) => {
                warn!(url, status = %response.status(), "ESPN returned an error");
                None
            }
            Err(e) => {
                warn!(url, error = %e, "ESPN request failed");
                None
            }
        }
    }

    // -- Lookups -----------------------------------------------------------

    /// Resolve a team name to its ESPN id via the league teams list
    /// (fuzzy: substring on name/location or exact abbreviation).
    async fn find_team_id(&self, path: LeaguePath, team_name: &str) -> Option<String> {
        let url = format!("{BASE_URL}/{}/{}/teams", path.sport, path.league);
        let data = self.get_json(&url).await?;
        find_team_id_in(&data, team_name)
    }

    async fn team_record(&self, path: LeaguePath, team_name: &str) -> Option<TeamRecord> {
        let url = format!("{BASE_URL}/{}/{}/standings", path.sport, path.league);
        let data = self.get_json(&url).await?;
        parse_standings_record(&data, team_name)
    }

    async fn injuries(&self, path: LeaguePath, team_name: &str) -> Vec<InjuryReport> {
        let url = format!("{BASE_URL}/{}/{}/injuries", path.sport, path.league);
        match self.get_json(&url).await {
            Some(data) => parse_injuries(&data, team_name, INJURY_LIMIT),
            None => Vec::new(),
        }
    }

    async fn recent_games(&self, path: LeaguePath, team_id: &str) -> Vec<GameResult> {
        let url = format!(
            "{BASE_URL}/{}/{}/teams/{}/schedule",
            path.sport,
            path.league,
            urlencoding::encode(team_id),
        );
        match self.get_json(&url).await {
            Some(data) => parse_schedule(&data, team_id, RECENT_GAMES),
            None => Vec::new(),
        }
    }

    async fn news(&self, path: LeaguePath, team_name: &str) -> Vec<Headline> {
        let url = format!("{BASE_URL}/{}/{}/news", path.sport, path.league);
        match self.get_json(&url).await {
            Some(data) => parse_news(&data, team_name, NEWS_LIMIT),
            None => Vec::new(),
        }
    }

    /// Everything gathered about one team, sections fetched concurrently.
    async fn team_summary(&self, path: LeaguePath, team_name: &str) -> TeamSummary {
        let team_id = self.find_team_id(path, team_name).await;

        let (record, injuries, news) = tokio::join!(
            self.team_record(path, team_name),
            self.injuries(path, team_name),
            self.news(path, team_name),
        );

        let recent_games = match &team_id {
            Some(id) => self.recent_games(path, id).await,
            None => Vec::new(),
        };

        TeamSummary {
            name: team_name.to_string(),
            record,
            injuries,
            recent_games,
            news,
        }
    }

    fn cache_key(sport_key: &str, home_team: &str, away_team: &str) -> String {
        format!("{sport_key}|{home_team}|{away_team}")
    }

    fn cached(&self, key: &str) -> Option<MatchupSummary> {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.get(key).and_then(|entry| {
            if Utc::now() - entry.inserted_at < self.cache_ttl {
                Some(entry.summary.clone())
            } else {
                None
            }
        })
    }

    fn store(&self, key: String, summary: MatchupSummary) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.insert(key, CacheEntry { summary, inserted_at: Utc::now() });
    }
}

#[async_trait]
impl ResearchProvider for EspnClient {
    async fn matchup_context(
        &self,
        sport_key: &str,
        home_team: &str,
        away_team: &str,
    ) -> Result<String> {
        let summary = self.matchup_summary(sport_key, home_team, away_team).await?;
        Ok(research::format_matchup(&summary))
    }

    async fn matchup_summary(
        &self,
        sport_key: &str,
        home_team: &str,
        away_team: &str,
    ) -> Result<MatchupSummary> {
        let key = Self::cache_key(sport_key, home_team, away_team);
        if let Some(hit) = self.cached(&key) {
            debug!(sport = sport_key, home = home_team, away = away_team, "Research cache hit");
            return Ok(hit);
        }

        let path = league_path(sport_key);
        let (home, away) = tokio::join!(
            self.team_summary(path, home_team),
            self.team_summary(path, away_team),
        );

        let summary = MatchupSummary { home, away, generated_at: Utc::now() };
        self.store(key, summary.clone());
        Ok(summary)
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

// ---------------------------------------------------------------------------
// Wire parsing
//
// ESPN's site API is deeply nested and undocumented; these helpers
// walk the JSON defensively and return empty sections on any shape
// mismatch.
// ---------------------------------------------------------------------------

fn name_matches(candidate: &str, wanted: &str) -> bool {
    candidate.to_lowercase().contains(&wanted.to_lowercase())
}

/// `/teams` → sports[0].leagues[0].teams[].team{id,displayName,location,abbreviation}
fn find_team_id_in(data: &Value, team_name: &str) -> Option<String> {
    let teams = data
        .pointer("/sports/0/leagues/0/teams")?
        .as_array()?;

    let wanted = team_name.to_lowercase();
    for entry in teams {
        let Some(team) = entry.get("team") else { continue };
        let display = team.get("displayName").and_then(Value::as_str).unwrap_or("");
        let location = team.get("location").and_then(Value::as_str).unwrap_or("");
        let abbrev = team.get("abbreviation").and_then(Value::as_str).unwrap_or("");

        if name_matches(display, team_name)
            || name_matches(location, team_name)
            || abbrev.to_lowercase() == wanted
        {
            return match team.get("id") {
                Some(Value::String(id)) => Some(id.clone()),
                Some(Value::Number(id)) => Some(id.to_string()),
                _ => None,
            };
        }
    }
    None
}

/// `/standings` → children[].standings.entries[].{team, stats[]}
fn parse_standings_record(data: &Value, team_name: &str) -> Option<TeamRecord> {
    let groups = data.get("children").and_then(Value::as_array)?;

    for group in groups {
        let entries = group.pointer("/standings/entries").and_then(Value::as_array);
        for entry in entries.into_iter().flatten() {
            let display = entry
                .pointer("/team/displayName")
                .and_then(Value::as_str)
                .unwrap_or("");
            if !name_matches(display, team_name) {
                continue;
            }

            let stats: HashMap<&str, &Value> = entry
                .get("stats")
                .and_then(Value::as_array)
                .map(|list| {
                    list.iter()
                        .filter_map(|s| Some((s.get("name")?.as_str()?, s)))
                        .collect()
                })
                .unwrap_or_default();

            let number = |key: &str| -> f64 {
                stats
                    .get(key)
                    .and_then(|s| s.get("value"))
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0)
            };
            let text = |key: &str| -> Option<String> {
                stats
                    .get(key)
                    .and_then(|s| s.get("displayValue"))
                    .and_then(Value::as_str)
                    .map(String::from)
            };

            return Some(TeamRecord {
                wins: number("wins") as u32,
                losses: number("losses") as u32,
                win_pct: number("winPercent"),
                point_diff: number("pointDifferential"),
                home_record: text("Home"),
                away_record: text("Road"),
            });
        }
    }
    None
}

/// `/injuries` → injuries[].{team.displayName, injuries[].{athlete, status}}
fn parse_injuries(data: &Value, team_name: &str, limit: usize) -> Vec<InjuryReport> {
    let mut reports = Vec::new();

    let teams = data
        .get("injuries")
        .or_else(|| data.get("teams"))
        .and_then(Value::as_array);

    for team_data in teams.into_iter().flatten() {
        let display = team_data
            .pointer("/team/displayName")
            .or_else(|| team_data.get("displayName"))
            .and_then(Value::as_str)
            .unwrap_or("");
        if !name_matches(display, team_name) {
            continue;
        }

        for injury in team_data.get("injuries").and_then(Value::as_array).into_iter().flatten() {
            let player = injury
                .pointer("/athlete/displayName")
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string();
            let position = injury
                .pointer("/athlete/position/abbreviation")
                .and_then(Value::as_str)
                .map(String::from);
            let status = injury
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();

            reports.push(InjuryReport { player, position, status });
            if reports.len() >= limit {
                return reports;
            }
        }
    }

    reports
}

/// `/teams/{id}/schedule` → events[].competitions[0].competitors[],
/// completed games only, most recent first as served.
fn parse_schedule(data: &Value, team_id: &str, limit: usize) -> Vec<GameResult> {
    let mut games = Vec::new();

    for event in data.get("events").and_then(Value::as_array).into_iter().flatten() {
        let completed = event
            .pointer("/status/type/completed")
            .or_else(|| event.pointer("/competitions/0/status/type/completed"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !completed {
            continue;
        }

        let competitors = match event
            .pointer("/competitions/0/competitors")
            .and_then(Value::as_array)
        {
            Some(c) if c.len() == 2 => c,
            _ => continue,
        };

        let id_of = |c: &Value| -> String {
            match c.pointer("/team/id") {
                Some(Value::String(id)) => id.clone(),
                Some(Value::Number(id)) => id.to_string(),
                _ => String::new(),
            }
        };

        let (ours, theirs) = if id_of(&competitors[0]) == team_id {
            (&competitors[0], &competitors[1])
        } else if id_of(&competitors[1]) == team_id {
            (&competitors[1], &competitors[0])
        } else {
            continue;
        };

        let score_of = |c: &Value| -> u32 {
            match c.get("score") {
                // The schedule endpoint nests scores as objects
                Some(Value::Object(_)) => c
                    .pointer("/score/value")
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0) as u32,
                Some(Value::String(s)) => s.parse().unwrap_or(0),
                Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0) as u32,
                _ => 0,
            }
        };

        games.push(GameResult {
            opponent: theirs
                .pointer("/team/displayName")
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string(),
            won: ours.get("winner").and_then(Value::as_bool).unwrap_or(false),
            team_score: score_of(ours),
            opponent_score: score_of(theirs),
        });

        if games.len() >= limit {
            break;
        }
    }

    games
}

/// `/news` → articles[].{headline, published, categories[]}
fn parse_news(data: &Value, team_name: &str, limit: usize) -> Vec<Headline> {
    let mut headlines = Vec::new();

    for article in data.get("articles").and_then(Value::as_array).into_iter().flatten() {
        let headline = article.get("headline").and_then(Value::as_str).unwrap_or("");

        let in_categories = article
            .get("categories")
            .and_then(Value::as_array)
            .map(|cats| {
                cats.iter().any(|c| {
                    c.get("description")
                        .and_then(Value::as_str)
                        .map(|d| name_matches(d, team_name))
                        .unwrap_or(false)
                })
            })
            .unwrap_or(false);

        if !in_categories && !name_matches(headline, team_name) {
            continue;
        }

        let published = article
            .get("published")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        headlines.push(Headline { title: headline.to_string(), published });
        if headlines.len() >= limit {
            break;
        }
    }

    headlines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
