//! The Odds API integration.
//!
//! Fetches upcoming events with multi-bookmaker quotes from
//! `https://api.the-odds-api.com/v4`. Responses deserialize straight
//! into the typed [`EventOdds`] shape; "no events" is an empty list,
//! never an error.
//!
//! Auth: `apiKey` query parameter. The free tier meters requests via
//! `x-requests-remaining` / `x-requests-used` response headers, which
//! are logged on every call.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::OddsProvider;
use crate::types::EventOdds;

const BASE_URL: &str = "https://api.the-odds-api.com/v4";
const PROVIDER_NAME: &str = "the-odds-api";

/// American odds, ISO timestamps — the shape the summarizer expects.
const ODDS_FORMAT: &str = "american";
const DATE_FORMAT: &str = "iso";

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

/// One entry from the sports catalog endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SportInfo {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub active: bool,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct TheOddsApiClient {
    http: Client,
    api_key: SecretString,
    regions: String,
    markets: String,
}

impl TheOddsApiClient {
    pub fn new(api_key: String, regions: String, markets: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent("EDGESCOUT/0.1.0")
            .build()
            .context("Failed to build odds HTTP client")?;

        Ok(Self {
            http,
            api_key: SecretString::new(api_key),
            regions,
            markets,
        })
    }

    /// URL for a sport's odds listing.
    fn odds_url(sport_key: &str) -> String {
        format!("{BASE_URL}/sports/{}/odds", urlencoding::encode(sport_key))
    }

    /// List the sports catalog (in-season sports only unless `all`).
    pub async fn get_sports(&self, all: bool) -> Result<Vec<SportInfo>> {
        let mut request = self
            .http
            .get(format!("{BASE_URL}/sports"))
            .query(&[("apiKey", self.api_key.expose_secret().as_str())]);
        if all {
            request = request.query(&[("all", "true")]);
        }

        let response = request.send().await.context("Sports catalog request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Odds API error {status}: {body}");
        }

        let sports: Vec<SportInfo> =
            response.json().await.context("Failed to parse sports catalog")?;
        debug!(count = sports.len(), "Sports catalog fetched");
        Ok(sports)
    }

    /// Log the metered-request headers the API returns on every call.
    fn log_quota(headers: &reqwest::header::HeaderMap) {
        let remaining = headers
            .get("x-requests-remaining")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("?");
        let used = headers
            .get("x-requests-used")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("?");
        debug!(remaining, used, "Odds API quota");
    }
}

#[async_trait]
impl OddsProvider for TheOddsApiClient {
    async fn fetch_odds(&self, sport_key: &str) -> Result<Vec<EventOdds>> {
        let response = self
            .http
            .get(Self::odds_url(sport_key))
            .query(&[
                ("apiKey", self.api_key.expose_secret().as_str()),
                ("regions", self.regions.as_str()),
                ("markets", self.markets.as_str()),
                ("oddsFormat", ODDS_FORMAT),
                ("dateFormat", DATE_FORMAT),
            ])
            .send()
            .await
            .with_context(|| format!("Odds request failed for {sport_key}"))?;

        let status = response.status();
        Self::log_quota(response.headers());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(sport = sport_key, status = %status, "Odds API returned an error");
            anyhow::bail!("Odds API error {status}: {body}");
        }

        let events: Vec<EventOdds> = response
            .json()
            .await
            .with_context(|| format!("Failed to parse odds payload for {sport_key}"))?;

        info!(sport = sport_key, events = events.len(), "Odds fetched");
        Ok(events)
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
