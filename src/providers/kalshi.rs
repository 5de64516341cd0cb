//! Kalshi portfolio integration.
//!
//! Read-only: the pipeline consumes the account balance as prompt
//! context for the model-judged path. Order placement and the
//! request-signing protocol are deliberately out of scope.
//!
//! API: `https://api.elections.kalshi.com/trade-api/v2`
//! Amounts are integer cents on the wire; converted to dollars here.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use super::TradingPlatform;
use crate::types::AccountBalance;

const BASE_URL: &str = "https://api.elections.kalshi.com/trade-api/v2";
const PLATFORM_NAME: &str = "kalshi";

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    /// Available balance in cents.
    #[serde(default)]
    balance: i64,
    /// Total portfolio value in cents (balance + positions).
    #[serde(default)]
    portfolio_value: i64,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct KalshiClient {
    http: Client,
    api_key: SecretString,
}

impl KalshiClient {
    pub fn new(api_key: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent("EDGESCOUT/0.1.0")
            .build()
            .context("Failed to build Kalshi HTTP client")?;

        Ok(Self { http, api_key: SecretString::new(api_key) })
    }

    fn dollars(cents: i64) -> f64 {
        cents as f64 / 100.0
    }
}

#[async_trait]
impl TradingPlatform for KalshiClient {
    async fn get_balance(&self) -> Result<AccountBalance> {
        let response = self
            .http
            .get(format!("{BASE_URL}/portfolio/balance"))
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .context("Kalshi balance request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Kalshi API error {status}: {body}");
        }

        let body: BalanceResponse =
            response.json().await.context("Failed to parse Kalshi balance")?;

        let balance = AccountBalance {
            available: Self::dollars(body.balance),
            total_value: Self::dollars(body.portfolio_value),
        };
        debug!(%balance, "Kalshi balance fetched");
        Ok(balance)
    }

    fn name(&self) -> &str {
        PLATFORM_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
