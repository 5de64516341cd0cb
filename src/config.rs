//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API keys) are referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`. Thresholds and flags travel
//! in these structs — there is no process-wide mutable configuration.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

use crate::types::ScoutError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub scanner: ScannerConfig,
    pub strategy: StrategyConfig,
    pub odds: OddsConfig,
    pub research: ResearchConfig,
    pub llm: LlmConfig,
    pub trading: TradingConfig,
    pub dashboard: DashboardConfig,
}

/// Scan loop parameters.
#[derive(Debug, Deserialize, Clone)]
pub struct ScannerConfig {
    /// Sports scanned by the `serve` loop.
    pub sports: Vec<String>,
    pub max_events: usize,
    pub include_research: bool,
    /// Fixed delay between event analyses (external rate limits).
    pub event_delay_ms: u64,
    /// Interval between full scans in `serve` mode.
    pub scan_interval_secs: u64,
}

/// Decision thresholds and the analysis mode.
#[derive(Debug, Deserialize, Clone)]
pub struct StrategyConfig {
    /// "heuristic" or "model".
    pub mode: String,
    /// Minimum consensus-vs-best edge to place a bet.
    pub min_edge: f64,
    /// Minimum confidence for a decision to be recommended.
    pub min_confidence: f64,
    /// Floor applied by the confidence policy before clamping.
    pub confidence_floor: f64,
}

impl StrategyConfig {
    /// Reject configurations that can never produce a valid decision.
    /// Called once before the pipeline starts; nothing is validated
    /// mid-scan.
    pub fn validate(&self) -> Result<(), ScoutError> {
        if self.mode != "heuristic" && self.mode != "model" {
            return Err(ScoutError::Config(format!(
                "strategy.mode must be \"heuristic\" or \"model\", got {:?}",
                self.mode
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ScoutError::Config(format!(
                "strategy.min_confidence must be in [0, 1], got {}",
                self.min_confidence
            )));
        }
        if self.min_edge < 0.0 {
            return Err(ScoutError::Config(format!(
                "strategy.min_edge must be non-negative, got {}",
                self.min_edge
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OddsConfig {
    pub api_key_env: String,
    pub regions: String,
    pub markets: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResearchConfig {
    pub enabled: bool,
    /// Validity window for cached matchup research.
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub model: String,
    pub api_key_env: String,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TradingConfig {
    pub enabled: bool,
    pub api_key_env: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config.strategy.validate()?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> AppConfig {
        toml::from_str(toml_str).unwrap()
    }

    const VALID: &str = r#"
        [scanner]
        sports = ["americanfootball_nfl", "basketball_nba"]
        max_events = 10
        include_research = true
        event_delay_ms = 500
        scan_interval_secs = 600

        [strategy]
        mode = "heuristic"
        min_edge = 0.03
        min_confidence = 0.6
        confidence_floor = 0.5

        [odds]
        api_key_env = "ODDS_API_KEY"
        regions = "us"
        markets = "h2h,spreads,totals"

        [research]
        enabled = true
        cache_ttl_secs = 300

        [llm]
        model = "openai/gpt-4o-mini"
        api_key_env = "OPENROUTER_API_KEY"
        max_tokens = 1024

        [trading]
        enabled = false

        [dashboard]
        enabled = true
        port = 5000
    "#;

    #[test]
    fn test_parse_valid_config() {
        let cfg = parse(VALID);
        assert_eq!(cfg.scanner.sports.len(), 2);
        assert_eq!(cfg.scanner.max_events, 10);
        assert_eq!(cfg.strategy.mode, "heuristic");
        assert!((cfg.strategy.min_edge - 0.03).abs() < 1e-10);
        assert!(cfg.trading.api_key_env.is_none());
        assert!(cfg.strategy.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_mode() {
        let mut cfg = parse(VALID);
        cfg.strategy.mode = "vibes".to_string();
        assert!(cfg.strategy.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_confidence() {
        let mut cfg = parse(VALID);
        cfg.strategy.min_confidence = 1.5;
        assert!(cfg.strategy.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_edge() {
        let mut cfg = parse(VALID);
        cfg.strategy.min_edge = -0.01;
        assert!(cfg.strategy.validate().is_err());
    }

    #[test]
    fn test_load_config_file() {
        // This test requires config.toml to be in the working directory.
        let result = AppConfig::load("config.toml");
        if let Ok(cfg) = result {
            assert!(!cfg.scanner.sports.is_empty());
            assert!(cfg.strategy.min_edge > 0.0);
            assert!(cfg.strategy.min_confidence > 0.0);
        }
        // If config.toml isn't found, that's acceptable in some test environments
    }
}
