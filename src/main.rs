//! EDGESCOUT — Sports Betting Odds Scanner & Decision Engine
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires the providers into the scan pipeline, and runs either a
//! one-off scan or the long-running serve loop with graceful shutdown.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use edgescout::config::AppConfig;
use edgescout::dashboard;
use edgescout::dashboard::routes::DashboardState;
use edgescout::engine::decision::DecisionSynthesizer;
use edgescout::engine::scanner::{DecisionObserver, SportScanner};
use edgescout::llm::openrouter::OpenRouterClient;
use edgescout::providers::espn::EspnClient;
use edgescout::providers::kalshi::KalshiClient;
use edgescout::providers::odds_api::TheOddsApiClient;
use edgescout::providers::{ResearchProvider, TradingPlatform};
use edgescout::types::BetDecision;

const BANNER: &str = r#"
 _____ ____   ____ _____ ____   ____ ___  _   _ _____
| ____|  _ \ / ___| ____/ ___| / ___/ _ \| | | |_   _|
|  _| | | | | |  _|  _| \___ \| |  | | | | | | | | |
| |___| |_| | |_| | |___ ___) | |__| |_| | |_| | | |
|_____|____/ \____|_____|____/ \____\___/ \___/  |_|

  Sports Betting Odds Scanner & Decision Engine
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load("config.toml")?;
    init_logging();

    println!("{BANNER}");

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("serve");

    match command {
        "scan" => {
            let sport = args
                .get(2)
                .context("Usage: edgescout scan <sport_key> [max_events]")?;
            let max_events = args
                .get(3)
                .map(|s| s.parse::<usize>())
                .transpose()
                .context("max_events must be a number")?
                .unwrap_or(cfg.scanner.max_events);
            run_scan(&cfg, sport, max_events).await
        }
        "sports" => list_sports(&cfg).await,
        "portfolio" => show_portfolio(&cfg).await,
        "serve" => serve(&cfg).await,
        other => {
            anyhow::bail!("Unknown command: {other}. Commands: scan, sports, portfolio, serve")
        }
    }
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Build the scan pipeline from config: odds provider, optional
/// research provider, and the synthesizer for the configured mode.
fn build_scanner(cfg: &AppConfig) -> Result<Arc<SportScanner>> {
    let odds_key = AppConfig::resolve_env(&cfg.odds.api_key_env)?;
    let odds = Arc::new(TheOddsApiClient::new(
        odds_key,
        cfg.odds.regions.clone(),
        cfg.odds.markets.clone(),
    )?);

    let research: Option<Arc<dyn ResearchProvider>> = if cfg.research.enabled {
        Some(Arc::new(EspnClient::new(cfg.research.cache_ttl_secs)?))
    } else {
        None
    };

    let synthesizer = match cfg.strategy.mode.as_str() {
        "model" => {
            let llm_key = AppConfig::resolve_env(&cfg.llm.api_key_env)?;
            let inference = Arc::new(OpenRouterClient::new(
                llm_key,
                Some(cfg.llm.model.clone()),
                Some(cfg.llm.max_tokens),
            )?);

            let trading: Option<Arc<dyn TradingPlatform>> = match (cfg.trading.enabled, &cfg.trading.api_key_env) {
                (true, Some(env)) => match AppConfig::resolve_env(env) {
                    Ok(key) => Some(Arc::new(KalshiClient::new(key)?)),
                    Err(e) => {
                        warn!(error = %e, "Trading key missing; prompting without portfolio context");
                        None
                    }
                },
                _ => None,
            };

            info!(model = %cfg.llm.model, "Using model-judged decisions");
            DecisionSynthesizer::with_model(cfg.strategy.clone(), inference, trading)
        }
        _ => {
            info!(
                min_edge = cfg.strategy.min_edge,
                "Using local heuristic decisions"
            );
            DecisionSynthesizer::heuristic(cfg.strategy.clone())
        }
    };

    Ok(Arc::new(SportScanner::new(
        odds,
        research,
        synthesizer,
        Duration::from_millis(cfg.scanner.event_delay_ms),
        cfg.strategy.min_confidence,
    )))
}

/// Observer that logs each decision as it is produced.
struct LogObserver;

impl DecisionObserver for LogObserver {
    fn on_decision(&self, decision: &BetDecision) {
        info!(decision = %decision, "Decision");
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// One-off scan of a single sport with a printed report.
async fn run_scan(cfg: &AppConfig, sport_key: &str, max_events: usize) -> Result<()> {
    let scanner = build_scanner(cfg)?;

    println!("🔍 Scanning {sport_key} for opportunities...");

    let decisions = scanner
        .scan_sport(sport_key, max_events, cfg.scanner.include_research, Some(&LogObserver))
        .await?;

    let recommendations = scanner.get_recommendations(&decisions, None);

    println!("\n📊 Scan Results:");
    println!("   Events Analyzed: {}", decisions.len());
    println!("   Recommendations: {}", recommendations.len());

    if recommendations.is_empty() {
        println!("\n   No recommended bets at this time.");
    } else {
        println!("\n🎯 Recommended Bets:");
        for (i, rec) in recommendations.iter().enumerate() {
            println!("\n   [{}] {}", i + 1, rec.event_name);
            println!(
                "       Bet: {} {}",
                rec.bet_type.map(|t| t.to_string()).unwrap_or_default(),
                rec.bet_side.map(|s| s.to_string()).unwrap_or_default(),
            );
            println!("       Confidence: {:.1}%", rec.confidence * 100.0);
            println!("       Expected Value: {:.2}%", rec.expected_value * 100.0);
            let reason: String = rec.reasoning.chars().take(120).collect();
            println!("       Reasoning: {reason}");
        }
    }

    Ok(())
}

/// List in-season sports available from the odds provider.
async fn list_sports(cfg: &AppConfig) -> Result<()> {
    let odds_key = AppConfig::resolve_env(&cfg.odds.api_key_env)?;
    let client =
        TheOddsApiClient::new(odds_key, cfg.odds.regions.clone(), cfg.odds.markets.clone())?;

    let sports = client.get_sports(false).await?;
    println!("In-season sports ({}):", sports.len());
    for sport in sports {
        println!("  {:32} {} ({})", sport.key, sport.title, sport.group);
    }
    Ok(())
}

/// Print the trading platform balance.
async fn show_portfolio(cfg: &AppConfig) -> Result<()> {
    let env = cfg
        .trading
        .api_key_env
        .as_deref()
        .context("trading.api_key_env is not configured")?;
    let client = KalshiClient::new(AppConfig::resolve_env(env)?)?;

    let balance = client.get_balance().await?;
    println!("💰 Portfolio: {balance}");
    Ok(())
}

/// Long-running mode: dashboard plus a periodic scan of every
/// configured sport. Ctrl+C requests a cooperative stop.
async fn serve(cfg: &AppConfig) -> Result<()> {
    let scanner = build_scanner(cfg)?;

    if cfg.dashboard.enabled {
        let state = Arc::new(DashboardState::new(scanner.clone(), cfg.scanner.sports.clone()));
        dashboard::spawn_dashboard(state, cfg.dashboard.port)?;
    }

    let mut interval = tokio::time::interval(Duration::from_secs(cfg.scanner.scan_interval_secs));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        sports = ?cfg.scanner.sports,
        interval_secs = cfg.scanner.scan_interval_secs,
        "Entering scan loop. Press Ctrl+C to stop."
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                for sport in &cfg.scanner.sports {
                    if scanner.stop_requested() {
                        break;
                    }
                    match scanner
                        .scan_sport(sport, cfg.scanner.max_events, cfg.scanner.include_research, Some(&LogObserver))
                        .await
                    {
                        Ok(decisions) => {
                            let recs = scanner.get_recommendations(&decisions, None);
                            info!(
                                sport = %sport,
                                decisions = decisions.len(),
                                recommendations = recs.len(),
                                "Scan cycle complete"
                            );
                        }
                        Err(e) => {
                            error!(sport = %sport, error = %e, "Scan failed — continuing with next sport");
                        }
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                scanner.request_stop();
                break;
            }
        }
    }

    info!("EDGESCOUT shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("edgescout=info"));

    let json_logging = std::env::var("EDGESCOUT_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
