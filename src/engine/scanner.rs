//! Scan orchestration.
//!
//! Iterates the upcoming events of one sport, runs the decision
//! synthesizer per event, delivers each decision to an optional
//! observer, and collects everything into an append-only log. A single
//! event's failure never aborts the remainder of a scan; the only
//! fatal class is misconfiguration, rejected before the loop starts.
//!
//! Scans are strictly sequential: a fixed inter-event delay respects
//! the odds/research providers' rate limits, and a cooperative stop
//! flag is checked between events (never mid-call).

use anyhow::{Context, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::engine::decision::DecisionSynthesizer;
use crate::engine::research;
use crate::providers::{OddsProvider, ResearchProvider};
use crate::types::{BetDecision, EventOdds, ScoutError};

/// How many decisions the in-memory log retains.
const DECISION_LOG_CAP: usize = 100;

// ---------------------------------------------------------------------------
// Observer
// ---------------------------------------------------------------------------

/// Real-time decision delivery, invoked synchronously once per event.
///
/// Implementations run inside the scan loop; the scanner contains any
/// panic they raise, so a broken observer cannot abort a scan.
pub trait DecisionObserver: Send + Sync {
    fn on_decision(&self, decision: &BetDecision);
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// Per-sport scan orchestrator owning the sequential analysis loop.
pub struct SportScanner {
    odds: Arc<dyn OddsProvider>,
    research: Option<Arc<dyn ResearchProvider>>,
    synthesizer: DecisionSynthesizer,
    event_delay: Duration,
    min_confidence: f64,
    decision_log: Mutex<Vec<BetDecision>>,
    stop: AtomicBool,
}

impl SportScanner {
    pub fn new(
        odds: Arc<dyn OddsProvider>,
        research: Option<Arc<dyn ResearchProvider>>,
        synthesizer: DecisionSynthesizer,
        event_delay: Duration,
        min_confidence: f64,
    ) -> Self {
        Self {
            odds,
            research,
            synthesizer,
            event_delay,
            min_confidence,
            decision_log: Mutex::new(Vec::new()),
            stop: AtomicBool::new(false),
        }
    }

    /// Scan one sport and return every per-event decision, skips
    /// included. Fewer events than `max_events` may be analyzed when
    /// the provider returns fewer, or when a stop is requested.
    pub async fn scan_sport(
        &self,
        sport_key: &str,
        max_events: usize,
        include_research: bool,
        observer: Option<&dyn DecisionObserver>,
    ) -> Result<Vec<BetDecision>> {
        if sport_key.trim().is_empty() {
            return Err(ScoutError::Config("sport key must not be empty".to_string()).into());
        }

        info!(sport = sport_key, max_events, include_research, "Starting sport scan");

        let events = self
            .odds
            .fetch_odds(sport_key)
            .await
            .with_context(|| format!("Odds fetch failed for {sport_key}"))?;

        info!(sport = sport_key, events = events.len(), "Events fetched");

        let selected: Vec<&EventOdds> = events.iter().take(max_events).collect();
        let total = selected.len();
        let mut decisions = Vec::with_capacity(total);

        for (idx, event) in selected.into_iter().enumerate() {
            if self.stop.load(Ordering::SeqCst) {
                warn!(
                    sport = sport_key,
                    analyzed = decisions.len(),
                    "Stop requested; ending scan early"
                );
                break;
            }

            info!(sport = sport_key, event = %event, "Analyzing event {}/{total}", idx + 1);

            let decision = self.analyze_event(event, sport_key, include_research).await;

            self.record(decision.clone());
            self.notify(observer, &decision);
            decisions.push(decision);

            // Fixed-interval rate limiter between events; nothing to
            // wait for after the last one.
            if idx + 1 < total {
                tokio::time::sleep(self.event_delay).await;
            }
        }

        info!(sport = sport_key, decisions = decisions.len(), "Sport scan complete");

        Ok(decisions)
    }

    /// Analyze a single event. Research failures degrade to the
    /// odds-only sentinel text; the synthesizer converts its own
    /// collaborator failures to `skip` decisions, so this never errors.
    pub async fn analyze_event(
        &self,
        event: &EventOdds,
        sport_key: &str,
        include_research: bool,
    ) -> BetDecision {
        let research_text = if include_research {
            match &self.research {
                Some(provider) => {
                    match provider
                        .matchup_context(sport_key, &event.home_team, &event.away_team)
                        .await
                    {
                        Ok(text) => Some(text),
                        Err(e) => {
                            warn!(
                                event_id = %event.id,
                                error = %e,
                                "Research fetch failed; analyzing on odds only"
                            );
                            Some(research::unavailable(&event.home_team, &event.away_team))
                        }
                    }
                }
                None => None,
            }
        } else {
            None
        };

        self.synthesizer.synthesize(event, sport_key, research_text).await
    }

    /// Pure filter: actionable decisions only. Never mutates or
    /// reorders the input; `min_confidence` falls back to the
    /// scanner's configured threshold.
    pub fn get_recommendations(
        &self,
        decisions: &[BetDecision],
        min_confidence: Option<f64>,
    ) -> Vec<BetDecision> {
        let threshold = min_confidence.unwrap_or(self.min_confidence);
        decisions
            .iter()
            .filter(|d| d.is_actionable(threshold))
            .cloned()
            .collect()
    }

    /// Most recent decisions, oldest first, up to `limit`.
    pub fn recent_decisions(&self, limit: usize) -> Vec<BetDecision> {
        let log = self.decision_log.lock().unwrap_or_else(|e| e.into_inner());
        let skip = log.len().saturating_sub(limit);
        log[skip..].to_vec()
    }

    /// Request a cooperative stop; takes effect between events.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Clear a previously requested stop (before starting a new scan).
    pub fn clear_stop(&self) {
        self.stop.store(false, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    // -- Internals ---------------------------------------------------------

    /// Append to the shared decision log, trimming to the cap. The
    /// read-modify-write runs under the single log lock.
    fn record(&self, decision: BetDecision) {
        let mut log = self.decision_log.lock().unwrap_or_else(|e| e.into_inner());
        log.push(decision);
        if log.len() > DECISION_LOG_CAP {
            let overflow = log.len() - DECISION_LOG_CAP;
            log.drain(..overflow);
        }
    }

    /// Deliver a decision to the observer, containing any panic.
    fn notify(&self, observer: Option<&dyn DecisionObserver>, decision: &BetDecision) {
        if let Some(observer) = observer {
            let result = catch_unwind(AssertUnwindSafe(|| observer.on_decision(decision)));
            if result.is_err() {
                error!(
                    event_id = %decision.event_id,
                    "Decision observer panicked; continuing scan"
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
