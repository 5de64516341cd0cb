//! Decision synthesis.
//!
//! Combines the odds summary, optional research text, and (in the
//! model-judged mode) an external model's judgment into one immutable
//! [`BetDecision`]. This component never raises: every collaborator
//! failure or schema violation becomes a `skip` decision carrying the
//! failure message in `reasoning`.

use anyhow::Result;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::StrategyConfig;
use crate::engine::edge::{self, BreadthWeightedConfidence, ConfidencePolicy};
use crate::engine::summarizer;
use crate::llm::InferenceProvider;
use crate::providers::TradingPlatform;
use crate::types::{
    AccountBalance, BetDecision, BetSide, BetType, EventOdds, OddsSummary, ScoutError, Verdict,
};

/// `model_used` tag for decisions produced without external inference.
pub const HEURISTIC_MODEL: &str = "local-heuristic";

/// Research text kept on the decision record is truncated to this many
/// characters.
const RESEARCH_SNAPSHOT_CHARS: usize = 500;

/// System prompt for the model-judged path.
const SYSTEM_PROMPT: &str = "You are a sports betting analyst. Analyze the data and respond \
     with a JSON betting decision. Be concise. Only recommend bets with clear edge.";

// ---------------------------------------------------------------------------
// Model verdict schema
// ---------------------------------------------------------------------------

/// The fixed JSON schema the external model must return.
///
/// `decision` is required; everything else defaults. A `place_bet`
/// verdict without a market and side is a schema violation.
#[derive(Debug, Deserialize)]
pub struct ModelVerdict {
    pub decision: Verdict,
    #[serde(default)]
    pub bet_type: Option<BetType>,
    #[serde(default)]
    pub bet_side: Option<BetSide>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub expected_value: f64,
    #[serde(default)]
    pub win_probability: f64,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub key_insights: Vec<String>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
}

impl ModelVerdict {
    /// Parse and validate a raw JSON object against the schema.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ScoutError> {
        let verdict: ModelVerdict = serde_json::from_value(value)
            .map_err(|e| ScoutError::Schema(e.to_string()))?;

        if verdict.decision == Verdict::PlaceBet
            && (verdict.bet_type.is_none() || verdict.bet_side.is_none())
        {
            return Err(ScoutError::Schema(
                "place_bet verdict missing bet_type or bet_side".to_string(),
            ));
        }

        Ok(verdict)
    }
}

// ---------------------------------------------------------------------------
// Synthesizer
// ---------------------------------------------------------------------------

/// Builds one decision per event from the summarized odds.
///
/// Construct with [`DecisionSynthesizer::heuristic`] for the local
/// scoring rule, or [`DecisionSynthesizer::with_model`] to delegate
/// judgment to an inference provider.
pub struct DecisionSynthesizer {
    strategy: StrategyConfig,
    policy: Box<dyn ConfidencePolicy>,
    inference: Option<Arc<dyn InferenceProvider>>,
    trading: Option<Arc<dyn TradingPlatform>>,
}

impl DecisionSynthesizer {
    /// Heuristic-only synthesizer (no external inference).
    pub fn heuristic(strategy: StrategyConfig) -> Self {
        let policy = BreadthWeightedConfidence { floor: strategy.confidence_floor };
        Self {
            strategy,
            policy: Box::new(policy),
            inference: None,
            trading: None,
        }
    }

    /// Model-judged synthesizer. The trading platform, when present,
    /// only contributes balance context to the prompt.
    pub fn with_model(
        strategy: StrategyConfig,
        inference: Arc<dyn InferenceProvider>,
        trading: Option<Arc<dyn TradingPlatform>>,
    ) -> Self {
        let policy = BreadthWeightedConfidence { floor: strategy.confidence_floor };
        Self {
            strategy,
            policy: Box::new(policy),
            inference: Some(inference),
            trading,
        }
    }

    /// Swap the confidence scoring policy (calibration hook).
    pub fn with_policy(mut self, policy: Box<dyn ConfidencePolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Tag recorded on decisions this synthesizer produces.
    pub fn model_tag(&self) -> &str {
        match &self.inference {
            Some(model) => model.model_name(),
            None => HEURISTIC_MODEL,
        }
    }

    /// Analyze one event and produce its decision. Infallible by
    /// contract: collaborator failures surface as `skip` decisions.
    pub async fn synthesize(
        &self,
        event: &EventOdds,
        sport_key: &str,
        research: Option<String>,
    ) -> BetDecision {
        let summary = summarizer::summarize(event);

        let decision = match &self.inference {
            Some(model) => {
                self.synthesize_with_model(event, sport_key, &summary, research, model.as_ref())
                    .await
            }
            None => self.synthesize_heuristic(event, sport_key, &summary, research),
        };

        info!(
            event_id = %decision.event_id,
            verdict = %decision.verdict,
            confidence = format!("{:.2}", decision.confidence),
            expected_value = format!("{:.4}", decision.expected_value),
            model = %decision.model_used,
            "Decision synthesized"
        );

        decision
    }

    // -- Heuristic branch -------------------------------------------------

    fn synthesize_heuristic(
        &self,
        event: &EventOdds,
        sport_key: &str,
        summary: &OddsSummary,
        research: Option<String>,
    ) -> BetDecision {
        if summary.bookmaker_count == 0 {
            return self.build(
                event,
                sport_key,
                summary,
                Verdict::Skip,
                None,
                None,
                0.0,
                0.0,
                0.0,
                "No bookmaker odds available for this event.".to_string(),
                Vec::new(),
                Vec::new(),
                research,
                HEURISTIC_MODEL,
            );
        }

        let eval = edge::evaluate(summary);

        if eval.edge >= self.strategy.min_edge {
            let confidence = self.policy.score(eval.edge, summary.bookmaker_count);
            let (consensus, best) = match eval.side {
                BetSide::Home => (summary.moneyline.home_consensus, summary.moneyline.home_best),
                _ => (summary.moneyline.away_consensus, summary.moneyline.away_best),
            };
            let reasoning = format!(
                "Best {} price {} is soft versus consensus {}: implied probability gap \
                 {:.4} clears the {:.3} minimum.",
                eval.side, best, consensus, eval.edge, self.strategy.min_edge,
            );
            let key_insights = vec![
                format!("{} bookmakers quoting the moneyline", summary.bookmaker_count),
                format!("best {} price {} vs consensus {}", eval.side, best, consensus),
            ];
            let risk_factors = vec![
                "Heuristic evaluates the moneyline only; spread and total are not scored"
                    .to_string(),
            ];
            return self.build(
                event,
                sport_key,
                summary,
                Verdict::PlaceBet,
                Some(BetType::Moneyline),
                Some(eval.side),
                confidence,
                eval.edge,
                eval.win_probability,
                reasoning,
                key_insights,
                risk_factors,
                research,
                HEURISTIC_MODEL,
            );
        }

        debug!(
            event_id = %event.id,
            edge = format!("{:.4}", eval.edge),
            min_edge = self.strategy.min_edge,
            "Edge below threshold"
        );

        let reasoning = format!(
            "Best edge {:.4} on the {} side is below the {:.3} minimum; skipping.",
            eval.edge, eval.side, self.strategy.min_edge,
        );
        self.build(
            event,
            sport_key,
            summary,
            Verdict::Skip,
            None,
            None,
            0.0,
            eval.edge,
            eval.win_probability,
            reasoning,
            Vec::new(),
            Vec::new(),
            research,
            HEURISTIC_MODEL,
        )
    }

    // -- Model-judged branch ----------------------------------------------

    async fn synthesize_with_model(
        &self,
        event: &EventOdds,
        sport_key: &str,
        summary: &OddsSummary,
        research: Option<String>,
        model: &dyn InferenceProvider,
    ) -> BetDecision {
        let portfolio = match &self.trading {
            Some(platform) => match platform.get_balance().await {
                Ok(balance) => Some(balance),
                Err(e) => {
                    warn!(error = %e, "Balance fetch failed; prompting without portfolio context");
                    None
                }
            },
            None => None,
        };

        let prompt = Self::build_prompt(summary, research.as_deref(), portfolio, &self.strategy);

        let verdict = match model.complete_json(SYSTEM_PROMPT, &prompt).await {
            Ok(value) => ModelVerdict::from_value(value),
            Err(e) => Err(ScoutError::Inference {
                model: model.model_name().to_string(),
                message: e.to_string(),
            }),
        };

        match verdict {
            Ok(v) => self.build(
                event,
                sport_key,
                summary,
                v.decision,
                v.bet_type,
                v.bet_side,
                v.confidence.clamp(0.0, 1.0),
                v.expected_value,
                v.win_probability.clamp(0.0, 1.0),
                v.reasoning,
                v.key_insights,
                v.risk_factors,
                research,
                model.model_name(),
            ),
            Err(e) => {
                warn!(event_id = %event.id, error = %e, "Model judgment failed; skipping event");
                self.build(
                    event,
                    sport_key,
                    summary,
                    Verdict::Skip,
                    None,
                    None,
                    0.0,
                    0.0,
                    0.0,
                    e.to_string(),
                    Vec::new(),
                    Vec::new(),
                    research,
                    model.model_name(),
                )
            }
        }
    }

    /// Build the compact model prompt. All prices are American-odds
    /// integers; edge/confidence bounds are stated as decimals.
    fn build_prompt(
        summary: &OddsSummary,
        research: Option<&str>,
        portfolio: Option<AccountBalance>,
        strategy: &StrategyConfig,
    ) -> String {
        let mut prompt = String::with_capacity(1024);

        prompt.push_str("Analyze this betting opportunity:\n\nODDS:\n");
        prompt.push_str(&format!(
            "- Moneyline: {} {}, {} {}\n",
            summary.home_team,
            summary.moneyline.home_consensus,
            summary.away_team,
            summary.moneyline.away_consensus,
        ));
        prompt.push_str(&format!(
            "- Best prices: {} {}, {} {}\n",
            summary.home_team,
            summary.moneyline.home_best,
            summary.away_team,
            summary.moneyline.away_best,
        ));
        prompt.push_str(&format!(
            "- Spread: {} {} ({}), {} {} ({})\n",
            summary.home_team,
            summary.spread.home_line,
            summary.spread.home_odds,
            summary.away_team,
            summary.spread.away_line,
            summary.spread.away_odds,
        ));
        prompt.push_str(&format!(
            "- Total: {} (O {} / U {})\n",
            summary.total.line, summary.total.over_odds, summary.total.under_odds,
        ));
        prompt.push_str(&format!("- Sources: {} bookmakers\n\n", summary.bookmaker_count));

        prompt.push_str(research.unwrap_or("No additional research available."));
        prompt.push('\n');

        if let Some(balance) = portfolio {
            prompt.push_str(&format!(
                "\nPORTFOLIO: ${:.2} available of ${:.2} total\n",
                balance.available, balance.total_value,
            ));
        }

        prompt.push_str(&format!(
            "\nRespond in JSON:\n{{\n\
             \x20 \"decision\": \"place_bet\" or \"skip\",\n\
             \x20 \"bet_type\": \"moneyline\", \"spread\", or \"total\" (if betting),\n\
             \x20 \"bet_side\": \"home\", \"away\", \"over\", or \"under\" (if betting),\n\
             \x20 \"confidence\": 0.0-1.0,\n\
             \x20 \"expected_value\": percentage as decimal (e.g., 0.05 for 5%),\n\
             \x20 \"win_probability\": 0.0-1.0,\n\
             \x20 \"reasoning\": \"brief explanation\",\n\
             \x20 \"key_insights\": [\"insight1\", \"insight2\"],\n\
             \x20 \"risk_factors\": [\"risk1\", \"risk2\"]\n\
             }}\n\n\
             Only recommend bets with confidence >{} and expected_value >{}.",
            strategy.min_confidence, strategy.min_edge,
        ));

        prompt
    }

    // -- Record construction ----------------------------------------------

    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        event: &EventOdds,
        sport_key: &str,
        summary: &OddsSummary,
        verdict: Verdict,
        bet_type: Option<BetType>,
        bet_side: Option<BetSide>,
        confidence: f64,
        expected_value: f64,
        win_probability: f64,
        mut reasoning: String,
        key_insights: Vec<String>,
        risk_factors: Vec<String>,
        research: Option<String>,
        model_used: &str,
    ) -> BetDecision {
        // Research is advisory context for review; in the heuristic
        // path it annotates reasoning without touching the numbers.
        if model_used == HEURISTIC_MODEL {
            if let Some(text) = &research {
                reasoning.push_str("\n\nResearch notes (advisory, not scored): ");
                reasoning.push_str(&truncate(text, RESEARCH_SNAPSHOT_CHARS));
            }
        }

        BetDecision {
            decision_id: Uuid::new_v4().to_string(),
            event_id: event.id.clone(),
            event_name: event.event_name(),
            sport: sport_key.to_string(),
            home_team: event.home_team.clone(),
            away_team: event.away_team.clone(),
            commence_time: event.commence_time,
            verdict,
            bet_type,
            bet_side,
            confidence,
            expected_value,
            win_probability,
            reasoning,
            key_insights,
            risk_factors,
            odds_snapshot: summary.clone(),
            research_summary: research.map(|r| truncate(&r, RESEARCH_SNAPSHOT_CHARS)),
            created_at: Utc::now(),
            model_used: model_used.to_string(),
        }
    }
}

/// Truncate on a character boundary.
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
