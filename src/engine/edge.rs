//! Edge evaluation.
//!
//! Converts American-odds prices to implied probabilities and computes
//! the consensus-vs-best edge per side of the moneyline. A positive
//! edge means the best available price implies a lower probability
//! than the cross-bookmaker consensus — some bookmaker is offering a
//! price soft relative to the market, the classic value-betting signal.

use tracing::debug;

use crate::types::{BetSide, OddsSummary};

// ---------------------------------------------------------------------------
// Probability conversion
// ---------------------------------------------------------------------------

/// Break-even win probability implied by an American-odds price,
/// ignoring vig.
///
/// Odds of exactly 0 are the "no quote" sentinel and map to 0.0, which
/// is not a valid probability — callers must treat it as missing data.
pub fn implied_probability(odds: i32) -> f64 {
    if odds > 0 {
        100.0 / (odds as f64 + 100.0)
    } else if odds < 0 {
        let stake = -(odds as f64);
        stake / (stake + 100.0)
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Per-side edge
// ---------------------------------------------------------------------------

/// Consensus-vs-best evaluation for one side of the moneyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideEdge {
    /// `implied_prob(consensus) − implied_prob(best)`; 0.0 when either
    /// price is the no-quote sentinel.
    pub edge: f64,
    /// Implied probability of the best price; 0.0 sentinel when absent.
    pub implied_best: f64,
}

impl SideEdge {
    /// The abstain value used when a side has no usable quotes.
    pub const ABSTAIN: SideEdge = SideEdge { edge: 0.0, implied_best: 0.0 };
}

/// Evaluate one side from its consensus and best prices.
pub fn side_edge(consensus: i32, best: i32) -> SideEdge {
    if consensus == 0 || best == 0 {
        return SideEdge::ABSTAIN;
    }
    let implied_best = implied_probability(best);
    SideEdge {
        edge: implied_probability(consensus) - implied_best,
        implied_best,
    }
}

// ---------------------------------------------------------------------------
// Side selection
// ---------------------------------------------------------------------------

/// Result of evaluating both moneyline sides of an odds summary.
#[derive(Debug, Clone, Copy)]
pub struct EdgeEvaluation {
    /// Selected side: the strictly greater edge wins; home wins ties.
    pub side: BetSide,
    /// Edge of the selected side.
    pub edge: f64,
    /// `1 − implied_prob(best price of selected side)`, clamped to
    /// [0, 1]; 0.0 when the side had no quote (abstain, not certainty).
    pub win_probability: f64,
    pub home: SideEdge,
    pub away: SideEdge,
}

/// Evaluate both sides of the moneyline and pick the better one.
pub fn evaluate(summary: &OddsSummary) -> EdgeEvaluation {
    let home = side_edge(summary.moneyline.home_consensus, summary.moneyline.home_best);
    let away = side_edge(summary.moneyline.away_consensus, summary.moneyline.away_best);

    // Iteration order is home then away, so away must be strictly
    // greater to win — home takes ties.
    let (side, chosen) = if away.edge > home.edge {
        (BetSide::Away, away)
    } else {
        (BetSide::Home, home)
    };

    let win_probability = if chosen.implied_best == 0.0 {
        0.0
    } else {
        (1.0 - chosen.implied_best).clamp(0.0, 1.0)
    };

    debug!(
        side = %side,
        edge = format!("{:.4}", chosen.edge),
        win_probability = format!("{:.4}", win_probability),
        "Edge evaluated"
    );

    EdgeEvaluation { side, edge: chosen.edge, win_probability, home, away }
}

// ---------------------------------------------------------------------------
// Confidence policy
// ---------------------------------------------------------------------------

/// Swappable scoring curve mapping an edge and quoting breadth to a
/// confidence in [0, 1]. Kept behind a trait so calibration changes
/// never touch the pipeline shape.
pub trait ConfidencePolicy: Send + Sync {
    fn score(&self, edge: f64, bookmaker_count: usize) -> f64;
}

/// Default policy: confidence scales with the edge magnitude and with
/// how many bookmakers quote the event (broader agreement, more trust),
/// floored and clamped to [0, 1].
#[derive(Debug, Clone, Copy)]
pub struct BreadthWeightedConfidence {
    pub floor: f64,
}

impl Default for BreadthWeightedConfidence {
    fn default() -> Self {
        Self { floor: 0.5 }
    }
}

impl ConfidencePolicy for BreadthWeightedConfidence {
    fn score(&self, edge: f64, bookmaker_count: usize) -> f64 {
        let raw = edge * 10.0 + bookmaker_count as f64 * 0.02;
        self.floor.max(raw).clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
