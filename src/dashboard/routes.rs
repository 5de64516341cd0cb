//! Dashboard API route handlers.
//!
//! All endpoints are read-only JSON views over the scanner's decision
//! log. State is shared via `Arc<DashboardState>`.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::engine::scanner::SportScanner;
use crate::types::BetDecision;

/// Decisions returned by the feed endpoint.
const FEED_LIMIT: usize = 50;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub scanner: Arc<SportScanner>,
    pub sports: Vec<String>,
    pub started_at: DateTime<Utc>,
}

impl DashboardState {
    pub fn new(scanner: Arc<SportScanner>, sports: Vec<String>) -> Self {
        Self { scanner, sports, started_at: Utc::now() }
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub sports: Vec<String>,
    pub decisions_logged: usize,
    pub recommendations: usize,
    pub uptime_secs: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecisionFeed {
    pub count: usize,
    pub decisions: Vec<BetDecision>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let decisions = state.scanner.recent_decisions(usize::MAX);
    let recommendations = state.scanner.get_recommendations(&decisions, None).len();

    let status = if state.scanner.stop_requested() { "stopping" } else { "running" };

    Json(StatusResponse {
        status: status.to_string(),
        sports: state.sports.clone(),
        decisions_logged: decisions.len(),
        recommendations,
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}

/// GET /api/decisions — most recent decisions, skips included.
pub async fn get_decisions(State(state): State<AppState>) -> Json<DecisionFeed> {
    let decisions = state.scanner.recent_decisions(FEED_LIMIT);
    Json(DecisionFeed { count: decisions.len(), decisions })
}

/// GET /api/recommendations — actionable decisions only.
pub async fn get_recommendations(State(state): State<AppState>) -> Json<DecisionFeed> {
    let decisions = state.scanner.recent_decisions(usize::MAX);
    let recommendations = state.scanner.get_recommendations(&decisions, None);
    Json(DecisionFeed { count: recommendations.len(), decisions: recommendations })
}
