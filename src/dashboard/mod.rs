//! Dashboard — Axum web server for monitoring scan results.
//!
//! Serves a read-only REST API and a self-contained HTML page.
//! Presentation only: no decision logic lives here. CORS enabled for
//! local development.

pub mod routes;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue, Method},
    response::Html,
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use routes::AppState;

/// The embedded dashboard HTML (compiled into the binary).
const DASHBOARD_HTML: &str = include_str!("templates/index.html");

/// Start the dashboard web server.
///
/// This spawns a background task — it doesn't block.
pub fn spawn_dashboard(state: AppState, port: u16) -> Result<()> {
    let app = build_router(state);

    tokio::spawn(async move {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        info!(port, "Dashboard server starting on http://localhost:{port}");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("Failed to bind dashboard port");

        axum::serve(listener, app)
            .await
            .expect("Dashboard server error");
    });

    Ok(())
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin("*".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        // API routes
        .route("/api/status", get(routes::get_status))
        .route("/api/decisions", get(routes::get_decisions))
        .route("/api/recommendations", get(routes::get_recommendations))
        .route("/health", get(routes::health))
        // Dashboard HTML
        .route("/", get(serve_dashboard))
        .layer(cors)
        .with_state(state)
}

/// Serve the embedded HTML dashboard.
async fn serve_dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategyConfig;
    use crate::engine::decision::DecisionSynthesizer;
    use crate::engine::scanner::SportScanner;
    use crate::providers::OddsProvider;
    use crate::types::EventOdds;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use routes::DashboardState;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    struct NoOdds;

    #[async_trait::async_trait]
    impl OddsProvider for NoOdds {
        async fn fetch_odds(&self, _sport_key: &str) -> anyhow::Result<Vec<EventOdds>> {
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "none"
        }
    }

    fn test_state() -> AppState {
        let strategy = StrategyConfig {
            mode: "heuristic".to_string(),
            min_edge: 0.03,
            min_confidence: 0.6,
            confidence_floor: 0.5,
        };
        let scanner = Arc::new(SportScanner::new(
            Arc::new(NoOdds),
            None,
            DecisionSynthesizer::heuristic(strategy),
            Duration::from_millis(0),
            0.6,
        ));
        Arc::new(DashboardState::new(scanner, vec!["basketball_nba".to_string()]))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(Request::builder().uri("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "running");
        assert_eq!(body["decisions_logged"], 0);
        assert_eq!(body["sports"][0], "basketball_nba");
    }

    #[tokio::test]
    async fn test_decisions_endpoint_empty() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(Request::builder().uri("/api/decisions").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn test_dashboard_html_served() {
        let app = build_router(test_state());
        let resp = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
