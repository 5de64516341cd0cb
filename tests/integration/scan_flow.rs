//! End-to-end scan scenarios over deterministic providers.

use anyhow::Result;
use async_trait::async_trait;
use mockall::mock;
use std::sync::atomic::Ordering;
use tokio_test::assert_ok;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use edgescout::config::StrategyConfig;
use edgescout::engine::decision::{DecisionSynthesizer, HEURISTIC_MODEL};
use edgescout::engine::scanner::{DecisionObserver, SportScanner};
use edgescout::providers::ResearchProvider;
use edgescout::types::{BetDecision, BetSide, BetType, MatchupSummary, Verdict};

use crate::mock_providers::{
    empty_event, ml_event, soft_books, MockOddsProvider, MockResearchProvider, ScriptedInference,
};

fn strategy() -> StrategyConfig {
    StrategyConfig {
        mode: "heuristic".to_string(),
        min_edge: 0.03,
        min_confidence: 0.6,
        confidence_floor: 0.5,
    }
}

fn heuristic_scanner(
    odds: Arc<MockOddsProvider>,
    research: Option<Arc<dyn ResearchProvider>>,
) -> SportScanner {
    SportScanner::new(
        odds,
        research,
        DecisionSynthesizer::heuristic(strategy()),
        Duration::from_millis(0),
        0.6,
    )
}

// ---------------------------------------------------------------------------
// Heuristic end-to-end scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn single_bookmaker_yields_skip() {
    // One book quoting -150 / +130: consensus == best ⇒ edge 0 ⇒ skip
    let odds = Arc::new(MockOddsProvider::new(vec![ml_event(
        "e1",
        "Chiefs",
        "Bills",
        &[(-150, 130)],
    )]));
    let scanner = heuristic_scanner(odds, None);

    let decisions = scanner.scan_sport("basketball_nba", 10, false, None).await.unwrap();
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].verdict, Verdict::Skip);
    assert_eq!(decisions[0].expected_value, 0.0);
    assert_eq!(decisions[0].model_used, HEURISTIC_MODEL);
}

#[tokio::test]
async fn two_books_below_threshold_yields_skip() {
    // -150 and -130: consensus -140, best -130, edge ≈ 0.0181 < 0.03
    let odds = Arc::new(MockOddsProvider::new(vec![ml_event(
        "e1",
        "Chiefs",
        "Bills",
        &[(-150, 120), (-130, 120)],
    )]));
    let scanner = heuristic_scanner(odds, None);

    let decisions = scanner.scan_sport("basketball_nba", 10, false, None).await.unwrap();
    assert_eq!(decisions[0].verdict, Verdict::Skip);
    assert!(decisions[0].expected_value > 0.0);
    assert!(decisions[0].expected_value < 0.03);
    assert!(decisions[0].reasoning.contains("below"));
}

#[tokio::test]
async fn soft_priced_event_yields_moneyline_bet() {
    let odds = Arc::new(MockOddsProvider::new(vec![ml_event(
        "e1",
        "Chiefs",
        "Bills",
        &soft_books(),
    )]));
    let scanner = heuristic_scanner(odds, None);

    let decisions = scanner.scan_sport("basketball_nba", 10, false, None).await.unwrap();
    let d = &decisions[0];
    assert_eq!(d.verdict, Verdict::PlaceBet);
    assert_eq!(d.bet_type, Some(BetType::Moneyline));
    assert_eq!(d.bet_side, Some(BetSide::Home));
    assert!(d.expected_value >= 0.03);
    assert!(d.win_probability > 0.0 && d.win_probability < 1.0);
    assert_eq!(d.odds_snapshot.bookmaker_count, 3);
}

#[tokio::test]
async fn mixed_scan_returns_decision_per_event() {
    let odds = Arc::new(MockOddsProvider::new(vec![
        ml_event("e1", "Chiefs", "Bills", &[(-150, 130)]),
        ml_event("e2", "Celtics", "Heat", &soft_books()),
        empty_event("e3", "Lakers", "Suns"),
        ml_event("e4", "Knicks", "Nets", &[(-150, 120), (-130, 120)]),
        ml_event("e5", "Bucks", "Bulls", &soft_books()),
    ]));
    let scanner = heuristic_scanner(odds, None);

    let decisions = assert_ok!(scanner.scan_sport("basketball_nba", 10, false, None).await);
    assert_eq!(decisions.len(), 5);

    let verdicts: Vec<Verdict> = decisions.iter().map(|d| d.verdict).collect();
    assert_eq!(
        verdicts,
        vec![Verdict::Skip, Verdict::PlaceBet, Verdict::Skip, Verdict::Skip, Verdict::PlaceBet]
    );

    // The zero-book event skipped for lack of data, not threshold
    assert!(decisions[2].reasoning.contains("No bookmaker odds"));
}

// ---------------------------------------------------------------------------
// Failure isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn research_failure_for_one_event_never_shortens_the_scan() {
    let odds = Arc::new(MockOddsProvider::new(vec![
        ml_event("e1", "Chiefs", "Bills", &soft_books()),
        ml_event("e2", "Celtics", "Heat", &soft_books()),
        ml_event("e3", "Lakers", "Suns", &soft_books()),
        ml_event("e4", "Knicks", "Nets", &soft_books()),
        ml_event("e5", "Bucks", "Bulls", &soft_books()),
    ]));
    let research = Arc::new(MockResearchProvider::failing_for(&["Lakers"]));
    let scanner = heuristic_scanner(odds, Some(research.clone()));

    let decisions = scanner.scan_sport("basketball_nba", 10, true, None).await.unwrap();
    assert_eq!(decisions.len(), 5);
    assert_eq!(research.call_count.load(Ordering::Relaxed), 5);

    // The failing event degraded to the odds-only sentinel, deterministically
    assert!(decisions[2]
        .research_summary
        .as_deref()
        .unwrap()
        .contains("Research unavailable"));
    // Other events carry real research
    assert!(decisions[0].research_summary.as_deref().unwrap().contains("MATCHUP"));
}

#[tokio::test]
async fn odds_provider_failure_is_a_scan_error() {
    let odds = Arc::new(MockOddsProvider::new(vec![]));
    odds.set_error("gateway timeout");
    let scanner = heuristic_scanner(odds, None);

    let err = scanner.scan_sport("basketball_nba", 10, false, None).await.unwrap_err();
    assert!(err.to_string().contains("basketball_nba"));

    let odds = Arc::new(MockOddsProvider::new(vec![]));
    let scanner = heuristic_scanner(odds.clone(), None);
    scanner.scan_sport("basketball_nba", 10, false, None).await.unwrap();
    assert_eq!(odds.fetch_count.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn throwing_observer_never_aborts_the_scan() {
    struct FlakyObserver {
        calls: Mutex<u32>,
    }

    impl DecisionObserver for FlakyObserver {
        fn on_decision(&self, _decision: &BetDecision) {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if *calls == 2 {
                panic!("observer exploded on the second decision");
            }
        }
    }

    let odds = Arc::new(MockOddsProvider::new(vec![
        ml_event("e1", "Chiefs", "Bills", &[(-150, 130)]),
        ml_event("e2", "Celtics", "Heat", &[(-150, 130)]),
        ml_event("e3", "Lakers", "Suns", &[(-150, 130)]),
    ]));
    let scanner = heuristic_scanner(odds, None);

    let observer = FlakyObserver { calls: Mutex::new(0) };
    let decisions = scanner
        .scan_sport("basketball_nba", 10, false, Some(&observer))
        .await
        .unwrap();

    assert_eq!(decisions.len(), 3);
    assert_eq!(*observer.calls.lock().unwrap(), 3);
}

// ---------------------------------------------------------------------------
// Recommendations filter
// ---------------------------------------------------------------------------

#[tokio::test]
async fn recommendations_never_include_nonpositive_ev_or_low_confidence() {
    let odds = Arc::new(MockOddsProvider::new(vec![
        ml_event("e1", "Chiefs", "Bills", &[(-150, 130)]),
        ml_event("e2", "Celtics", "Heat", &soft_books()),
        empty_event("e3", "Lakers", "Suns"),
    ]));
    let scanner = heuristic_scanner(odds, None);
    let decisions = scanner.scan_sport("basketball_nba", 10, false, None).await.unwrap();

    for threshold in [0.0, 0.3, 0.5, 0.6, 0.9] {
        let recs = scanner.get_recommendations(&decisions, Some(threshold));
        for rec in &recs {
            assert_eq!(rec.verdict, Verdict::PlaceBet);
            assert!(rec.expected_value > 0.0);
            assert!(rec.confidence >= threshold);
        }
    }

    // Filtering is pure: repeated application gives identical results
    let first = scanner.get_recommendations(&decisions, Some(0.5));
    let second = scanner.get_recommendations(&decisions, Some(0.5));
    assert_eq!(first.len(), second.len());
    assert_eq!(decisions.len(), 3);
}

// ---------------------------------------------------------------------------
// Model-judged path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn model_scan_mixes_verdicts_and_fallbacks() {
    let odds = Arc::new(MockOddsProvider::new(vec![
        ml_event("e1", "Chiefs", "Bills", &soft_books()),
        ml_event("e2", "Celtics", "Heat", &soft_books()),
        ml_event("e3", "Lakers", "Suns", &soft_books()),
    ]));

    let inference = Arc::new(ScriptedInference::new(vec![
        Ok(serde_json::json!({
            "decision": "place_bet",
            "bet_type": "moneyline",
            "bet_side": "home",
            "confidence": 0.71,
            "expected_value": 0.05,
            "win_probability": 0.6,
            "reasoning": "home price is soft"
        })),
        Ok(serde_json::json!({"not_a_decision": true})),
        Err(anyhow::anyhow!("model timed out")),
    ]));

    let mut cfg = strategy();
    cfg.mode = "model".to_string();
    let scanner = SportScanner::new(
        odds,
        None,
        DecisionSynthesizer::with_model(cfg, inference, None),
        Duration::from_millis(0),
        0.6,
    );

    let decisions = scanner.scan_sport("basketball_nba", 10, false, None).await.unwrap();
    assert_eq!(decisions.len(), 3);

    assert_eq!(decisions[0].verdict, Verdict::PlaceBet);
    assert_eq!(decisions[0].model_used, "scripted/test-model");
    assert!((decisions[0].confidence - 0.71).abs() < 1e-10);

    // Malformed JSON → schema fallback skip
    assert_eq!(decisions[1].verdict, Verdict::Skip);
    assert!(decisions[1].reasoning.contains("schema violation"));

    // Transport error → inference fallback skip
    assert_eq!(decisions[2].verdict, Verdict::Skip);
    assert!(decisions[2].reasoning.contains("model timed out"));

    // A failed model call must never be recommended
    let recs = scanner.get_recommendations(&decisions, Some(0.6));
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].event_id, "e1");
}

// ---------------------------------------------------------------------------
// mockall-based research expectations
// ---------------------------------------------------------------------------

mock! {
    pub Research {}

    #[async_trait]
    impl ResearchProvider for Research {
        async fn matchup_context(
            &self,
            sport_key: &str,
            home_team: &str,
            away_team: &str,
        ) -> Result<String>;

        async fn matchup_summary(
            &self,
            sport_key: &str,
            home_team: &str,
            away_team: &str,
        ) -> Result<MatchupSummary>;

        fn name(&self) -> &'static str;
    }
}

#[tokio::test]
async fn research_text_is_attached_to_each_decision() {
    let mut research = MockResearch::new();
    research
        .expect_matchup_context()
        .times(2)
        .returning(|_, home, away| Ok(format!("notes on {away} at {home}")));

    let odds = Arc::new(MockOddsProvider::new(vec![
        ml_event("e1", "Chiefs", "Bills", &[(-150, 130)]),
        ml_event("e2", "Celtics", "Heat", &[(-150, 130)]),
    ]));
    let scanner = heuristic_scanner(odds, Some(Arc::new(research)));

    let decisions = scanner.scan_sport("basketball_nba", 10, true, None).await.unwrap();
    assert_eq!(
        decisions[0].research_summary.as_deref(),
        Some("notes on Bills at Chiefs")
    );
    assert_eq!(
        decisions[1].research_summary.as_deref(),
        Some("notes on Heat at Celtics")
    );
    // Heuristic skips still annotate reasoning with the advisory text
    assert!(decisions[0].reasoning.contains("notes on Bills at Chiefs"));
}
