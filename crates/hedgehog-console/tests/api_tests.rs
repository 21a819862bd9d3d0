//! Integration tests for the operator console endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. A decision request runs on a background task so
//! the handlers act on a real pending slot in the arbiter.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use hedgehog_console::router::build_router;
use hedgehog_console::state::{AppState, ConsoleBoard, ConsoleMessage, GameSnapshot};
use hedgehog_core::arbiter::{AlertPublisher, DecisionArbiter};
use hedgehog_core::config::RespondersConfig;
use hedgehog_core::control::RunControl;
use hedgehog_core::roster::ResponderRoster;
use hedgehog_types::{
    Decision, DecisionOrigin, EnrichedEvent, Event, EventId, GameState, GameStatus, ResponderId,
    ThreatLevel, UrgencyTier, ZoneInfo,
};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tower::ServiceExt;

struct Harness {
    state: Arc<AppState>,
    board: Arc<ConsoleBoard>,
    arbiter: Arc<DecisionArbiter>,
    control: Arc<RunControl>,
}

impl Harness {
    fn new(online: bool) -> Self {
        let roster = Arc::new(ResponderRoster::from_config(&RespondersConfig::default()).unwrap());
        let board = Arc::new(ConsoleBoard::new());
        board.set_online(online);
        let publisher: Arc<dyn AlertPublisher> = Arc::clone(&board) as Arc<dyn AlertPublisher>;
        let arbiter = Arc::new(DecisionArbiter::new(roster, publisher));
        let control = Arc::new(RunControl::new());
        let state = AppState::new(Arc::clone(&board), Arc::clone(&arbiter))
            .with_control(Arc::clone(&control))
            .with_game(GameSnapshot::new(GameState::new(90, 12)));
        Self {
            state: Arc::new(state),
            board,
            arbiter,
            control,
        }
    }

    fn router(&self) -> Router {
        build_router(Arc::clone(&self.state))
    }

    /// Start a decision request and wait until its alert is on the board.
    async fn raise(&self, id: &str, level: ThreatLevel) -> JoinHandle<Decision> {
        let arbiter = Arc::clone(&self.arbiter);
        let event = enriched(id, level);
        let handle = tokio::spawn(async move {
            arbiter
                .request_decision(&event, Instant::now() + Duration::from_secs(30))
                .await
                .unwrap()
        });
        while self.board.current_alert().is_none() {
            tokio::task::yield_now().await;
        }
        handle
    }
}

fn enriched(id: &str, level: ThreatLevel) -> EnrichedEvent {
    EnrichedEvent {
        event: Event {
            id: EventId::new(id),
            timestamp: Utc::now(),
            location: "Mystic Ruins".to_owned(),
            threat_level: level,
            description: "Chaos energy spike".to_owned(),
            source_tag: "RADAR".to_owned(),
            raw_payload: Value::Null,
        },
        priority_score: 7,
        urgency_tier: UrgencyTier::High,
        zone: ZoneInfo {
            name: "Mystic Ruins".to_owned(),
            description: String::new(),
            nearby_responders: ["Tails", "Knuckles"]
                .into_iter()
                .map(ResponderId::new)
                .collect::<BTreeSet<_>>(),
        },
    }
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, json: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_alert_empty_when_nothing_pending() {
    let harness = Harness::new(true);
    let response = harness.router().oneshot(get("/api/alert")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert!(json["alert"].is_null());
    assert!(json["seconds_left"].is_null());
}

#[tokio::test]
async fn test_pending_alert_is_shown() {
    let harness = Harness::new(true);
    let _pending = harness.raise("EVT-A", ThreatLevel::High).await;

    let response = harness.router().oneshot(get("/api/alert")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["alert"]["event_id"], "EVT-A");
    assert_eq!(json["alert"]["threat_level"], "high");
    assert_eq!(json["alert"]["zone_name"], "Mystic Ruins");
    assert!(json["seconds_left"].as_u64().unwrap() <= 30);
}

#[tokio::test]
async fn test_submit_decision_applies_and_clears_alert() {
    let harness = Harness::new(true);
    let pending = harness.raise("EVT-B", ThreatLevel::High).await;

    let response = harness
        .router()
        .oneshot(post_json(
            "/api/decisions",
            &serde_json::json!({ "event_id": "EVT-B", "responders": ["Tails", "Knuckles"] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["applied"], true);
    assert_eq!(json["origin"], "human");
    assert_eq!(json["chosen_responders"], serde_json::json!(["Knuckles", "Tails"]));

    let decision = pending.await.unwrap();
    assert_eq!(decision.origin, DecisionOrigin::Human);
    assert!(harness.board.current_alert().is_none());
}

#[tokio::test]
async fn test_late_submission_is_not_applied() {
    let harness = Harness::new(true);
    let pending = harness.raise("EVT-C", ThreatLevel::Low).await;

    let first = harness
        .router()
        .oneshot(post_json(
            "/api/decisions",
            &serde_json::json!({ "event_id": "EVT-C", "responders": [] }),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    pending.await.unwrap();

    let second = harness
        .router()
        .oneshot(post_json(
            "/api/decisions",
            &serde_json::json!({ "event_id": "EVT-C", "responders": ["Sonic"] }),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let json = body_to_json(second.into_body()).await;
    assert_eq!(json["applied"], false);
    assert_eq!(json["chosen_responders"], serde_json::json!([]));
    assert!(json["message"].as_str().unwrap().contains("not applied"));
}

#[tokio::test]
async fn test_unknown_responder_is_bad_request() {
    let harness = Harness::new(true);
    let _pending = harness.raise("EVT-D", ThreatLevel::Medium).await;

    let response = harness
        .router()
        .oneshot(post_json(
            "/api/decisions",
            &serde_json::json!({ "event_id": "EVT-D", "responders": ["Shadow"] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 400);
    assert!(json["error"].as_str().unwrap().contains("Shadow"));

    // The alert is still pending.
    assert_eq!(harness.arbiter.pending_events().await, vec![EventId::new("EVT-D")]);
}

#[tokio::test]
async fn test_unknown_event_is_not_found() {
    let harness = Harness::new(true);
    let response = harness
        .router()
        .oneshot(post_json(
            "/api/decisions",
            &serde_json::json!({ "event_id": "EVT-NOPE", "responders": ["Sonic"] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_get_game() {
    let harness = Harness::new(true);
    let response = harness.router().oneshot(get("/api/game")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["state"]["attacker_health"], 90);
    assert_eq!(json["state"]["panic_level"], 12);
    assert_eq!(json["status"], "ongoing");
    assert_eq!(json["cycles"], 0);
}

#[tokio::test]
async fn test_get_responders() {
    let harness = Harness::new(true);
    let response = harness.router().oneshot(get("/api/responders")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["responders"], serde_json::json!(["Sonic", "Tails", "Knuckles"]));
    assert_eq!(json["primary"], "Sonic");
}

#[tokio::test]
async fn test_operator_stop_and_status() {
    let harness = Harness::new(true);
    let response = harness
        .router()
        .oneshot(post_json("/api/operator/stop", &Value::Null))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["ok"], true);
    assert!(harness.control.is_stop_requested());

    let response = harness
        .router()
        .oneshot(get("/api/operator/status"))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["stop_requested"], true);
    assert_eq!(json["console_online"], true);
    assert_eq!(json["pending_events"], serde_json::json!([]));
}

#[tokio::test]
async fn test_operator_without_control_is_internal_error() {
    let harness = Harness::new(true);
    let state = AppState::new(Arc::clone(&harness.board), Arc::clone(&harness.arbiter));
    let response = build_router(Arc::new(state))
        .oneshot(post_json("/api/operator/stop", &Value::Null))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!harness.control.is_stop_requested());
}

#[tokio::test]
async fn test_offline_console_falls_back() {
    let harness = Harness::new(false);
    let decision = harness
        .arbiter
        .request_decision(
            &enriched("EVT-E", ThreatLevel::Critical),
            Instant::now() + Duration::from_secs(30),
        )
        .await
        .unwrap();
    assert_eq!(decision.origin, DecisionOrigin::ErrorFallback);
    assert_eq!(decision.chosen_responders.len(), 3);
    assert!(harness.board.current_alert().is_none());
}

#[tokio::test]
async fn test_broadcast_stream_sequence() {
    let harness = Harness::new(true);
    let mut rx = harness.board.subscribe();
    let pending = harness.raise("EVT-F", ThreatLevel::Medium).await;

    harness
        .arbiter
        .submit_decision(&EventId::new("EVT-F"), BTreeSet::new())
        .await
        .unwrap();
    pending.await.unwrap();
    harness.board.announce_game_over(GameSnapshot {
        state: GameState::new(0, 40),
        status: GameStatus::Victory,
        cycles: 9,
    });

    assert!(matches!(rx.recv().await.unwrap(), ConsoleMessage::Alert { notice } if notice.event_id.as_str() == "EVT-F"));
    assert!(matches!(rx.recv().await.unwrap(), ConsoleMessage::Resolved { decision } if decision.origin == DecisionOrigin::Human));
    assert!(matches!(rx.recv().await.unwrap(), ConsoleMessage::GameOver { game, .. } if game.status == GameStatus::Victory));
}

#[tokio::test]
async fn test_nonexistent_route_returns_404() {
    let harness = Harness::new(true);
    let response = harness.router().oneshot(get("/api/nonexistent")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
