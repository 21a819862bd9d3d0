//! End-to-end delivery over HTTP against a local axum endpoint.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use chrono::Utc;
use hedgehog_core::config::NotifierConfig;
use hedgehog_notify::NotificationDispatcher;
use hedgehog_types::{
    AlertPayload, Decision, DecisionOrigin, EnrichedEvent, Event, EventId, GameState, ResponderId,
    RoutingDecision, Target, ThreatLevel, UrgencyTier, ZoneInfo,
};
use tokio::sync::Mutex;

type Inbox = Arc<Mutex<Vec<serde_json::Value>>>;

async fn receive(State(inbox): State<Inbox>, body: String) -> StatusCode {
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    inbox.lock().await.push(json);
    StatusCode::OK
}

async fn broken() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn spawn_endpoint() -> (String, Inbox) {
    let inbox: Inbox = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/alert", post(receive))
        .route("/broken", post(broken))
        .with_state(Arc::clone(&inbox));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), inbox)
}

fn payload() -> AlertPayload {
    let id = EventId::new("EVT-20250101000000-0007");
    let chosen: BTreeSet<ResponderId> = [ResponderId::new("Sonic")].into_iter().collect();
    AlertPayload {
        event: EnrichedEvent {
            event: Event {
                id: id.clone(),
                timestamp: Utc::now(),
                location: "Green Hill Zone".to_owned(),
                threat_level: ThreatLevel::Critical,
                description: "Death Egg descending".to_owned(),
                source_tag: "SATELLITE".to_owned(),
                raw_payload: serde_json::json!({ "altitude_m": 1200 }),
            },
            priority_score: 10,
            urgency_tier: UrgencyTier::Maximum,
            zone: ZoneInfo {
                name: "Green Hill Zone".to_owned(),
                description: "Rolling green hills and loops.".to_owned(),
                nearby_responders: chosen.clone(),
            },
        },
        decision: Decision::new(id, DecisionOrigin::Human, chosen),
        game_state: GameState::new(80, 10),
    }
}

#[tokio::test]
async fn posts_json_payload_to_each_target() {
    let (base, inbox) = spawn_endpoint().await;
    let config = NotifierConfig {
        request_timeout_ms: 2_000,
        endpoints: BTreeMap::from([
            ("AuditLog".to_owned(), format!("{base}/alert")),
            ("Sonic".to_owned(), format!("{base}/alert")),
            ("Tails".to_owned(), format!("{base}/broken")),
        ]),
    };
    let dispatcher = NotificationDispatcher::http(&config).unwrap();

    let mut routing = RoutingDecision::default();
    routing.targets.insert(Target::AuditLog);
    routing.targets.insert(Target::Responder(ResponderId::new("Sonic")));
    routing.targets.insert(Target::Responder(ResponderId::new("Tails")));

    let outcomes = tokio::time::timeout(
        Duration::from_secs(10),
        dispatcher.dispatch(&routing, &payload()),
    )
    .await
    .unwrap();

    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes.iter().filter(|o| o.delivered).count(), 2);
    let tails = outcomes
        .iter()
        .find(|o| o.target.directory_key() == "Tails")
        .unwrap();
    assert!(!tails.delivered);
    assert!(tails.error.as_deref().unwrap().contains("500"));

    let received = inbox.lock().await;
    assert_eq!(received.len(), 2);
    assert_eq!(received[0]["event"]["event"]["threat_level"], "critical");
    assert_eq!(received[0]["decision"]["origin"], "human");
    assert_eq!(received[0]["game_state"]["attacker_health"], 80);
}

#[tokio::test]
async fn unreachable_endpoint_is_a_failed_outcome() {
    let config = NotifierConfig {
        request_timeout_ms: 500,
        // Port 9 (discard) on localhost is closed in test environments.
        endpoints: BTreeMap::from([("AuditLog".to_owned(), "http://127.0.0.1:9/alert".to_owned())]),
    };
    let dispatcher = NotificationDispatcher::http(&config).unwrap();
    let mut routing = RoutingDecision::default();
    routing.targets.insert(Target::AuditLog);

    let outcomes = dispatcher.dispatch(&routing, &payload()).await;
    assert_eq!(outcomes.len(), 1);
    assert!(!outcomes[0].delivered);
    assert!(outcomes[0].error.is_some());
}
