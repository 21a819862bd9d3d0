//! Concurrent fan-out of a resolved alert.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, join_all};
use hedgehog_core::config::NotifierConfig;
use hedgehog_core::pipeline::AlertDispatch;
use hedgehog_types::{AlertPayload, NotificationOutcome, RoutingDecision, Target};

use crate::directory::ResponderDirectory;
use crate::transport::{DeliveryError, HttpTransport, Transport};

/// Notifies every routed target concurrently.
///
/// Each delivery is bounded by `timeout`. All deliveries are joined before
/// [`dispatch`](NotificationDispatcher::dispatch) returns, and a failure for
/// one target is recorded in its outcome without affecting the rest.
pub struct NotificationDispatcher {
    directory: ResponderDirectory,
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl core::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("directory", &self.directory)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl NotificationDispatcher {
    /// Create a dispatcher over any transport.
    pub fn new(
        directory: ResponderDirectory,
        transport: Arc<dyn Transport>,
        timeout: Duration,
    ) -> Self {
        Self {
            directory,
            transport,
            timeout,
        }
    }

    /// HTTP dispatcher configured from the `notifier` config section.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Client`] if the HTTP client cannot be built.
    pub fn http(config: &NotifierConfig) -> Result<Self, DeliveryError> {
        let timeout = config.request_timeout();
        Ok(Self::new(
            ResponderDirectory::from_config(config),
            Arc::new(HttpTransport::new(timeout)?),
            timeout,
        ))
    }

    /// Deliver `payload` to every target in `routing`.
    pub async fn dispatch(
        &self,
        routing: &RoutingDecision,
        payload: &AlertPayload,
    ) -> Vec<NotificationOutcome> {
        let deliveries = routing
            .targets
            .iter()
            .map(|target| self.deliver_one(target, payload));
        join_all(deliveries).await
    }

    async fn deliver_one(&self, target: &Target, payload: &AlertPayload) -> NotificationOutcome {
        let result = match self.directory.address(target) {
            None => Err(DeliveryError::NoAddress(target.to_string())),
            Some(address) => {
                match tokio::time::timeout(self.timeout, self.transport.deliver(address, payload))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(DeliveryError::Timeout(self.timeout)),
                }
            }
        };
        match result {
            Ok(()) => {
                tracing::debug!(
                    event_id = %payload.decision.event_id,
                    target = %target,
                    "notification delivered"
                );
                NotificationOutcome::delivered(target.clone())
            }
            Err(e) => {
                tracing::warn!(
                    event_id = %payload.decision.event_id,
                    target = %target,
                    error = %e,
                    "notification failed"
                );
                NotificationOutcome::failed(target.clone(), e.to_string())
            }
        }
    }
}

impl AlertDispatch for NotificationDispatcher {
    fn dispatch<'a>(
        &'a self,
        routing: &'a RoutingDecision,
        payload: &'a AlertPayload,
    ) -> BoxFuture<'a, Vec<NotificationOutcome>> {
        Box::pin(Self::dispatch(self, routing, payload))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::Mutex;

    use chrono::Utc;
    use hedgehog_types::{
        Decision, DecisionOrigin, EnrichedEvent, Event, EventId, GameState, ResponderId,
        ThreatLevel, UrgencyTier, ZoneInfo,
    };

    use super::*;

    /// Succeeds for `ok://`, fails for `down://`, hangs for `slow://`.
    #[derive(Default)]
    struct FakeTransport {
        seen: Mutex<Vec<String>>,
    }

    impl Transport for FakeTransport {
        fn deliver<'a>(
            &'a self,
            address: &'a str,
            _payload: &'a AlertPayload,
        ) -> BoxFuture<'a, Result<(), DeliveryError>> {
            Box::pin(async move {
                self.seen.lock().unwrap().push(address.to_owned());
                if address.starts_with("slow://") {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                }
                if address.starts_with("down://") {
                    return Err(DeliveryError::Request("connection refused".to_owned()));
                }
                Ok(())
            })
        }
    }

    fn payload() -> AlertPayload {
        let event_id = EventId::new("EVT-20250101000000-0001");
        AlertPayload {
            event: EnrichedEvent {
                event: Event {
                    id: event_id.clone(),
                    timestamp: Utc::now(),
                    location: "Chemical Plant".to_owned(),
                    threat_level: ThreatLevel::High,
                    description: "Mega Mack leak".to_owned(),
                    source_tag: "SENSOR".to_owned(),
                    raw_payload: serde_json::Value::Null,
                },
                priority_score: 7,
                urgency_tier: UrgencyTier::High,
                zone: ZoneInfo {
                    name: "Chemical Plant".to_owned(),
                    description: String::new(),
                    nearby_responders: BTreeSet::new(),
                },
            },
            decision: Decision::new(event_id, DecisionOrigin::Human, BTreeSet::new()),
            game_state: GameState::default(),
        }
    }

    fn routing(names: &[&str]) -> RoutingDecision {
        let mut routing = RoutingDecision::default();
        routing.targets.insert(Target::AuditLog);
        for name in names {
            routing.targets.insert(Target::Responder(ResponderId::new(*name)));
        }
        routing
    }

    fn dispatcher(entries: &[(&str, &str)]) -> (NotificationDispatcher, Arc<FakeTransport>) {
        let addresses: BTreeMap<String, String> = entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        let transport = Arc::new(FakeTransport::default());
        let dispatcher = NotificationDispatcher::new(
            ResponderDirectory::new(addresses),
            Arc::clone(&transport) as Arc<dyn Transport>,
            Duration::from_secs(5),
        );
        (dispatcher, transport)
    }

    fn outcome_for<'a>(outcomes: &'a [NotificationOutcome], key: &str) -> &'a NotificationOutcome {
        outcomes
            .iter()
            .find(|o| o.target.directory_key() == key)
            .unwrap()
    }

    #[tokio::test]
    async fn every_target_gets_an_outcome() {
        let (dispatcher, transport) = dispatcher(&[
            ("AuditLog", "ok://audit"),
            ("Sonic", "ok://sonic"),
            ("Tails", "down://tails"),
        ]);
        let outcomes = dispatcher
            .dispatch(&routing(&["Sonic", "Tails", "Knuckles"]), &payload())
            .await;

        assert_eq!(outcomes.len(), 4);
        assert!(outcome_for(&outcomes, "AuditLog").delivered);
        assert!(outcome_for(&outcomes, "Sonic").delivered);

        let tails = outcome_for(&outcomes, "Tails");
        assert!(!tails.delivered);
        assert!(tails.error.as_deref().unwrap().contains("connection refused"));

        let knuckles = outcome_for(&outcomes, "Knuckles");
        assert!(!knuckles.delivered);
        assert!(knuckles.error.as_deref().unwrap().contains("no address"));

        // Knuckles had no address, so the transport was never called for it.
        assert_eq!(transport.seen.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_target_times_out_without_blocking_others() {
        let (dispatcher, _transport) =
            dispatcher(&[("AuditLog", "ok://audit"), ("Sonic", "slow://sonic")]);
        let started = tokio::time::Instant::now();

        let outcomes = dispatcher.dispatch(&routing(&["Sonic"]), &payload()).await;

        assert!(outcome_for(&outcomes, "AuditLog").delivered);
        let sonic = outcome_for(&outcomes, "Sonic");
        assert!(!sonic.delivered);
        assert!(sonic.error.as_deref().unwrap().contains("timed out"));
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn works_through_the_pipeline_seam() {
        let (dispatcher, _transport) = dispatcher(&[("AuditLog", "ok://audit")]);
        let seam: &dyn AlertDispatch = &dispatcher;
        let outcomes = seam.dispatch(&routing(&[]), &payload()).await;
        assert_eq!(outcomes, vec![NotificationOutcome::delivered(Target::AuditLog)]);
    }
}
