//! Exactly-once decision arbitration.
//!
//! For every enriched event the arbiter opens a decision slot, publishes an
//! [`AlertNotice`] to the operator channel, and then waits for whichever
//! comes first: a human selection or the deadline. Both signals race to
//! claim the same single-assignment slot; the first claim wins and every
//! later claim observes the winner. The losing signal never alters the
//! resolved decision, even when both arrive at the same instant.
//!
//! If the operator channel cannot be reached the event resolves
//! immediately through the escalation policy with
//! [`DecisionOrigin::ErrorFallback`].

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, OnceLock};

use chrono::{TimeDelta, Utc};
use hedgehog_types::{AlertNotice, Decision, DecisionOrigin, EnrichedEvent, EventId, ResponderId};
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::escalation::EscalationPolicy;
use crate::roster::ResponderRoster;

/// How many resolved slots are kept so that late submissions get a
/// meaningful answer instead of "unknown event".
pub const RETAINED_RESOLVED: usize = 128;

// ---------------------------------------------------------------------------
// Operator channel
// ---------------------------------------------------------------------------

/// The operator channel is unavailable.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Nobody is listening for notices.
    #[error("operator channel unavailable: {0}")]
    Unavailable(String),
}

/// Where pending-decision notices are shown to a human operator.
pub trait AlertPublisher: Send + Sync {
    /// Show `notice` to the operator.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] if the operator cannot be reached; the
    /// arbiter then resolves the event through the fallback policy.
    fn publish(&self, notice: &AlertNotice) -> Result<(), PublishError>;

    /// Called once the event has been resolved, by whichever signal.
    fn resolved(&self, decision: &Decision) {
        let _ = decision;
    }
}

/// Publisher for runs without an operator console.
///
/// Every publish fails, so every event resolves by fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessPublisher;

impl AlertPublisher for HeadlessPublisher {
    fn publish(&self, _notice: &AlertNotice) -> Result<(), PublishError> {
        Err(PublishError::Unavailable("no operator console attached".to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Errors and outcomes
// ---------------------------------------------------------------------------

/// Errors from [`DecisionArbiter::request_decision`].
#[derive(Debug, thiserror::Error)]
pub enum ArbiterError {
    /// A decision was already requested for this event id.
    #[error("a decision for event {0} was already requested")]
    DuplicateEvent(EventId),
}

/// Rejections from [`DecisionArbiter::submit_decision`].
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// No pending or recently resolved event has this id.
    #[error("unknown event {0}")]
    UnknownEvent(EventId),

    /// The selection names responders that are not on the roster.
    #[error("selection contains unknown responders: {}", join_ids(.unknown))]
    InvalidSelection {
        /// The unrecognised responders.
        unknown: Vec<ResponderId>,
    },
}

fn join_ids(ids: &[ResponderId]) -> String {
    ids.iter().map(ResponderId::as_str).collect::<Vec<_>>().join(", ")
}

/// Result of a well-formed human submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The submission resolved the event.
    Applied(Decision),
    /// The event had already been resolved; this is the decision that won.
    AlreadyResolved(Decision),
}

impl SubmitOutcome {
    /// The decision in force for the event.
    pub const fn decision(&self) -> &Decision {
        match self {
            Self::Applied(d) | Self::AlreadyResolved(d) => d,
        }
    }

    /// Whether this submission was the one that resolved the event.
    pub const fn applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

// ---------------------------------------------------------------------------
// Decision slot
// ---------------------------------------------------------------------------

/// Single-assignment cell for one event's decision.
#[derive(Debug, Default)]
struct DecisionSlot {
    outcome: OnceLock<Decision>,
    resolved: Notify,
}

impl DecisionSlot {
    /// Try to resolve the slot with `candidate`.
    ///
    /// Returns whether this call won, and the decision now in force.
    fn claim(&self, candidate: Decision) -> (bool, Decision) {
        let mut won = false;
        let decision = self
            .outcome
            .get_or_init(|| {
                won = true;
                candidate
            })
            .clone();
        if won {
            // notify_one stores a permit, so a waiter that has not yet
            // polled still wakes.
            self.resolved.notify_one();
        }
        (won, decision)
    }

    fn is_resolved(&self) -> bool {
        self.outcome.get().is_some()
    }

    async fn wait_resolved(&self) -> Decision {
        loop {
            if let Some(decision) = self.outcome.get() {
                return decision.clone();
            }
            self.resolved.notified().await;
        }
    }
}

#[derive(Debug, Default)]
struct SlotRegistry {
    slots: HashMap<EventId, Arc<DecisionSlot>>,
    retired: VecDeque<EventId>,
}

// ---------------------------------------------------------------------------
// Arbiter
// ---------------------------------------------------------------------------

/// Resolves each event to exactly one [`Decision`].
pub struct DecisionArbiter {
    roster: Arc<ResponderRoster>,
    policy: EscalationPolicy,
    publisher: Arc<dyn AlertPublisher>,
    registry: Mutex<SlotRegistry>,
}

impl core::fmt::Debug for DecisionArbiter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DecisionArbiter")
            .field("roster", &self.roster)
            .finish_non_exhaustive()
    }
}

impl DecisionArbiter {
    /// Create an arbiter that publishes notices through `publisher`.
    pub fn new(roster: Arc<ResponderRoster>, publisher: Arc<dyn AlertPublisher>) -> Self {
        Self {
            policy: EscalationPolicy::new(Arc::clone(&roster)),
            roster,
            publisher,
            registry: Mutex::new(SlotRegistry::default()),
        }
    }

    /// The responder roster selections are validated against.
    pub fn roster(&self) -> &ResponderRoster {
        &self.roster
    }

    /// Obtain the decision for `event`, waiting at most until `deadline`.
    ///
    /// Opens the slot, publishes the notice, then resolves with whichever
    /// of a human submission or the deadline claims the slot first. The
    /// returned decision is final.
    ///
    /// # Errors
    ///
    /// Returns [`ArbiterError::DuplicateEvent`] if this event id already
    /// has a slot.
    pub async fn request_decision(
        &self,
        event: &EnrichedEvent,
        deadline: Instant,
    ) -> Result<Decision, ArbiterError> {
        let event_id = event.id().clone();
        let slot = self.open_slot(&event_id).await?;

        let remaining = deadline.saturating_duration_since(Instant::now());
        let now = Utc::now();
        let wall_deadline = TimeDelta::from_std(remaining)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(now);
        let deadline_ms = u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX);
        let notice = AlertNotice::for_event(event, wall_deadline, deadline_ms);

        let decision = match self.publisher.publish(&notice) {
            Err(e) => {
                tracing::warn!(
                    event_id = %event_id,
                    error = %e,
                    "operator channel unavailable, applying fallback policy"
                );
                let fallback = Decision::new(
                    event_id.clone(),
                    DecisionOrigin::ErrorFallback,
                    self.policy.choose(event),
                )
                .with_reason(e.to_string());
                slot.claim(fallback).1
            }
            Ok(()) => {
                tracing::info!(
                    event_id = %event_id,
                    threat_level = %event.threat_level(),
                    deadline_ms,
                    "alert published, awaiting operator decision"
                );
                tokio::select! {
                    decision = slot.wait_resolved() => decision,
                    () = tokio::time::sleep_until(deadline) => {
                        let timeout = Decision::new(
                            event_id.clone(),
                            DecisionOrigin::Timeout,
                            self.policy.choose(event),
                        );
                        let (won, decision) = slot.claim(timeout);
                        if !won {
                            tracing::debug!(
                                event_id = %event_id,
                                "deadline fired after the operator decided"
                            );
                        }
                        decision
                    }
                }
            }
        };

        self.retire(&event_id).await;
        self.publisher.resolved(&decision);
        tracing::info!(
            event_id = %event_id,
            origin = %decision.origin,
            responders = decision.chosen_responders.len(),
            "decision resolved"
        );
        Ok(decision)
    }

    /// Record a human selection for `event_id`.
    ///
    /// An empty selection is a valid "log only" decision. A well-formed
    /// submission for an event that is already resolved is not an error;
    /// it reports the decision that won.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::InvalidSelection`] if any responder is not on
    /// the roster (the slot is left untouched), or
    /// [`SubmitError::UnknownEvent`] if the event has no slot.
    pub async fn submit_decision(
        &self,
        event_id: &EventId,
        selection: BTreeSet<ResponderId>,
    ) -> Result<SubmitOutcome, SubmitError> {
        let unknown = self.roster.unknown_in(&selection);
        if !unknown.is_empty() {
            tracing::warn!(
                event_id = %event_id,
                unknown = %join_ids(&unknown),
                "rejected selection with unknown responders"
            );
            return Err(SubmitError::InvalidSelection { unknown });
        }

        let slot = {
            let registry = self.registry.lock().await;
            registry.slots.get(event_id).cloned()
        }
        .ok_or_else(|| SubmitError::UnknownEvent(event_id.clone()))?;

        let (won, decision) = slot.claim(Decision::new(
            event_id.clone(),
            DecisionOrigin::Human,
            selection,
        ));
        if won {
            tracing::info!(event_id = %event_id, "operator decision applied");
            Ok(SubmitOutcome::Applied(decision))
        } else {
            tracing::info!(
                event_id = %event_id,
                origin = %decision.origin,
                "late operator decision ignored, event already resolved"
            );
            Ok(SubmitOutcome::AlreadyResolved(decision))
        }
    }

    /// Ids of events that are waiting for a decision.
    pub async fn pending_events(&self) -> Vec<EventId> {
        let registry = self.registry.lock().await;
        let mut pending: Vec<EventId> = registry
            .slots
            .iter()
            .filter(|(_, slot)| !slot.is_resolved())
            .map(|(id, _)| id.clone())
            .collect();
        pending.sort();
        pending
    }

    async fn open_slot(&self, event_id: &EventId) -> Result<Arc<DecisionSlot>, ArbiterError> {
        let mut registry = self.registry.lock().await;
        if registry.slots.contains_key(event_id) {
            return Err(ArbiterError::DuplicateEvent(event_id.clone()));
        }
        let slot = Arc::new(DecisionSlot::default());
        registry.slots.insert(event_id.clone(), Arc::clone(&slot));
        Ok(slot)
    }

    async fn retire(&self, event_id: &EventId) {
        let mut registry = self.registry.lock().await;
        registry.retired.push_back(event_id.clone());
        while registry.retired.len() > RETAINED_RESOLVED {
            if let Some(oldest) = registry.retired.pop_front() {
                registry.slots.remove(&oldest);
            }
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use std::time::Duration;

    use hedgehog_types::ThreatLevel;

    use super::*;
    use crate::test_support::{RecordingPublisher, enriched, roster, selection};

    fn arbiter(publisher: Arc<RecordingPublisher>) -> Arc<DecisionArbiter> {
        Arc::new(DecisionArbiter::new(Arc::new(roster()), publisher))
    }

    fn spawn_request(
        arbiter: &Arc<DecisionArbiter>,
        event: EnrichedEvent,
        window: Duration,
    ) -> tokio::task::JoinHandle<Result<Decision, ArbiterError>> {
        let arbiter = Arc::clone(arbiter);
        let deadline = Instant::now() + window;
        tokio::spawn(async move { arbiter.request_decision(&event, deadline).await })
    }

    #[tokio::test(start_paused = true)]
    async fn human_decision_before_deadline_wins() {
        let publisher = Arc::new(RecordingPublisher::default());
        let arbiter = arbiter(Arc::clone(&publisher));
        let event = enriched("EVT-1", ThreatLevel::High, &["Tails"]);
        let handle = spawn_request(&arbiter, event, Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(arbiter.pending_events().await, vec![EventId::new("EVT-1")]);

        let outcome = arbiter
            .submit_decision(&EventId::new("EVT-1"), selection(&["Tails"]))
            .await
            .unwrap();
        assert!(outcome.applied());

        let decision = handle.await.unwrap().unwrap();
        assert_eq!(decision.origin, DecisionOrigin::Human);
        assert_eq!(decision.chosen_responders, selection(&["Tails"]));
        assert_eq!(&decision, outcome.decision());
        assert!(arbiter.pending_events().await.is_empty());

        let notices = publisher.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].deadline_ms, 10_000);
        assert_eq!(publisher.resolutions(), vec![decision]);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_applies_escalation_policy() {
        let publisher = Arc::new(RecordingPublisher::default());
        let arbiter = arbiter(publisher);
        let event = enriched("EVT-2", ThreatLevel::Critical, &[]);

        let decision = arbiter
            .request_decision(&event, Instant::now() + Duration::from_secs(40))
            .await
            .unwrap();
        assert_eq!(decision.origin, DecisionOrigin::Timeout);
        assert_eq!(decision.chosen_responders, selection(&["Knuckles", "Sonic", "Tails"]));
    }

    #[tokio::test(start_paused = true)]
    async fn late_submission_does_not_change_the_decision() {
        let publisher = Arc::new(RecordingPublisher::default());
        let arbiter = arbiter(publisher);
        let event = enriched("EVT-3", ThreatLevel::Low, &[]);

        let decision = arbiter
            .request_decision(&event, Instant::now() + Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(decision.origin, DecisionOrigin::Timeout);
        assert!(decision.chosen_responders.is_empty());

        let outcome = arbiter
            .submit_decision(&EventId::new("EVT-3"), selection(&["Sonic"]))
            .await
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::AlreadyResolved(decision));
    }

    #[tokio::test(start_paused = true)]
    async fn submission_at_the_deadline_resolves_exactly_once() {
        let publisher = Arc::new(RecordingPublisher::default());
        let arbiter = arbiter(Arc::clone(&publisher));

        for n in 0..32 {
            let id = format!("EVT-RACE-{n:04}");
            let window = Duration::from_secs(5);
            let deadline = Instant::now() + window;
            let handle = spawn_request(
                &arbiter,
                enriched(&id, ThreatLevel::Medium, &["Knuckles"]),
                window,
            );
            let submitter = {
                let arbiter = Arc::clone(&arbiter);
                let id = EventId::new(id.as_str());
                tokio::spawn(async move {
                    tokio::time::sleep_until(deadline).await;
                    arbiter.submit_decision(&id, selection(&["Sonic", "Tails"])).await
                })
            };

            let decision = handle.await.unwrap().unwrap();
            let outcome = submitter.await.unwrap().unwrap();
            assert_eq!(outcome.decision(), &decision);
            match decision.origin {
                DecisionOrigin::Human => {
                    assert!(outcome.applied());
                    assert_eq!(decision.chosen_responders, selection(&["Sonic", "Tails"]));
                }
                DecisionOrigin::Timeout => {
                    assert!(!outcome.applied());
                    assert_eq!(decision.chosen_responders, selection(&["Knuckles"]));
                }
                DecisionOrigin::ErrorFallback => panic!("publisher never fails here"),
            }
        }
        assert_eq!(publisher.resolutions().len(), 32);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_submissions_apply_exactly_one() {
        let publisher = Arc::new(RecordingPublisher::default());
        let arbiter = arbiter(publisher);
        let handle = spawn_request(
            &arbiter,
            enriched("EVT-MANY", ThreatLevel::High, &[]),
            Duration::from_secs(30),
        );
        while arbiter.pending_events().await.is_empty() {
            tokio::task::yield_now().await;
        }

        let picks = [&["Sonic"][..], &["Tails"], &["Knuckles"], &[], &["Sonic", "Tails"]];
        let submitters: Vec<_> = (0..20)
            .map(|i| {
                let arbiter = Arc::clone(&arbiter);
                let pick = selection(picks[i % picks.len()]);
                tokio::spawn(async move {
                    arbiter.submit_decision(&EventId::new("EVT-MANY"), pick).await
                })
            })
            .collect();

        let mut outcomes = Vec::new();
        for s in submitters {
            outcomes.push(s.await.unwrap().unwrap());
        }
        let decision = handle.await.unwrap().unwrap();

        assert_eq!(outcomes.iter().filter(|o| o.applied()).count(), 1);
        assert!(outcomes.iter().all(|o| o.decision() == &decision));
        assert_eq!(decision.origin, DecisionOrigin::Human);
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_console_falls_back_immediately() {
        let publisher = Arc::new(RecordingPublisher::failing());
        let arbiter = arbiter(Arc::clone(&publisher));
        let event = enriched("EVT-4", ThreatLevel::High, &["Knuckles"]);
        let started = Instant::now();

        let decision = arbiter
            .request_decision(&event, started + Duration::from_secs(40))
            .await
            .unwrap();
        assert_eq!(decision.origin, DecisionOrigin::ErrorFallback);
        assert_eq!(decision.chosen_responders, selection(&["Knuckles", "Sonic"]));
        assert!(decision.reason.is_some());
        assert_eq!(Instant::now(), started);
        assert_eq!(publisher.resolutions().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn headless_publisher_always_falls_back() {
        let arbiter = DecisionArbiter::new(Arc::new(roster()), Arc::new(HeadlessPublisher));
        let decision = arbiter
            .request_decision(
                &enriched("EVT-5", ThreatLevel::Medium, &[]),
                Instant::now() + Duration::from_secs(1),
            )
            .await
            .unwrap();
        assert_eq!(decision.origin, DecisionOrigin::ErrorFallback);
        assert_eq!(decision.chosen_responders, selection(&["Sonic"]));
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_selection_leaves_slot_pending() {
        let publisher = Arc::new(RecordingPublisher::default());
        let arbiter = arbiter(publisher);
        let handle = spawn_request(
            &arbiter,
            enriched("EVT-6", ThreatLevel::Low, &[]),
            Duration::from_secs(10),
        );
        tokio::time::sleep(Duration::from_secs(1)).await;

        let err = arbiter
            .submit_decision(&EventId::new("EVT-6"), selection(&["Sonic", "Eggman"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SubmitError::InvalidSelection { ref unknown } if unknown == &vec![ResponderId::new("Eggman")]
        ));
        assert_eq!(arbiter.pending_events().await.len(), 1);

        // An empty selection is a valid "log only" decision.
        let outcome = arbiter
            .submit_decision(&EventId::new("EVT-6"), BTreeSet::new())
            .await
            .unwrap();
        assert!(outcome.applied());
        let decision = handle.await.unwrap().unwrap();
        assert_eq!(decision.origin, DecisionOrigin::Human);
        assert!(decision.chosen_responders.is_empty());
    }

    #[tokio::test]
    async fn unknown_event_is_rejected() {
        let arbiter = arbiter(Arc::new(RecordingPublisher::default()));
        let err = arbiter
            .submit_decision(&EventId::new("EVT-NOPE"), selection(&["Sonic"]))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::UnknownEvent(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_request_is_rejected() {
        let arbiter = arbiter(Arc::new(RecordingPublisher::default()));
        let event = enriched("EVT-7", ThreatLevel::Low, &[]);
        let first = spawn_request(&arbiter, event.clone(), Duration::from_secs(10));
        tokio::time::sleep(Duration::from_millis(10)).await;

        let second = arbiter
            .request_decision(&event, Instant::now() + Duration::from_secs(10))
            .await;
        assert!(matches!(second, Err(ArbiterError::DuplicateEvent(_))));
        assert_eq!(first.await.unwrap().unwrap().origin, DecisionOrigin::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn resolved_history_is_bounded() {
        let arbiter = arbiter(Arc::new(RecordingPublisher::default()));
        let total = RETAINED_RESOLVED + 2;
        for n in 0..total {
            let event = enriched(&format!("EVT-{n:04}"), ThreatLevel::Low, &[]);
            arbiter
                .request_decision(&event, Instant::now() + Duration::from_millis(1))
                .await
                .unwrap();
        }
        // The oldest resolved events have been forgotten.
        assert!(matches!(
            arbiter.submit_decision(&EventId::new("EVT-0000"), BTreeSet::new()).await,
            Err(SubmitError::UnknownEvent(_))
        ));
        let newest = EventId::new(format!("EVT-{:04}", total - 1));
        assert!(matches!(
            arbiter.submit_decision(&newest, BTreeSet::new()).await,
            Ok(SubmitOutcome::AlreadyResolved(_))
        ));
    }
}
