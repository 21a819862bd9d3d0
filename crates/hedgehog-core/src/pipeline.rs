//! The per-event cycle and the run loop.
//!
//! [`Pipeline::process_event`] takes one raw event through the whole
//! cycle: classify, enrich, arbitrate, score, route, dispatch.
//! [`Pipeline::run`] repeats that cycle over an [`EventSource`] until the
//! game ends, the source runs dry, the cycle limit is hit, or an operator
//! asks to stop.
//!
//! Delivery is behind the [`AlertDispatch`] trait so the notifier crate can
//! provide the HTTP implementation and tests can record what was sent.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use hedgehog_types::{
    AlertPayload, Decision, EnrichedEvent, Event, EventId, GameState, GameStatus,
    NotificationOutcome, RawEvent, RoutingDecision,
};
use rand::Rng;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::arbiter::{ArbiterError, DecisionArbiter};
use crate::classifier::{Classifier, LevelClassifier};
use crate::config::{AlertConfig, ConfigError, MAX_DECISION_TIMEOUT_MS};
use crate::control::{RunControl, RunEndReason};
use crate::enricher::Enricher;
use crate::router::ResponseRouter;
use crate::score::{ScoreError, ScoreTracker, ScoreUpdate};

/// Errors that stop the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The arbiter refused the event.
    #[error("arbitration failed: {source}")]
    Arbiter {
        /// The underlying arbiter error.
        #[from]
        source: ArbiterError,
    },

    /// The score could not be updated.
    #[error("score update failed: {source}")]
    Score {
        /// The underlying score error.
        #[from]
        source: ScoreError,
    },
}

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// Supplies raw events to the run loop.
pub trait EventSource: Send {
    /// The next event, or `None` when the source is exhausted.
    fn next_event(&mut self) -> Option<RawEvent>;
}

/// Delivers a resolved alert to its targets.
pub trait AlertDispatch: Send + Sync {
    /// Notify every target in `routing`. Never fails as a whole; each
    /// target gets its own outcome.
    fn dispatch<'a>(
        &'a self,
        routing: &'a RoutingDecision,
        payload: &'a AlertPayload,
    ) -> BoxFuture<'a, Vec<NotificationOutcome>>;
}

/// Callback invoked after each cycle and once when the run ends.
///
/// The engine uses this to publish game state to the operator console.
pub trait CycleObserver: Send {
    /// Called after a cycle completes.
    fn on_cycle(&mut self, report: &CycleReport);

    /// Called once after the loop ends.
    fn on_finish(&mut self, result: &RunResult) {
        let _ = result;
    }
}

/// Observer that ignores everything.
pub struct NoOpObserver;

impl CycleObserver for NoOpObserver {
    fn on_cycle(&mut self, _report: &CycleReport) {}
}

// ---------------------------------------------------------------------------
// Event ids
// ---------------------------------------------------------------------------

/// Produces ids of the form `EVT-{yyyymmddHHMMSS}-{counter:04}`.
///
/// The counter makes ids unique within a run even when two events share a
/// timestamp second.
#[derive(Debug, Default)]
pub struct EventIdGenerator {
    counter: u64,
}

impl EventIdGenerator {
    /// The next id, stamped with `now`.
    pub fn next_id(&mut self, now: DateTime<Utc>) -> EventId {
        self.counter = self.counter.saturating_add(1);
        EventId::new(format!(
            "EVT-{}-{:04}",
            now.format("%Y%m%d%H%M%S"),
            self.counter
        ))
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Everything that happened to one event.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// 1-based cycle number.
    pub cycle: u64,
    /// The enriched event.
    pub event: EnrichedEvent,
    /// The resolved decision.
    pub decision: Decision,
    /// Score change caused by the decision.
    pub score: ScoreUpdate,
    /// Targets that were notified.
    pub routing: RoutingDecision,
    /// Per-target delivery outcomes.
    pub outcomes: Vec<NotificationOutcome>,
}

impl CycleReport {
    /// Number of targets that acknowledged delivery.
    pub fn delivered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.delivered).count()
    }
}

/// Result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// Why the run ended.
    pub end_reason: RunEndReason,
    /// Cycles completed.
    pub cycles: u64,
    /// Counters at the end.
    pub final_state: GameState,
    /// Game status at the end.
    pub status: GameStatus,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Timing and limits for the run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Time the operator has to decide.
    pub decision_timeout: Duration,
    /// Shortest pause between cycles.
    pub interval_min: Duration,
    /// Longest pause between cycles.
    pub interval_max: Duration,
    /// Stop after this many cycles (0 = unlimited).
    pub max_cycles: u64,
}

impl PipelineSettings {
    /// Settings from the `pipeline` and `arbiter` config sections.
    pub const fn from_config(config: &AlertConfig) -> Self {
        Self {
            decision_timeout: config.arbiter.decision_timeout(),
            interval_min: config.pipeline.interval_min(),
            interval_max: config.pipeline.interval_max(),
            max_cycles: config.pipeline.max_cycles,
        }
    }

    /// A random pause within the configured bounds.
    fn cycle_pause(&self) -> Duration {
        if self.interval_max <= self.interval_min {
            return self.interval_min;
        }
        let min = u64::try_from(self.interval_min.as_millis()).unwrap_or(u64::MAX);
        let max = u64::try_from(self.interval_max.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}

/// Drives events from classification to dispatch.
pub struct Pipeline {
    settings: PipelineSettings,
    classifier: Box<dyn Classifier>,
    enricher: Enricher,
    arbiter: Arc<DecisionArbiter>,
    router: ResponseRouter,
    dispatcher: Arc<dyn AlertDispatch>,
    tracker: ScoreTracker,
    ids: EventIdGenerator,
    cycles: u64,
}

impl core::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pipeline")
            .field("settings", &self.settings)
            .field("tracker", &self.tracker)
            .field("cycles", &self.cycles)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Assemble a pipeline from its parts.
    pub fn new(
        settings: PipelineSettings,
        classifier: Box<dyn Classifier>,
        enricher: Enricher,
        arbiter: Arc<DecisionArbiter>,
        dispatcher: Arc<dyn AlertDispatch>,
        tracker: ScoreTracker,
    ) -> Self {
        let router = ResponseRouter::new(arbiter.roster().primary().clone());
        Self {
            settings,
            classifier,
            enricher,
            arbiter,
            router,
            dispatcher,
            tracker,
            ids: EventIdGenerator::default(),
            cycles: 0,
        }
    }

    /// Assemble a pipeline with the default classifier and the zone table,
    /// timing, and initial score from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the zone table does not match the
    /// arbiter's roster.
    pub fn from_config(
        config: &AlertConfig,
        arbiter: Arc<DecisionArbiter>,
        dispatcher: Arc<dyn AlertDispatch>,
    ) -> Result<Self, ConfigError> {
        let zones = config.zone_table(arbiter.roster())?;
        let initial = GameState::new(
            config.game.initial_attacker_health,
            config.game.initial_panic_level,
        );
        Ok(Self::new(
            PipelineSettings::from_config(config),
            Box::new(LevelClassifier),
            Enricher::new(zones),
            arbiter,
            dispatcher,
            ScoreTracker::new(initial),
        ))
    }

    /// Current score counters.
    pub const fn game_state(&self) -> GameState {
        self.tracker.state()
    }

    /// Cycles completed so far.
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Take one raw event through the whole cycle.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the arbiter rejects the event or the
    /// game is already over.
    pub async fn process_event(&mut self, raw: RawEvent) -> Result<CycleReport, PipelineError> {
        let status = self.tracker.status();
        if status.is_terminal() {
            return Err(ScoreError::GameOver(status).into());
        }

        let now = Utc::now();
        let classification = self.classifier.classify(&raw);
        let event = Event {
            id: self.ids.next_id(now),
            timestamp: now,
            location: raw.location,
            threat_level: classification.threat_level,
            description: raw.description,
            source_tag: raw.source_tag,
            raw_payload: raw.raw_payload,
        };
        let enriched = self.enricher.enrich(event, classification.priority_score);
        info!(
            event_id = %enriched.id(),
            threat_level = %enriched.threat_level(),
            urgency = %enriched.urgency_tier,
            zone = %enriched.zone.name,
            source = %enriched.event.source_tag,
            "event received"
        );

        let started = Instant::now();
        let timeout = self
            .settings
            .decision_timeout
            .min(Duration::from_millis(MAX_DECISION_TIMEOUT_MS));
        let deadline = started.checked_add(timeout).unwrap_or(started);
        let decision = self.arbiter.request_decision(&enriched, deadline).await?;

        let score = self.tracker.apply_outcome(&enriched, &decision)?;
        let routing = self.router.route(&enriched, &decision);

        let payload = AlertPayload {
            event: enriched.clone(),
            decision: decision.clone(),
            game_state: score.current,
        };
        let outcomes = self.dispatcher.dispatch(&routing, &payload).await;
        let sent = outcomes.iter().filter(|o| o.delivered).count();
        for failed in outcomes.iter().filter(|o| !o.delivered) {
            warn!(
                event_id = %enriched.id(),
                target = %failed.target,
                error = failed.error.as_deref().unwrap_or("unknown"),
                "notification not delivered"
            );
        }
        info!(
            event_id = %enriched.id(),
            sent,
            total = outcomes.len(),
            "dispatch complete"
        );

        self.cycles = self.cycles.saturating_add(1);
        Ok(CycleReport {
            cycle: self.cycles,
            event: enriched,
            decision,
            score,
            routing,
            outcomes,
        })
    }

    /// Run cycles until a termination condition is met.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if a cycle fails unrecoverably.
    pub async fn run(
        &mut self,
        source: &mut dyn EventSource,
        control: &RunControl,
        observer: &mut dyn CycleObserver,
    ) -> Result<RunResult, PipelineError> {
        info!(
            max_cycles = self.settings.max_cycles,
            decision_timeout_ms = u64::try_from(self.settings.decision_timeout.as_millis())
                .unwrap_or(u64::MAX),
            attacker_health = self.tracker.state().attacker_health,
            panic_level = self.tracker.state().panic_level,
            "pipeline starting"
        );

        let reason = loop {
            if control.is_stop_requested() {
                info!("operator stop requested");
                break RunEndReason::OperatorStop;
            }
            match self.tracker.status() {
                GameStatus::Victory => break RunEndReason::Victory,
                GameStatus::Defeat => break RunEndReason::Defeat,
                GameStatus::Ongoing => {}
            }

            let Some(raw) = source.next_event() else {
                info!("event source exhausted");
                break RunEndReason::SourceExhausted;
            };

            let report = self.process_event(raw).await?;
            control.record_cycle();
            observer.on_cycle(&report);

            match report.score.status {
                GameStatus::Victory => break RunEndReason::Victory,
                GameStatus::Defeat => break RunEndReason::Defeat,
                GameStatus::Ongoing => {}
            }
            if self.settings.max_cycles > 0 && self.cycles >= self.settings.max_cycles {
                info!(max_cycles = self.settings.max_cycles, "cycle limit reached");
                break RunEndReason::MaxCyclesReached;
            }

            let pause = self.settings.cycle_pause();
            if !pause.is_zero() {
                tokio::select! {
                    () = tokio::time::sleep(pause) => {}
                    () = control.stopped() => {}
                }
            }
        };

        control.set_end_reason(reason).await;
        let result = RunResult {
            end_reason: reason,
            cycles: self.cycles,
            final_state: self.tracker.state(),
            status: self.tracker.status(),
        };
        observer.on_finish(&result);
        Ok(result)
    }
}

/// Log the end of a run.
pub fn log_run_end(result: &RunResult) {
    info!(
        reason = %result.end_reason,
        cycles = result.cycles,
        attacker_health = result.final_state.attacker_health,
        panic_level = result.final_state.panic_level,
        status = ?result.status,
        "run ended"
    );
    if result.cycles == 0 {
        warn!("run ended before any event was processed");
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use hedgehog_types::{DecisionOrigin, ResponderId, ResponseQuality, Target};

    use super::*;
    use crate::arbiter::{AlertPublisher, HeadlessPublisher};
    use crate::test_support::{RecordingPublisher, selection};

    struct ScriptedSource(VecDeque<RawEvent>);

    impl ScriptedSource {
        fn new(events: &[(&str, &str)]) -> Self {
            Self(events.iter().map(|(loc, lvl)| raw(loc, lvl)).collect())
        }
    }

    impl EventSource for ScriptedSource {
        fn next_event(&mut self) -> Option<RawEvent> {
            self.0.pop_front()
        }
    }

    struct EndlessSource;

    impl EventSource for EndlessSource {
        fn next_event(&mut self) -> Option<RawEvent> {
            Some(raw("Station Square", "low"))
        }
    }

    #[derive(Default)]
    struct RecordingDispatch {
        sent: Mutex<Vec<(RoutingDecision, AlertPayload)>>,
    }

    impl AlertDispatch for RecordingDispatch {
        fn dispatch<'a>(
            &'a self,
            routing: &'a RoutingDecision,
            payload: &'a AlertPayload,
        ) -> BoxFuture<'a, Vec<NotificationOutcome>> {
            Box::pin(async move {
                self.sent
                    .lock()
                    .unwrap()
                    .push((routing.clone(), payload.clone()));
                routing
                    .targets
                    .iter()
                    .map(|t| match t {
                        Target::AuditLog => NotificationOutcome::delivered(t.clone()),
                        Target::Responder(_) => {
                            NotificationOutcome::failed(t.clone(), "connection refused")
                        }
                    })
                    .collect()
            })
        }
    }

    #[derive(Default)]
    struct CountingObserver {
        cycles: u64,
        finished: Option<RunResult>,
    }

    impl CycleObserver for CountingObserver {
        fn on_cycle(&mut self, _report: &CycleReport) {
            self.cycles += 1;
        }

        fn on_finish(&mut self, result: &RunResult) {
            self.finished = Some(result.clone());
        }
    }

    fn raw(location: &str, level: &str) -> RawEvent {
        RawEvent {
            location: location.to_owned(),
            threat_text: level.to_owned(),
            description: "Eggman robot spotted".to_owned(),
            source_tag: "RADAR".to_owned(),
            raw_payload: serde_json::json!({ "signal": 0.9 }),
        }
    }

    fn build(
        config: &AlertConfig,
        publisher: Arc<dyn AlertPublisher>,
    ) -> (Pipeline, Arc<DecisionArbiter>, Arc<RecordingDispatch>) {
        let roster = Arc::new(config.roster().unwrap());
        let arbiter = Arc::new(DecisionArbiter::new(roster, publisher));
        let dispatch = Arc::new(RecordingDispatch::default());
        let pipeline = Pipeline::from_config(
            config,
            Arc::clone(&arbiter),
            Arc::clone(&dispatch) as Arc<dyn AlertDispatch>,
        )
        .unwrap();
        (pipeline, arbiter, dispatch)
    }

    fn quiet_config() -> AlertConfig {
        let mut config = AlertConfig::default();
        config.pipeline.interval_min_ms = 0;
        config.pipeline.interval_max_ms = 0;
        config
    }

    #[test]
    fn event_ids_have_timestamp_and_counter() {
        let mut ids = EventIdGenerator::default();
        let now = DateTime::parse_from_rfc3339("2025-03-04T05:06:07Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(ids.next_id(now).as_str(), "EVT-20250304050607-0001");
        assert_eq!(ids.next_id(now).as_str(), "EVT-20250304050607-0002");
    }

    #[test]
    fn cycle_pause_stays_within_bounds() {
        let settings = PipelineSettings {
            decision_timeout: Duration::from_secs(1),
            interval_min: Duration::from_millis(50),
            interval_max: Duration::from_millis(80),
            max_cycles: 0,
        };
        for _ in 0..100 {
            let pause = settings.cycle_pause();
            assert!(pause >= settings.interval_min && pause <= settings.interval_max);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_cycle_scores_routes_and_dispatches() {
        let (mut pipeline, _arbiter, dispatch) =
            build(&quiet_config(), Arc::new(HeadlessPublisher));

        let report = pipeline
            .process_event(raw("Station Square", "critical"))
            .await
            .unwrap();

        assert_eq!(report.cycle, 1);
        assert_eq!(report.event.zone.name, "Station Square");
        assert_eq!(report.decision.origin, DecisionOrigin::ErrorFallback);
        assert_eq!(
            report.decision.chosen_responders,
            selection(&["Knuckles", "Sonic", "Tails"])
        );
        assert_eq!(report.score.current, GameState::new(100, 15));
        assert_eq!(report.routing.targets.len(), 4);
        assert!(report.routing.targets.contains(&Target::AuditLog));
        assert_eq!(report.delivered(), 1);
        assert_eq!(report.outcomes.len(), 4);

        let sent = dispatch.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.game_state, report.score.current);
        assert_eq!(sent[0].1.event.event.raw_payload["signal"], 0.9);
    }

    #[tokio::test(start_paused = true)]
    async fn human_decision_flows_through_the_cycle() {
        let publisher = Arc::new(RecordingPublisher::default());
        let (mut pipeline, arbiter, _dispatch) = build(&quiet_config(), publisher);

        let operator = async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            let pending = arbiter.pending_events().await;
            assert_eq!(pending.len(), 1);
            arbiter
                .submit_decision(&pending[0], selection(&["Knuckles"]))
                .await
                .unwrap()
        };
        let (report, outcome) =
            tokio::join!(pipeline.process_event(raw("Angel Island", "high")), operator);
        let report = report.unwrap();

        assert!(outcome.applied());
        assert_eq!(report.decision.origin, DecisionOrigin::Human);
        assert_eq!(report.score.quality, ResponseQuality::Optimal);
        assert_eq!(report.score.current, GameState::new(88, 0));
        let responders: Vec<&str> = report.routing.responders().map(ResponderId::as_str).collect();
        assert_eq!(responders, vec!["Knuckles"]);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_operator_times_out() {
        let publisher = Arc::new(RecordingPublisher::default());
        let (mut pipeline, _arbiter, _dispatch) = build(&quiet_config(), publisher);
        let started = Instant::now();

        let report = pipeline
            .process_event(raw("Nowhere Special", "medium"))
            .await
            .unwrap();

        assert_eq!(report.decision.origin, DecisionOrigin::Timeout);
        assert_eq!(report.event.zone.name, "Unknown");
        assert_eq!(report.decision.chosen_responders, selection(&["Sonic"]));
        assert_eq!(started.elapsed(), Duration::from_secs(40));
    }

    #[tokio::test(start_paused = true)]
    async fn run_until_source_exhausted() {
        let (mut pipeline, _arbiter, _dispatch) =
            build(&quiet_config(), Arc::new(HeadlessPublisher));
        let mut source = ScriptedSource::new(&[
            ("Green Hill Zone", "low"),
            ("Mystic Ruins", "medium"),
            ("Chemical Plant", "low"),
        ]);
        let control = RunControl::new();
        let mut observer = CountingObserver::default();

        let result = pipeline.run(&mut source, &control, &mut observer).await.unwrap();

        assert_eq!(result.end_reason, RunEndReason::SourceExhausted);
        assert_eq!(result.cycles, 3);
        assert_eq!(observer.cycles, 3);
        assert_eq!(observer.finished, Some(result.clone()));
        assert_eq!(control.cycles(), 3);
        assert_eq!(control.end_reason().await, Some(RunEndReason::SourceExhausted));
        // 2 + 4 + 2 panic from three automatic decisions.
        assert_eq!(result.final_state, GameState::new(100, 8));
    }

    #[tokio::test(start_paused = true)]
    async fn run_respects_cycle_limit() {
        let mut config = quiet_config();
        config.pipeline.max_cycles = 2;
        let (mut pipeline, _arbiter, _dispatch) = build(&config, Arc::new(HeadlessPublisher));

        let result = pipeline
            .run(&mut EndlessSource, &RunControl::new(), &mut NoOpObserver)
            .await
            .unwrap();
        assert_eq!(result.end_reason, RunEndReason::MaxCyclesReached);
        assert_eq!(result.cycles, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn run_ends_in_defeat_when_panic_maxes_out() {
        let mut config = quiet_config();
        config.game.initial_panic_level = 95;
        let (mut pipeline, _arbiter, _dispatch) = build(&config, Arc::new(HeadlessPublisher));
        let mut source = ScriptedSource::new(&[("G.U.N. HQ", "high"), ("G.U.N. HQ", "high")]);

        let result = pipeline
            .run(&mut source, &RunControl::new(), &mut NoOpObserver)
            .await
            .unwrap();
        assert_eq!(result.end_reason, RunEndReason::Defeat);
        assert_eq!(result.status, GameStatus::Defeat);
        assert_eq!(result.cycles, 1);
        assert_eq!(result.final_state.panic_level, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn run_does_nothing_when_already_over() {
        let mut config = quiet_config();
        config.game.initial_attacker_health = 0;
        let (mut pipeline, _arbiter, _dispatch) = build(&config, Arc::new(HeadlessPublisher));

        let result = pipeline
            .run(&mut EndlessSource, &RunControl::new(), &mut NoOpObserver)
            .await
            .unwrap();
        assert_eq!(result.end_reason, RunEndReason::Victory);
        assert_eq!(result.cycles, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn finished_game_refuses_events_without_alerting() {
        let mut config = quiet_config();
        config.game.initial_attacker_health = 0;
        let publisher = Arc::new(RecordingPublisher::default());
        let (mut pipeline, arbiter, dispatch) =
            build(&config, Arc::clone(&publisher) as Arc<dyn AlertPublisher>);
        let started = Instant::now();

        let result = pipeline.process_event(raw("Angel Island", "low")).await;

        assert!(matches!(
            result,
            Err(PipelineError::Score {
                source: ScoreError::GameOver(GameStatus::Victory)
            })
        ));
        assert!(publisher.notices().is_empty());
        assert!(arbiter.pending_events().await.is_empty());
        assert!(dispatch.sent.lock().unwrap().is_empty());
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(pipeline.cycles(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_timeout_is_capped_not_instant() {
        let publisher = Arc::new(RecordingPublisher::default());
        let (pipeline, _arbiter, _dispatch) = build(&quiet_config(), publisher);
        let mut pipeline = Pipeline {
            settings: PipelineSettings {
                decision_timeout: Duration::MAX,
                ..pipeline.settings
            },
            ..pipeline
        };
        let started = Instant::now();

        let report = pipeline
            .process_event(raw("Green Hill Zone", "low"))
            .await
            .unwrap();

        assert_eq!(report.decision.origin, DecisionOrigin::Timeout);
        assert_eq!(
            started.elapsed(),
            Duration::from_millis(MAX_DECISION_TIMEOUT_MS)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_interrupts_the_inter_cycle_pause() {
        let mut config = quiet_config();
        config.pipeline.interval_min_ms = 60_000;
        config.pipeline.interval_max_ms = 60_000;
        let (mut pipeline, _arbiter, _dispatch) = build(&config, Arc::new(HeadlessPublisher));
        let control = Arc::new(RunControl::new());
        let stopper = {
            let control = Arc::clone(&control);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                control.request_stop();
            })
        };
        let started = Instant::now();

        let result = pipeline
            .run(&mut EndlessSource, &control, &mut NoOpObserver)
            .await
            .unwrap();
        stopper.await.unwrap();

        assert_eq!(result.end_reason, RunEndReason::OperatorStop);
        assert_eq!(result.cycles, 1);
        assert!(started.elapsed() < Duration::from_secs(60));
    }
}
