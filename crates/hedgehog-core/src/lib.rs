//! Decision arbitration and response orchestration for the Hedgehog alert
//! processor.
//!
//! Each event flows through the same cycle: classify, enrich, arbitrate
//! (a human decision races a deadline), score, route, and dispatch.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `hedgehog-config.yaml` into
//!   strongly-typed structs, validated at load time.
//! - [`classifier`] -- [`Classifier`] trait and the default level classifier.
//! - [`roster`] -- The known responder set and the designated primary.
//! - [`enricher`] -- Zone table lookup and urgency derivation.
//! - [`escalation`] -- Deterministic responder choice for automatic decisions.
//! - [`arbiter`] -- [`DecisionArbiter`]: exactly-once resolution of human
//!   versus timeout.
//! - [`router`] -- Target selection for a resolved decision.
//! - [`score`] -- [`ScoreTracker`]: the bounded health / panic counters.
//! - [`control`] -- Shared stop flag and end reason for the run loop.
//! - [`pipeline`] -- The per-event cycle and the run loop.
//!
//! [`Classifier`]: classifier::Classifier
//! [`DecisionArbiter`]: arbiter::DecisionArbiter
//! [`ScoreTracker`]: score::ScoreTracker

pub mod arbiter;
pub mod classifier;
pub mod config;
pub mod control;
pub mod enricher;
pub mod escalation;
pub mod pipeline;
pub mod roster;
pub mod router;
pub mod score;

#[cfg(test)]
pub(crate) mod test_support;
