//! Alert delivery for the Hedgehog alert processor.
//!
//! Once a decision is routed, every target (each chosen responder plus the
//! audit log) is notified concurrently. A failure for one target never
//! blocks or cancels the others; each target gets its own
//! [`NotificationOutcome`](hedgehog_types::NotificationOutcome).
//!
//! # Modules
//!
//! - [`directory`] -- Target to address lookup.
//! - [`transport`] -- The [`Transport`](transport::Transport) seam and the
//!   HTTP implementation.
//! - [`dispatcher`] -- [`NotificationDispatcher`](dispatcher::NotificationDispatcher):
//!   fan-out with per-delivery timeouts.

pub mod directory;
pub mod dispatcher;
pub mod transport;

pub use directory::ResponderDirectory;
pub use dispatcher::NotificationDispatcher;
pub use transport::{DeliveryError, HttpTransport, Transport};
