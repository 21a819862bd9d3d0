//! How a payload reaches one address.
//!
//! [`Transport`] returns a boxed future so the dispatcher can hold it as a
//! trait object; [`HttpTransport`] posts the payload as JSON.

use std::time::Duration;

use futures::future::BoxFuture;
use hedgehog_types::AlertPayload;

/// A single delivery failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// No address is configured for the target.
    #[error("no address configured for {0}")]
    NoAddress(String),

    /// The delivery did not finish in time.
    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),

    /// The request could not be sent.
    #[error("request failed: {0}")]
    Request(String),

    /// The endpoint answered with a non-success status.
    #[error("endpoint returned {0}")]
    Status(u16),

    /// The HTTP client could not be built.
    #[error("http client setup failed: {0}")]
    Client(String),
}

/// Delivers a payload to one address.
pub trait Transport: Send + Sync {
    /// Send `payload` to `address`.
    fn deliver<'a>(
        &'a self,
        address: &'a str,
        payload: &'a AlertPayload,
    ) -> BoxFuture<'a, Result<(), DeliveryError>>;
}

/// Posts payloads as JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Client`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Client(e.to_string()))?;
        Ok(Self { client, timeout })
    }
}

impl Transport for HttpTransport {
    fn deliver<'a>(
        &'a self,
        address: &'a str,
        payload: &'a AlertPayload,
    ) -> BoxFuture<'a, Result<(), DeliveryError>> {
        Box::pin(async move {
            let response = self
                .client
                .post(address)
                .json(payload)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        DeliveryError::Timeout(self.timeout)
                    } else {
                        DeliveryError::Request(e.to_string())
                    }
                })?;
            let status = response.status();
            if !status.is_success() {
                return Err(DeliveryError::Status(status.as_u16()));
            }
            Ok(())
        })
    }
}
