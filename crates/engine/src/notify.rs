//! Push side-channel seam.
//!
//! Delivery itself is delegated to an external gateway; the engine only knows
//! this trait. The implementation is picked once at process start from
//! configuration, never via a runtime flag.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

#[derive(Error, Debug)]
#[error("push delivery failed: {0}")]
pub struct PushError(pub String);

/// A single fan-out to one or more device tokens.
#[derive(Clone, Debug, PartialEq)]
pub struct PushMessage {
    pub tokens: Vec<String>,
    pub title: String,
    pub body: String,
    /// Key-value payload handed to the client verbatim.
    pub data: serde_json::Value,
}

/// Outcome of a delivery attempt.
///
/// `invalid_tokens` lists device tokens the gateway rejected as stale; the
/// engine prunes them from local storage after a failed attempt.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeliveryReport {
    pub invalid_tokens: Vec<String>,
}

pub trait PushGateway: Send + Sync {
    fn send(
        &self,
        message: PushMessage,
    ) -> Pin<Box<dyn Future<Output = Result<DeliveryReport, PushError>> + Send + '_>>;
}

/// Logs every payload instead of delivering it. Default for development.
#[derive(Debug, Default)]
pub struct LogGateway;

impl PushGateway for LogGateway {
    fn send(
        &self,
        message: PushMessage,
    ) -> Pin<Box<dyn Future<Output = Result<DeliveryReport, PushError>> + Send + '_>> {
        Box::pin(async move {
            tracing::info!(
                tokens = message.tokens.len(),
                title = %message.title,
                body = %message.body,
                "push (log gateway)"
            );
            Ok(DeliveryReport::default())
        })
    }
}

/// Swallows everything. For deployments with push disabled.
#[derive(Debug, Default)]
pub struct NullGateway;

impl PushGateway for NullGateway {
    fn send(
        &self,
        _message: PushMessage,
    ) -> Pin<Box<dyn Future<Output = Result<DeliveryReport, PushError>> + Send + '_>> {
        Box::pin(async { Ok(DeliveryReport::default()) })
    }
}
