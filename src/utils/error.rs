//! Error types used by the registry.
//!
//! Structural failures (closed registry, unknown handle in strict mode) are
//! returned synchronously by the operation that hit them. Subscriber failures
//! are collected per publish into [`DeliveryError`] values and only surface as
//! [`RegistryError::Delivery`] when the publisher asks for them.

use serde::Serialize;
use thiserror::Error;

use crate::registry::SubscriberId;

/// Error type a subscriber may return from `update`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Returned by strict-mode unsubscribe for an id this registry does not hold.
    #[error("subscriber {0} is not registered")]
    UnknownHandle(SubscriberId),

    /// The owning publisher has torn the registry down.
    #[error("registry is closed")]
    Closed,

    /// `publish_async` was called outside a Tokio runtime.
    #[error("asynchronous delivery requires a Tokio runtime")]
    NoRuntime,

    /// One or more subscribers failed during a publish pass.
    #[error("{} subscriber(s) failed to receive the message", .0.len())]
    Delivery(Vec<DeliveryError>),
}

/// Failure of a single subscriber during one publish pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("subscriber {subscriber} ({name}): {kind}")]
pub struct DeliveryError {
    pub subscriber: SubscriberId,
    pub name: String,
    pub kind: DeliveryErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum DeliveryErrorKind {
    /// `update` returned an error.
    #[error("update failed: {0}")]
    Failed(String),

    /// `update` panicked; the panic was caught.
    #[error("update panicked: {0}")]
    Panicked(String),

    /// The asynchronous worker went away before reporting back.
    #[error("delivery worker stopped")]
    WorkerGone,
}

impl DeliveryErrorKind {
    /// Renders a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let reason = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        DeliveryErrorKind::Panicked(reason)
    }
}
