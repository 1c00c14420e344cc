//! Per-publish delivery report
//!
//! A `DeliveryReport` lists, in snapshot order, every subscriber the pass
//! targeted and whether its `update` succeeded. It serializes to JSON so a
//! caller can print or ship it as-is.

use serde::Serialize;

use super::handle::SubscriberId;
use crate::utils::error::{DeliveryError, DeliveryErrorKind, RegistryError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Delivered,
    Failed { error: DeliveryErrorKind },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub subscriber: SubscriberId,
    pub name: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    /// Sequence number of the published message.
    pub sequence: u64,
    /// Registry generation at the instant the snapshot was taken.
    pub generation: u64,
    pub deliveries: Vec<Delivery>,
}

impl DeliveryReport {
    pub(crate) fn new(sequence: u64, generation: u64, capacity: usize) -> Self {
        Self {
            sequence,
            generation,
            deliveries: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn record(
        &mut self,
        subscriber: SubscriberId,
        name: &str,
        result: Result<(), DeliveryErrorKind>,
    ) {
        let outcome = match result {
            Ok(()) => Outcome::Delivered,
            Err(error) => Outcome::Failed { error },
        };
        self.deliveries.push(Delivery {
            subscriber,
            name: name.to_string(),
            outcome,
        });
    }

    /// Number of subscribers in the snapshot.
    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    /// Subscribers targeted by the pass, in delivery order.
    pub fn recipients(&self) -> Vec<SubscriberId> {
        self.deliveries.iter().map(|d| d.subscriber).collect()
    }

    /// Subscribers whose `update` succeeded.
    pub fn delivered(&self) -> Vec<SubscriberId> {
        self.deliveries
            .iter()
            .filter(|d| d.outcome == Outcome::Delivered)
            .map(|d| d.subscriber)
            .collect()
    }

    pub fn failures(&self) -> Vec<DeliveryError> {
        self.deliveries
            .iter()
            .filter_map(|d| match &d.outcome {
                Outcome::Delivered => None,
                Outcome::Failed { error } => Some(DeliveryError {
                    subscriber: d.subscriber,
                    name: d.name.clone(),
                    kind: error.clone(),
                }),
            })
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.deliveries
            .iter()
            .all(|d| d.outcome == Outcome::Delivered)
    }

    /// Turns collected subscriber failures into `RegistryError::Delivery`.
    pub fn into_result(self) -> Result<Self, RegistryError> {
        let failures = self.failures();
        if failures.is_empty() {
            Ok(self)
        } else {
            Err(RegistryError::Delivery(failures))
        }
    }
}
