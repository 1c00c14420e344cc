//! The retained message
//!
//! Every accepted publish replaces the registry's retained message. It keeps
//! the payload behind an `Arc` so replaying it to a late subscriber, or
//! handing it to asynchronous workers, never clones the payload itself.
//!
//! - `sequence`: 1-based count of publishes accepted by the registry
//! - `published_at`: wall-clock time the registry accepted the publish

use std::sync::Arc;

use chrono::{DateTime, Utc};

#[derive(Debug)]
pub struct Retained<M> {
    pub sequence: u64,
    pub published_at: DateTime<Utc>,
    pub payload: Arc<M>,
}

impl<M> Retained<M> {
    pub(crate) fn new(sequence: u64, payload: M) -> Self {
        Self {
            sequence,
            published_at: Utc::now(),
            payload: Arc::new(payload),
        }
    }

    pub fn payload(&self) -> &M {
        &self.payload
    }
}

impl<M> Clone for Retained<M> {
    fn clone(&self) -> Self {
        Self {
            sequence: self.sequence,
            published_at: self.published_at,
            payload: Arc::clone(&self.payload),
        }
    }
}
