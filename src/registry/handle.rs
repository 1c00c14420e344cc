//! Subscription handles
//!
//! A `SubscriberHandle` is the caller's side of one subscription. It carries
//! the subscription's id, the identity of the registry that issued it and a
//! weak back-reference used for teardown. It never keeps the registry alive.
//!
//! Dropping an active handle unsubscribes it. `forget` opts out of that and
//! leaves the subscription in place until `Registry::unsubscribe_id` or the
//! registry is closed.

use std::fmt;
use std::sync::Weak;

use serde::Serialize;
use uuid::Uuid;

use super::engine::Shared;

/// Identity of one subscription, unique within the registry that issued it.
///
/// Ids come from a per-registry counter and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SubscriberId(u64);

impl SubscriberId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a subscription. `Detached` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Active,
    Detached,
}

#[must_use = "dropping a SubscriberHandle unsubscribes it"]
pub struct SubscriberHandle<M> {
    id: SubscriberId,
    registry_id: Uuid,
    shared: Weak<Shared<M>>,
    armed: bool,
}

impl<M> SubscriberHandle<M> {
    pub(crate) fn new(id: SubscriberId, registry_id: Uuid, shared: Weak<Shared<M>>) -> Self {
        Self {
            id,
            registry_id,
            shared,
            armed: true,
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Id of the registry that issued this handle.
    pub fn registry_id(&self) -> Uuid {
        self.registry_id
    }

    pub(crate) fn belongs_to(&self, registry_id: Uuid) -> bool {
        self.registry_id == registry_id
    }

    /// Current state. Once `Detached`, always `Detached`.
    pub fn state(&self) -> HandleState {
        match self.shared.upgrade() {
            Some(shared) if shared.contains(self.id) => HandleState::Active,
            _ => HandleState::Detached,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == HandleState::Active
    }

    /// Unsubscribes and consumes the handle. A no-op when already detached.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Keeps the subscription alive after the handle is gone.
    ///
    /// The returned id can still be passed to `Registry::unsubscribe_id`.
    pub fn forget(mut self) -> SubscriberId {
        self.armed = false;
        self.id
    }
}

impl<M> Drop for SubscriberHandle<M> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(shared) = self.shared.upgrade() {
            shared.remove(self.id);
        }
    }
}

impl<M> fmt::Debug for SubscriberHandle<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberHandle")
            .field("id", &self.id)
            .field("registry_id", &self.registry_id)
            .field("armed", &self.armed)
            .finish()
    }
}
