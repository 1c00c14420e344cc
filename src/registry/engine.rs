//! Registry engine
//!
//! This module contains the subscriber registry responsible for:
//! - keeping the ordered set of active subscriptions for one publisher
//! - handing out `SubscriberHandle`s and honoring their teardown
//! - fanning a published message out to every subscriber, synchronously
//!   (`publish`) or through per-subscriber workers (`publish_async`)
//! - retaining the last published message for late joiners
//!
//! Concurrency and usage notes:
//! - All structural state lives behind one `Mutex`. It is held only to copy
//!   or mutate that state and never while subscriber code runs, so a
//!   subscriber may subscribe, unsubscribe or publish from inside `update`.
//! - `publish` delivers to a snapshot taken under the lock. Subscriptions
//!   made or removed during the pass take effect from the next publish.
//! - Share a registry across threads with `Arc<Registry<M>>`.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tracing::{debug, warn};
use uuid::Uuid;

use super::dispatch::{Mailbox, PendingDelivery, Reply};
use super::handle::{SubscriberHandle, SubscriberId};
use super::message::Retained;
use super::report::DeliveryReport;
use crate::config::RegistrySettings;
use crate::subscriber::Subscriber;
use crate::utils::error::{DeliveryErrorKind, RegistryError};

pub(crate) struct Entry<M> {
    id: SubscriberId,
    name: String,
    subscriber: Arc<dyn Subscriber<M>>,
    mailbox: Mutex<Option<Mailbox<M>>>,
}

impl<M> Entry<M>
where
    M: Send + Sync + 'static,
{
    /// Queues `message` to this subscriber's worker, spawning a fresh worker
    /// on `runtime` when there is none or the previous one has stopped.
    fn enqueue(&self, runtime: &Handle, message: &Arc<M>) -> Option<Reply> {
        let mut slot = self.mailbox.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(mailbox) = slot.as_ref().filter(|m| !m.is_closed()) {
            if let Some(reply) = mailbox.enqueue(Arc::clone(message)) {
                return Some(reply);
            }
        }

        if slot.is_some() {
            debug!(subscriber = %self.id, name = %self.name, "respawning delivery worker");
        }
        let mailbox = slot.insert(Mailbox::spawn(
            runtime,
            self.id,
            Arc::clone(&self.subscriber),
        ));
        mailbox.enqueue(Arc::clone(message))
    }
}

struct State<M> {
    /// Sorted by id, which is also subscription order.
    entries: Vec<Arc<Entry<M>>>,
    next_id: u64,
    generation: u64,
    sequence: u64,
    last_message: Option<Retained<M>>,
    closed: bool,
}

pub(crate) struct Shared<M> {
    id: Uuid,
    settings: RegistrySettings,
    state: Mutex<State<M>>,
}

impl<M> Shared<M> {
    fn new(settings: RegistrySettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            settings,
            state: Mutex::new(State {
                entries: Vec::new(),
                next_id: 0,
                generation: 0,
                sequence: 0,
                last_message: None,
                closed: false,
            }),
        }
    }

    // No subscriber code runs under this lock, so a poisoned guard still
    // holds consistent state.
    fn lock(&self) -> MutexGuard<'_, State<M>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn contains(&self, id: SubscriberId) -> bool {
        self.lock()
            .entries
            .binary_search_by_key(&id, |e| e.id)
            .is_ok()
    }

    /// Removes `id` if present. Returns whether anything was removed.
    pub(crate) fn remove(&self, id: SubscriberId) -> bool {
        let removed = {
            let mut state = self.lock();
            match state.entries.binary_search_by_key(&id, |e| e.id) {
                Ok(index) => {
                    state.generation += 1;
                    Some(state.entries.remove(index))
                }
                Err(_) => None,
            }
        };

        // Dropped outside the lock: the subscriber's own Drop may call back in.
        match removed {
            Some(entry) => {
                debug!(registry = %self.settings.name, subscriber = %id, name = %entry.name, "unsubscribed");
                true
            }
            None => false,
        }
    }

    /// Detaches every subscriber without invoking it. Idempotent.
    pub(crate) fn close(&self) -> usize {
        let detached = {
            let mut state = self.lock();
            if state.closed {
                return 0;
            }
            state.closed = true;
            state.generation += 1;
            std::mem::take(&mut state.entries)
        };

        let count = detached.len();
        debug!(registry = %self.settings.name, detached = count, "registry closed");
        count
    }
}

/// Runs one `update`, turning errors and panics into a `DeliveryErrorKind`.
pub(crate) fn invoke<M>(subscriber: &dyn Subscriber<M>, message: &M) -> Result<(), DeliveryErrorKind> {
    match panic::catch_unwind(AssertUnwindSafe(|| subscriber.update(message))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(DeliveryErrorKind::Failed(e.to_string())),
        Err(payload) => Err(DeliveryErrorKind::from_panic(payload)),
    }
}

/// Subscriber registry owned by one publisher.
///
/// Dropping the registry closes it: remaining subscribers are detached
/// without being notified and outstanding handles become `Detached`.
pub struct Registry<M> {
    shared: Arc<Shared<M>>,
}

impl<M> Registry<M>
where
    M: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::with_settings(RegistrySettings::default())
    }

    pub fn with_settings(settings: RegistrySettings) -> Self {
        Self {
            shared: Arc::new(Shared::new(settings)),
        }
    }

    /// Identity of this registry; every handle it issues carries it.
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.shared.settings
    }

    /// Subscribes `subscriber`, which the registry takes ownership of.
    ///
    /// The subscription is eligible from the next `publish`; a pass already
    /// running never reaches it. Subscribing the same logical subscriber twice
    /// yields two independent subscriptions.
    pub fn subscribe<S>(&self, subscriber: S) -> Result<SubscriberHandle<M>, RegistryError>
    where
        S: Subscriber<M> + 'static,
    {
        self.subscribe_shared(Arc::new(subscriber))
    }

    /// Subscribes a subscriber the caller keeps its own reference to.
    pub fn subscribe_shared(
        &self,
        subscriber: Arc<dyn Subscriber<M>>,
    ) -> Result<SubscriberHandle<M>, RegistryError> {
        let name = subscriber.name().to_string();

        let (id, replay) = {
            let mut state = self.shared.lock();
            if state.closed {
                return Err(RegistryError::Closed);
            }

            state.next_id += 1;
            let id = SubscriberId::from_raw(state.next_id);
            state.entries.push(Arc::new(Entry {
                id,
                name: name.clone(),
                subscriber: Arc::clone(&subscriber),
                mailbox: Mutex::new(None),
            }));
            state.generation += 1;

            let replay = if self.shared.settings.replay_last {
                state.last_message.clone()
            } else {
                None
            };
            (id, replay)
        };

        debug!(registry = %self.shared.settings.name, subscriber = %id, name = %name, "subscribed");

        if let Some(retained) = replay {
            if let Err(kind) = invoke(subscriber.as_ref(), retained.payload()) {
                warn!(
                    registry = %self.shared.settings.name,
                    subscriber = %id,
                    "replay of message {} failed: {kind}",
                    retained.sequence
                );
            }
        }

        Ok(SubscriberHandle::new(
            id,
            self.shared.id,
            Arc::downgrade(&self.shared),
        ))
    }

    /// Removes the subscription behind `handle`.
    ///
    /// Unknown, already detached and foreign handles are a no-op unless the
    /// registry runs with `strict_unsubscribe`, in which case they yield
    /// `RegistryError::UnknownHandle`. Safe to call from inside `update`.
    pub fn unsubscribe(&self, handle: &SubscriberHandle<M>) -> Result<(), RegistryError> {
        if !handle.belongs_to(self.shared.id) {
            return self.not_registered(handle.id());
        }
        self.unsubscribe_id(handle.id())
    }

    /// Same as [`Registry::unsubscribe`], by id.
    pub fn unsubscribe_id(&self, id: SubscriberId) -> Result<(), RegistryError> {
        if self.shared.remove(id) {
            Ok(())
        } else {
            self.not_registered(id)
        }
    }

    fn not_registered(&self, id: SubscriberId) -> Result<(), RegistryError> {
        if self.shared.settings.strict_unsubscribe {
            Err(RegistryError::UnknownHandle(id))
        } else {
            debug!(registry = %self.shared.settings.name, subscriber = %id, "unsubscribe of unknown subscriber ignored");
            Ok(())
        }
    }

    /// Publishes `message` to every subscriber active right now.
    ///
    /// Delivery happens on the calling thread in subscription order and
    /// returns once every subscriber in the snapshot has been called. A
    /// failing or panicking subscriber is recorded in the report and does not
    /// stop delivery to the others.
    pub fn publish(&self, message: M) -> Result<DeliveryReport, RegistryError> {
        let (retained, generation, snapshot) = {
            let mut state = self.shared.lock();
            if state.closed {
                return Err(RegistryError::Closed);
            }

            state.sequence += 1;
            let retained = Retained::new(state.sequence, message);
            state.last_message = Some(retained.clone());
            (retained, state.generation, state.entries.clone())
        };

        debug!(
            registry = %self.shared.settings.name,
            sequence = retained.sequence,
            subscribers = snapshot.len(),
            "publishing"
        );

        let mut report = DeliveryReport::new(retained.sequence, generation, snapshot.len());
        for entry in &snapshot {
            let result = invoke(entry.subscriber.as_ref(), retained.payload());
            if let Err(kind) = &result {
                warn!(
                    registry = %self.shared.settings.name,
                    subscriber = %entry.id,
                    name = %entry.name,
                    "delivery failed: {kind}"
                );
            }
            report.record(entry.id, &entry.name, result);
        }

        Ok(report)
    }

    /// Queues `message` to every subscriber active right now and returns
    /// without waiting for delivery.
    ///
    /// Each subscriber's `update` calls happen in publish order, one at a time;
    /// different subscribers progress independently. Await the returned
    /// [`PendingDelivery`] for the report. Must be called from within a Tokio
    /// runtime.
    pub fn publish_async(&self, message: M) -> Result<PendingDelivery, RegistryError> {
        let runtime = Handle::try_current().map_err(|_| RegistryError::NoRuntime)?;

        let pending = {
            let mut state = self.shared.lock();
            if state.closed {
                return Err(RegistryError::Closed);
            }

            state.sequence += 1;
            let retained = Retained::new(state.sequence, message);
            state.last_message = Some(retained.clone());

            // Enqueue under the lock so mailboxes see publishes in sequence order.
            let mut pending = PendingDelivery::new(retained.sequence, state.generation);
            for entry in &state.entries {
                pending.push(
                    entry.id,
                    entry.name.clone(),
                    entry.enqueue(&runtime, &retained.payload),
                );
            }
            pending
        };

        debug!(
            registry = %self.shared.settings.name,
            sequence = pending.sequence(),
            subscribers = pending.len(),
            "queued"
        );

        Ok(pending)
    }

    /// Live subscriber count; may change as soon as it is read.
    pub fn subscriber_count(&self) -> usize {
        self.shared.lock().entries.len()
    }

    /// Incremented by every subscribe, effective unsubscribe and close.
    pub fn current_generation(&self) -> u64 {
        self.shared.lock().generation
    }

    /// The most recently published message, if any.
    pub fn last_message(&self) -> Option<Retained<M>> {
        self.shared.lock().last_message.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// Tears the registry down. Later `subscribe` and `publish` calls fail
    /// with `RegistryError::Closed`. Returns how many subscribers were
    /// detached.
    pub fn close(&self) -> usize {
        self.shared.close()
    }
}

impl<M> Default for Registry<M>
where
    M: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Drop for Registry<M> {
    fn drop(&mut self) {
        self.shared.close();
    }
}

impl<M> std::fmt::Debug for Registry<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("Registry")
            .field("id", &self.shared.id)
            .field("name", &self.shared.settings.name)
            .field("subscribers", &state.entries.len())
            .field("generation", &state.generation)
            .field("closed", &state.closed)
            .finish()
    }
}
