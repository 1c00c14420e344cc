//! Asynchronous fan-out
//!
//! Each subscriber that takes part in `publish_async` gets one mailbox: an
//! unbounded FIFO queue drained by a single worker task. Jobs are enqueued
//! under the registry lock in publish order, so a subscriber always sees
//! message N before message N+1. `update` itself runs on the blocking pool.
//!
//! ```text
//!    publish_async(msg)
//!        │                 (Arc-clone of the payload per subscriber)
//!        ├──────────► [mailbox S1] ─► worker S1 ─► update()
//!        ├──────────► [mailbox S2] ─► worker S2 ─► update()
//!        └──────────► [mailbox SN] ─► worker SN ─► update()
//! ```
//!
//! The worker holds the subscriber, not the registry entry. Removing the
//! entry drops the mailbox sender; the worker drains what is already queued
//! and exits. A worker dies with the runtime it was spawned on; the next
//! `publish_async` respawns it on the caller's runtime.

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;

use futures::future::join_all;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::engine::invoke;
use super::handle::SubscriberId;
use super::report::DeliveryReport;
use crate::subscriber::Subscriber;
use crate::utils::error::DeliveryErrorKind;

pub(crate) type Reply = oneshot::Receiver<Result<(), DeliveryErrorKind>>;

pub(crate) struct Job<M> {
    message: Arc<M>,
    reply: oneshot::Sender<Result<(), DeliveryErrorKind>>,
}

pub(crate) struct Mailbox<M> {
    sender: mpsc::UnboundedSender<Job<M>>,
}

impl<M> Mailbox<M>
where
    M: Send + Sync + 'static,
{
    /// Spawns the worker for one subscriber on `runtime`.
    pub(crate) fn spawn(
        runtime: &Handle,
        id: SubscriberId,
        subscriber: Arc<dyn Subscriber<M>>,
    ) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job<M>>();

        runtime.spawn(async move {
            while let Some(Job { message, reply }) = receiver.recv().await {
                let sub = Arc::clone(&subscriber);
                let result =
                    match tokio::task::spawn_blocking(move || invoke(&*sub, &*message))
                        .await
                    {
                        Ok(result) => result,
                        Err(e) => Err(DeliveryErrorKind::Panicked(e.to_string())),
                    };
                // The publisher may have stopped waiting.
                let _ = reply.send(result);
            }
            debug!(subscriber = %id, "delivery worker stopped");
        });

        Self { sender }
    }

    /// True once the worker is gone, e.g. because its runtime shut down.
    pub(crate) fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Queues `message`; the receiver resolves once `update` has returned.
    pub(crate) fn enqueue(&self, message: Arc<M>) -> Option<Reply> {
        let (reply, rx) = oneshot::channel();
        self.sender.send(Job { message, reply }).ok().map(|_| rx)
    }
}

/// Delivery of one `publish_async` call, already queued to every subscriber.
///
/// Awaiting it yields the report once every queued `update` has returned.
/// Dropping it abandons the wait only: queued invocations still run.
#[must_use = "the report is only available by awaiting PendingDelivery"]
pub struct PendingDelivery {
    sequence: u64,
    generation: u64,
    pending: Vec<(SubscriberId, String, Option<Reply>)>,
}

impl PendingDelivery {
    pub(crate) fn new(sequence: u64, generation: u64) -> Self {
        Self {
            sequence,
            generation,
            pending: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, id: SubscriberId, name: String, reply: Option<Reply>) {
        self.pending.push((id, name, reply));
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Number of subscribers the message was queued to.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    async fn wait(self) -> DeliveryReport {
        let mut report = DeliveryReport::new(self.sequence, self.generation, self.pending.len());
        let (meta, replies): (Vec<_>, Vec<_>) = self
            .pending
            .into_iter()
            .map(|(id, name, reply)| ((id, name), reply))
            .unzip();

        let results = join_all(replies.into_iter().map(|reply| async move {
            match reply {
                Some(rx) => rx.await.unwrap_or(Err(DeliveryErrorKind::WorkerGone)),
                None => Err(DeliveryErrorKind::WorkerGone),
            }
        }))
        .await;

        for ((id, name), result) in meta.into_iter().zip(results) {
            report.record(id, &name, result);
        }
        report
    }
}

impl IntoFuture for PendingDelivery {
    type Output = DeliveryReport;
    type IntoFuture = Pin<Box<dyn Future<Output = DeliveryReport> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}

impl std::fmt::Debug for PendingDelivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingDelivery")
            .field("sequence", &self.sequence)
            .field("generation", &self.generation)
            .field("subscribers", &self.pending.len())
            .finish()
    }
}
