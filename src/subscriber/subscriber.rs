use crate::utils::error::BoxError;

/// Result of a single `update` call.
pub type UpdateResult = Result<(), BoxError>;

/// Receiver of messages published through a [`Registry`](crate::registry::Registry).
///
/// The registry keeps its own `Arc` to the subscriber and calls `update` once
/// per publish pass the subscriber belongs to. `update` runs on the
/// publishing thread (or on a blocking worker for `publish_async`) and never
/// under the registry lock, so it may call back into the same registry.
///
/// Errors and panics are caught by the registry and reported to the
/// publisher; they never stop delivery to the other subscribers.
pub trait Subscriber<M>: Send + Sync {
    fn update(&self, message: &M) -> UpdateResult;

    /// Label used in logs and delivery reports.
    ///
    /// The default is `type_name::<Self>()`, which is verbose for closures.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<M, F> Subscriber<M> for F
where
    F: Fn(&M) -> UpdateResult + Send + Sync,
{
    fn update(&self, message: &M) -> UpdateResult {
        self(message)
    }
}

/// A subscriber with an explicit name.
pub struct Named<S> {
    name: String,
    inner: S,
}

impl<S> Named<S> {
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<M, S> Subscriber<M> for Named<S>
where
    S: Subscriber<M>,
{
    fn update(&self, message: &M) -> UpdateResult {
        self.inner.update(message)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<S> std::fmt::Debug for Named<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Named").field("name", &self.name).finish()
    }
}

/// Wraps `inner` so it reports `name` instead of its type name.
pub fn named<S>(name: impl Into<String>, inner: S) -> Named<S> {
    Named {
        name: name.into(),
        inner,
    }
}
