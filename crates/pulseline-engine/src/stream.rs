//! Entity stream type and connectable multicast handle.

use futures::stream::{BoxStream, StreamExt};
use pulseline_types::entity::Entity;
use pulseline_types::error::StageError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

/// The unit of flow through a pipeline: a lazily-produced sequence of
/// entities. An `Err` item is the stream's terminal error event;
/// consumers stop at the first one.
pub type EntityStream<E> = BoxStream<'static, Result<E, StageError>>;

/// Box an iterator of entities into an [`EntityStream`] (finite,
/// pull-style sources).
pub fn from_iter<E, I>(items: I) -> EntityStream<E>
where
    E: Entity,
    I: IntoIterator<Item = E>,
    I::IntoIter: Send + 'static,
{
    futures::stream::iter(items.into_iter().map(Ok)).boxed()
}

/// A multicast stream handle that produces nothing until connected.
///
/// Subscribers attach first, then [`connect`](Self::connect) starts one
/// driver task that forwards every upstream item to every subscriber in
/// attach order. All subscribers observe the same items in the same
/// relative order; the slowest subscriber applies backpressure to the
/// rest. A subscriber that drops its stream is skipped from then on;
/// when every subscriber is gone the driver stops consuming upstream.
pub struct ConnectableStream<E: Entity> {
    inner: EntityStream<E>,
    subscribers: Vec<mpsc::Sender<Result<E, StageError>>>,
}

impl<E: Entity> ConnectableStream<E> {
    /// Wrap an upstream. No items flow until [`connect`](Self::connect).
    #[must_use]
    pub fn new(inner: EntityStream<E>) -> Self {
        Self {
            inner,
            subscribers: Vec::new(),
        }
    }

    /// Attach a subscriber with its own bounded buffer.
    ///
    /// Must be called before [`connect`](Self::connect); subscribers
    /// attached afterwards would miss items, so the API makes that
    /// impossible by consuming `self` on connect.
    pub fn subscribe(&mut self, capacity: usize) -> EntityStream<E> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.subscribers.push(tx);
        ReceiverStream::new(rx).boxed()
    }

    /// Start the driver task. Terminates when upstream ends, after a
    /// terminal error has been forwarded, or when no subscriber is left.
    pub fn connect(self) -> JoinHandle<()> {
        let mut inner = self.inner;
        let subscribers = self.subscribers;
        tokio::spawn(async move {
            while let Some(item) = inner.next().await {
                let terminal = item.is_err();
                let mut delivered = false;
                for tx in &subscribers {
                    if tx.send(item.clone()).await.is_ok() {
                        delivered = true;
                    }
                }
                if terminal || !delivered {
                    break;
                }
            }
        })
    }

    /// Number of attached subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
