//! Backpressure buffer: bounded hand-off between producer and consumer
//! execution contexts.
//!
//! The producer side runs on its own task and suspends on
//! `send().await` when the queue is full — the pipeline's sole
//! flow-control point. Nothing is ever dropped; a full buffer only
//! delays delivery.

use futures::StreamExt;
use pulseline_types::entity::Entity;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::stream::EntityStream;

/// Default queue bound when the pipeline config does not set one.
pub const DEFAULT_CAPACITY: usize = 256;

/// Interpose a bounded queue between `input` and the returned stream.
///
/// A dedicated task drains `input` into the queue so a slow consumer
/// cannot stall the producer's context beyond the queue bound, and a
/// fast producer cannot grow memory past `capacity` in-flight items.
/// Dropping the returned stream stops the producer task promptly.
pub fn spawn_buffered<E: Entity>(input: EntityStream<E>, capacity: usize) -> EntityStream<E> {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    tokio::spawn(async move {
        let mut input = input;
        while let Some(item) = input.next().await {
            let terminal = item.is_err();
            if tx.send(item).await.is_err() {
                // Receiver gone: unsubscribe upstream by dropping it.
                break;
            }
            if terminal {
                break;
            }
        }
    });
    ReceiverStream::new(rx).boxed()
}
