//! Group-by-key fan-out/fan-in with per-key batching.
//!
//! Splits a stream into independent keyed sub-streams, feeds each
//! through a batch-level operator, and merges the results back into
//! one stream. Within a key, relative order is preserved; across keys,
//! interleaving is arbitrary.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use pulseline_types::entity::Entity;
use pulseline_types::error::StageError;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_stream::wrappers::ReceiverStream;

use crate::lifecycle::ProgressSink;
use crate::stream::EntityStream;

/// Bound of the merged output channel shared by all key workers.
const MERGE_CAPACITY: usize = 64;

/// Batch-level operator applied once per full (or final partial) batch
/// of one key's sub-stream.
///
/// A key the operator has no specialized processing for must return the
/// batch unchanged — items are never dropped on the grouped path.
pub trait BatchOperator<E: Entity>: Send + Sync {
    /// Process one batch of entities sharing `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StageError`] when the batch could not be processed;
    /// the framework logs it and passes the original batch through
    /// unchanged, so one failing batch never destroys a key's (or a
    /// sibling key's) progress.
    fn process(&self, key: &str, batch: Vec<E>) -> Result<Vec<E>, StageError>;
}

/// Fan a stream out by key, apply `operator` to fixed-size batches per
/// key, and fan the results back in.
///
/// Keys are discovered lazily; a sub-stream (and its worker task) is
/// created the first time a key appears. `key_fn` must be pure — it is
/// called exactly once per entity. Per-element progress is reported
/// around each batch call, not around the whole group.
pub fn group_by_key<E, K>(
    input: EntityStream<E>,
    key_fn: K,
    batch_size: usize,
    operator: Arc<dyn BatchOperator<E>>,
    progress: Option<Arc<dyn ProgressSink>>,
) -> EntityStream<E>
where
    E: Entity,
    K: Fn(&E) -> String + Send + 'static,
{
    let batch_size = batch_size.max(1);
    let (out_tx, out_rx) = mpsc::channel(MERGE_CAPACITY);

    tokio::spawn(async move {
        let mut input = input;
        let mut groups: HashMap<String, mpsc::Sender<E>> = HashMap::new();
        let mut workers = JoinSet::new();

        while let Some(item) = input.next().await {
            match item {
                Ok(entity) => {
                    let key = key_fn(&entity);
                    if !groups.contains_key(&key) {
                        tracing::debug!(key = %key, "new group discovered");
                        let (tx, rx) = mpsc::channel(batch_size);
                        workers.spawn(group_worker(
                            key.clone(),
                            rx,
                            batch_size,
                            operator.clone(),
                            out_tx.clone(),
                            progress.clone(),
                        ));
                        groups.insert(key.clone(), tx);
                    }
                    let Some(tx) = groups.get(&key) else { break };
                    if tx.send(entity).await.is_err() {
                        // Worker gone means the output side is closed.
                        break;
                    }
                }
                Err(err) => {
                    out_tx.send(Err(err)).await.ok();
                    break;
                }
            }
        }

        // Closing the per-key senders flushes the final partial batches.
        drop(groups);
        while workers.join_next().await.is_some() {}
    });

    ReceiverStream::new(out_rx).boxed()
}

async fn group_worker<E: Entity>(
    key: String,
    rx: mpsc::Receiver<E>,
    batch_size: usize,
    operator: Arc<dyn BatchOperator<E>>,
    out: mpsc::Sender<Result<E, StageError>>,
    progress: Option<Arc<dyn ProgressSink>>,
) {
    let mut batches = ReceiverStream::new(rx).chunks(batch_size);
    while let Some(batch) = batches.next().await {
        let ids: Vec<String> = batch.iter().map(|e| e.id().to_string()).collect();
        if let Some(p) = &progress {
            for id in &ids {
                p.element_started(id);
            }
        }

        let fallback = batch.clone();
        let processed = match operator.process(&key, batch) {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!(
                    key = %key,
                    batch = ids.len(),
                    error = %err,
                    "batch operator failed, passing batch through unchanged"
                );
                fallback
            }
        };

        for entity in processed {
            if out.send(Ok(entity)).await.is_err() {
                return;
            }
        }

        if let Some(p) = &progress {
            for id in &ids {
                p.element_ended(id);
            }
        }
    }
}
