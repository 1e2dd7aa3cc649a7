//! Branch drivers: terminal subscribers that drain a stream branch and
//! release the completion latch exactly once.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use pulseline_types::entity::Entity;
use pulseline_types::error::StageError;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt as TokioStreamExt;

use crate::latch::CompletionLatch;
use crate::sink::Sink;
use crate::stream::EntityStream;

/// What a counting branch observed before its terminal event.
#[derive(Debug)]
pub struct BranchOutcome {
    pub name: String,
    pub items: u64,
    pub error: Option<StageError>,
}

/// What a sink branch observed before its terminal event.
#[derive(Debug)]
pub struct SinkOutcome {
    pub name: String,
    pub items_persisted: u64,
    pub batches_failed: u64,
    pub error: Option<StageError>,
}

/// Drain a branch, counting items, stopping at the first error.
///
/// The latch is counted down on the terminal event — completion or
/// error — never twice.
pub fn drive<E: Entity>(
    name: &str,
    mut stream: EntityStream<E>,
    latch: Arc<CompletionLatch>,
) -> JoinHandle<BranchOutcome> {
    let name = name.to_string();
    tokio::spawn(async move {
        let mut items = 0u64;
        let mut error = None;
        while let Some(item) = StreamExt::next(&mut stream).await {
            match item {
                Ok(_) => items += 1,
                Err(err) => {
                    tracing::error!(branch = %name, error = %err, "branch terminated by stage error");
                    error = Some(err);
                    break;
                }
            }
        }
        tracing::debug!(branch = %name, items, "branch complete");
        latch.count_down();
        BranchOutcome { name, items, error }
    })
}

/// Drain a branch into a sink with timed/size-bounded batching.
///
/// A batch is flushed when it reaches `batch_size` items or when
/// `flush_interval` elapses with items pending, whichever comes first.
/// Persistence failures are logged and counted, never propagated —
/// best-effort by documented policy. The latch is counted down on the
/// terminal event.
pub fn drive_sink<E: Entity>(
    name: &str,
    stream: EntityStream<E>,
    sink: Arc<dyn Sink<E>>,
    batch_size: usize,
    flush_interval: Duration,
    latch: Arc<CompletionLatch>,
) -> JoinHandle<SinkOutcome> {
    let name = name.to_string();
    tokio::spawn(async move {
        let mut items_persisted = 0u64;
        let mut batches_failed = 0u64;
        let mut error = None;

        let chunks = TokioStreamExt::chunks_timeout(stream, batch_size.max(1), flush_interval);
        tokio::pin!(chunks);
        while let Some(chunk) = StreamExt::next(&mut chunks).await {
            let mut batch = Vec::with_capacity(chunk.len());
            let mut terminal = false;
            for item in chunk {
                match item {
                    Ok(entity) => batch.push(entity),
                    Err(err) => {
                        tracing::error!(branch = %name, error = %err, "sink branch terminated by stage error");
                        error = Some(err);
                        terminal = true;
                        break;
                    }
                }
            }
            if !batch.is_empty() {
                match sink.persist(&batch) {
                    Ok(()) => items_persisted += batch.len() as u64,
                    Err(err) => {
                        batches_failed += 1;
                        tracing::error!(
                            branch = %name,
                            batch = batch.len(),
                            first_id = %batch[0].id(),
                            error = %err,
                            "sink persistence failed, continuing"
                        );
                    }
                }
            }
            if terminal {
                break;
            }
        }

        tracing::debug!(branch = %name, items_persisted, batches_failed, "sink branch complete");
        latch.count_down();
        SinkOutcome {
            name,
            items_persisted,
            batches_failed,
            error,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::from_iter;
    use pulseline_types::entity::Message;
    use std::sync::Mutex;

    struct RecordingSink {
        batches: Mutex<Vec<Vec<String>>>,
        fail_batches_containing: Option<String>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                fail_batches_containing: None,
            }
        }

        fn failing_on(id: &str) -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                fail_batches_containing: Some(id.to_string()),
            }
        }
    }

    impl Sink<Message> for RecordingSink {
        fn persist(&self, batch: &[Message]) -> anyhow::Result<()> {
            let ids: Vec<String> = batch.iter().map(|m| m.id.clone()).collect();
            if let Some(bad) = &self.fail_batches_containing {
                if ids.iter().any(|id| id == bad) {
                    anyhow::bail!("refusing batch containing '{bad}'");
                }
            }
            self.batches.lock().unwrap().push(ids);
            Ok(())
        }
    }

    #[tokio::test]
    async fn drive_counts_items_and_releases_latch() {
        let latch = Arc::new(CompletionLatch::new(1));
        let stream = from_iter((0..7).map(|i| Message::new(i.to_string(), "x")));
        let outcome = drive("raw", stream, latch.clone()).await.unwrap();
        assert_eq!(outcome.items, 7);
        assert!(outcome.error.is_none());
        assert_eq!(latch.remaining(), 0);
    }

    #[tokio::test]
    async fn drive_stops_at_first_error_and_still_releases() {
        let latch = Arc::new(CompletionLatch::new(1));
        let stream = futures::stream::iter(vec![
            Ok(Message::new("1", "x")),
            Err(StageError::new("s", "boom")),
            Ok(Message::new("2", "never seen")),
        ])
        .boxed();
        let outcome = drive("raw", stream, latch.clone()).await.unwrap();
        assert_eq!(outcome.items, 1);
        assert!(outcome.error.is_some());
        assert_eq!(latch.remaining(), 0);
    }

    #[tokio::test]
    async fn sink_batches_by_size() {
        let latch = Arc::new(CompletionLatch::new(1));
        let sink = Arc::new(RecordingSink::new());
        let stream = from_iter((0..5).map(|i| Message::new(i.to_string(), "x")));
        let outcome = drive_sink(
            "sink",
            stream,
            sink.clone(),
            2,
            Duration::from_secs(5),
            latch.clone(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.items_persisted, 5);
        assert_eq!(outcome.batches_failed, 0);
        let batches = sink.batches.lock().unwrap();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0], vec!["0", "1"]);
        assert_eq!(batches[2], vec!["4"]);
        assert_eq!(latch.remaining(), 0);
    }

    #[tokio::test]
    async fn sink_failure_is_best_effort() {
        let latch = Arc::new(CompletionLatch::new(1));
        let sink = Arc::new(RecordingSink::failing_on("1"));
        let stream = from_iter((0..4).map(|i| Message::new(i.to_string(), "x")));
        let outcome = drive_sink(
            "sink",
            stream,
            sink.clone(),
            2,
            Duration::from_secs(5),
            latch.clone(),
        )
        .await
        .unwrap();

        // Batch [0, 1] failed; batch [2, 3] still persisted.
        assert_eq!(outcome.batches_failed, 1);
        assert_eq!(outcome.items_persisted, 2);
        assert!(outcome.error.is_none());
        assert_eq!(latch.remaining(), 0);
    }

    #[tokio::test]
    async fn sink_persists_items_preceding_an_error() {
        let latch = Arc::new(CompletionLatch::new(1));
        let sink = Arc::new(RecordingSink::new());
        let stream = futures::stream::iter(vec![
            Ok(Message::new("1", "x")),
            Ok(Message::new("2", "x")),
            Ok(Message::new("3", "x")),
            Err(StageError::new("s", "boom")),
        ])
        .boxed();
        let outcome = drive_sink(
            "sink",
            stream,
            sink.clone(),
            10,
            Duration::from_secs(5),
            latch.clone(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.items_persisted, 3);
        assert!(outcome.error.is_some());
        assert_eq!(latch.remaining(), 0);
    }
}
