//! Run lifecycle reporting: wraps a pipeline execution and mirrors its
//! start, terminal outcome, and fine-grained element progress into the
//! run record store.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use chrono::Utc;
use futures::Stream;
use pulseline_state::RunStore;
use pulseline_types::entity::Entity;
use pulseline_types::error::StageError;
use pulseline_types::record::{RunId, RunOutcome};

use crate::stream::EntityStream;

/// Fire-and-forget per-element progress hooks.
///
/// Long-running stages (grouped batch operators) publish element
/// start/end marks through this seam so external monitors can follow a
/// run without the stage knowing about run records. Implementations
/// must never panic and never block the stream on storage trouble.
pub trait ProgressSink: Send + Sync {
    fn element_started(&self, element: &str);
    fn element_ended(&self, element: &str);
}

/// Reports one run's lifecycle to a [`RunStore`].
///
/// Owns the run record for the run's duration: nothing else writes to
/// the same record concurrently. The record is mutated exactly twice —
/// on start and on terminal completion or error. A missing record is
/// logged and never created here; creation belongs to whoever launched
/// the run.
pub struct RunLifecycle {
    store: Arc<dyn RunStore>,
    run_id: RunId,
}

impl RunLifecycle {
    #[must_use]
    pub fn new(store: Arc<dyn RunStore>, run_id: RunId) -> Self {
        Self { store, run_id }
    }

    #[must_use]
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Record the run as started: start timestamp and process id.
    pub fn record_started(&self) {
        match self.store.get_run(&self.run_id) {
            Ok(Some(mut run)) => {
                run.started_at = Some(now_iso8601());
                run.pid = Some(std::process::id());
                if let Err(err) = self.store.update_run(&run) {
                    tracing::warn!(run = %self.run_id, error = %err, "failed to record run start");
                } else {
                    tracing::info!(run = %self.run_id, "run started");
                }
            }
            Ok(None) => {
                tracing::warn!(run = %self.run_id, "no run record found, won't set anything");
            }
            Err(err) => {
                tracing::warn!(run = %self.run_id, error = %err, "failed to load run record");
            }
        }
    }

    /// Record the run's terminal event: end timestamp, process id and
    /// outcome. Storage trouble is logged and swallowed — lifecycle
    /// reporting must never take the pipeline down.
    pub fn record_terminal(&self, success: bool) {
        let outcome = if success {
            RunOutcome::Succeeded
        } else {
            RunOutcome::Failed
        };
        match self.store.get_run(&self.run_id) {
            Ok(Some(mut run)) => {
                run.finished_at = Some(now_iso8601());
                run.pid = Some(std::process::id());
                run.outcome = outcome;
                if let Err(err) = self.store.update_run(&run) {
                    tracing::warn!(run = %self.run_id, error = %err, "failed to record run outcome");
                } else {
                    tracing::info!(run = %self.run_id, outcome = %outcome, "run finished");
                }
            }
            Ok(None) => {
                tracing::warn!(run = %self.run_id, "no run record found, won't set anything");
            }
            Err(err) => {
                tracing::warn!(run = %self.run_id, error = %err, "failed to load run record");
            }
        }
    }

    /// Wrap a stream so its terminal event is reported exactly once:
    /// exhaustion marks the run succeeded, the first `Err` item marks
    /// it failed. Items pass through untouched either way.
    pub fn wrap<E: Entity>(self: &Arc<Self>, inner: EntityStream<E>) -> EntityStream<E> {
        Box::pin(LifecycleStream {
            inner,
            lifecycle: self.clone(),
            reported: false,
        })
    }
}

impl ProgressSink for RunLifecycle {
    fn element_started(&self, element: &str) {
        if let Err(err) = self.store.element_started(&self.run_id, element) {
            tracing::debug!(run = %self.run_id, element, error = %err, "element start mark failed");
        }
    }

    fn element_ended(&self, element: &str) {
        if let Err(err) = self.store.element_ended(&self.run_id, element) {
            tracing::debug!(run = %self.run_id, element, error = %err, "element end mark failed");
        }
    }
}

fn now_iso8601() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

struct LifecycleStream<E: Entity> {
    inner: EntityStream<E>,
    lifecycle: Arc<RunLifecycle>,
    reported: bool,
}

impl<E: Entity> Stream for LifecycleStream<E> {
    type Item = Result<E, StageError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(entity))) => Poll::Ready(Some(Ok(entity))),
            Poll::Ready(Some(Err(err))) => {
                if !this.reported {
                    this.reported = true;
                    this.lifecycle.record_terminal(false);
                }
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                if !this.reported {
                    this.reported = true;
                    this.lifecycle.record_terminal(true);
                }
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::from_iter;
    use futures::StreamExt;
    use pulseline_state::SqliteRunStore;
    use pulseline_types::entity::Message;
    use pulseline_types::record::{ProjectId, RunRecord};

    fn store_with_run(id: &str) -> Arc<SqliteRunStore> {
        let store = SqliteRunStore::in_memory().unwrap();
        store
            .create_run(&RunRecord::pending(RunId::new(id), ProjectId::new("p")))
            .unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn completed_stream_marks_run_succeeded() {
        let store = store_with_run("R1");
        let lifecycle = Arc::new(RunLifecycle::new(store.clone(), RunId::new("R1")));

        let wrapped = lifecycle.wrap(from_iter(vec![Message::new("1", "a")]));
        let items: Vec<_> = wrapped.collect().await;
        assert_eq!(items.len(), 1);

        let run = store.get_run(&RunId::new("R1")).unwrap().unwrap();
        assert_eq!(run.outcome, RunOutcome::Succeeded);
        assert!(run.finished_at.is_some());
        assert_eq!(run.pid, Some(std::process::id()));
    }

    #[tokio::test]
    async fn errored_stream_marks_run_failed_with_end_time() {
        let store = store_with_run("R1");
        let lifecycle = Arc::new(RunLifecycle::new(store.clone(), RunId::new("R1")));

        let inner = futures::stream::iter(vec![
            Ok(Message::new("1", "a")),
            Err(StageError::new("s", "boom")),
        ])
        .boxed();
        let mut wrapped = lifecycle.wrap(inner);
        assert!(wrapped.next().await.unwrap().is_ok());
        assert!(wrapped.next().await.unwrap().is_err());

        let run = store.get_run(&RunId::new("R1")).unwrap().unwrap();
        assert_eq!(run.outcome, RunOutcome::Failed);
        assert!(run.finished_at.is_some());
    }

    #[tokio::test]
    async fn missing_record_is_logged_not_created() {
        let store = Arc::new(SqliteRunStore::in_memory().unwrap());
        let lifecycle = Arc::new(RunLifecycle::new(store.clone(), RunId::new("R2")));

        let wrapped = lifecycle.wrap(from_iter(vec![Message::new("1", "a")]));
        let items: Vec<_> = wrapped.collect().await;
        assert_eq!(items.len(), 1);

        // No record was conjured up for the unknown id.
        assert!(store.get_run(&RunId::new("R2")).unwrap().is_none());
    }

    #[tokio::test]
    async fn record_started_sets_start_and_pid() {
        let store = store_with_run("R1");
        let lifecycle = RunLifecycle::new(store.clone(), RunId::new("R1"));
        lifecycle.record_started();

        let run = store.get_run(&RunId::new("R1")).unwrap().unwrap();
        assert!(run.started_at.is_some());
        assert_eq!(run.pid, Some(std::process::id()));
        assert_eq!(run.outcome, RunOutcome::Pending);
        assert!(run.finished_at.is_none());
    }

    #[test]
    fn progress_hooks_never_panic() {
        let store = Arc::new(SqliteRunStore::in_memory().unwrap());
        let lifecycle = RunLifecycle::new(store, RunId::new("absent"));
        lifecycle.element_started("e1");
        lifecycle.element_ended("e1");
    }
}
