//! End-to-end test of the built-in enrichment chain: JSONL source
//! through language detection, tokenization, stop-word marking,
//! sentiment, grouped indexing and persistence into a JSONL sink, with
//! run lifecycle reporting against a real SQLite store.

use std::sync::Arc;

use futures::StreamExt;
use pulseline_engine::config::types::parse_stage_ref;
use pulseline_engine::lifecycle::{ProgressSink, RunLifecycle};
use pulseline_engine::source::{SelectionRange, Source};
use pulseline_engine::{run_pipeline, PipelineOptions, StagePlan};
use pulseline_plugins::builtin_registry;
use pulseline_plugins::index::LogIndexService;
use pulseline_plugins::jsonl::{JsonlSink, JsonlSource};
use pulseline_plugins::repository::{InMemoryMessageRepository, InMemoryProfileRepository};
use pulseline_plugins::PluginDeps;
use pulseline_state::{RunStore, SqliteRunStore};
use pulseline_types::config::StageConfig;
use pulseline_types::entity::Profile;
use pulseline_types::record::{ProjectId, RunId, RunOutcome, RunRecord};

const FIXTURE: &[&str] = &[
    r#"{"id":"1","text":"questo treno è molto bello e il viaggio è ottimo","from_user":"ada"}"#,
    r#"{"id":"2","text":"this is a terrible and awful delay for the morning train","from_user":"grace"}"#,
    r#"{"id":"3","text":"il treno non è ancora qui ma sono felice","from_user":"ada"}"#,
    r#"{"id":"4","text":"hello from the station, what a wonderful morning"}"#,
];

fn stage(use_ref: &str, config: StageConfig) -> StagePlan {
    let (family, name) = parse_stage_ref(use_ref).unwrap();
    StagePlan::new(family, name, config)
}

#[tokio::test]
async fn full_chain_enriches_persists_and_reports() {
    let dir = tempfile::tempdir().unwrap();
    let in_path = dir.path().join("in.jsonl");
    let out_path = dir.path().join("out.jsonl");
    std::fs::write(&in_path, FIXTURE.join("\n")).unwrap();

    // Run record created by the launcher, as a scheduler would.
    let store = Arc::new(SqliteRunStore::in_memory().unwrap());
    store
        .create_run(&RunRecord::pending(
            RunId::new("R-e2e"),
            ProjectId::new("city-pulse"),
        ))
        .unwrap();
    let lifecycle = Arc::new(RunLifecycle::new(store.clone(), RunId::new("R-e2e")));
    let progress: Arc<dyn ProgressSink> = lifecycle.clone();

    let messages = Arc::new(InMemoryMessageRepository::new());
    let profiles = Arc::new(InMemoryProfileRepository::new());
    profiles.insert(Profile {
        username: "ada".into(),
        latitude: Some(41.12),
        longitude: Some(16.87),
        ..Profile::default()
    });

    let deps = PluginDeps {
        messages: messages.clone(),
        profiles,
        index: Arc::new(LogIndexService),
        progress: Some(progress),
    };
    let registry = builtin_registry(&deps);

    let stages = vec![
        stage("detect-language/wordlist", StageConfig::empty()),
        stage("tokenize/simple", StageConfig::empty()),
        stage("rem-stop-word/simple", StageConfig::empty()),
        stage("sentiment/wordlist", StageConfig::empty()),
        stage("fix-geo-message/from-profile", StageConfig::empty()),
        stage(
            "index/grouped",
            StageConfig::from_value(serde_json::json!({ "batch_size": 2 })),
        ),
        stage("persist/message", StageConfig::empty()),
    ];

    let source = JsonlSource::new(&in_path)
        .open(&SelectionRange::unbounded())
        .unwrap();
    let sink = Arc::new(JsonlSink::open(&out_path).unwrap());

    let summary = run_pipeline(
        &registry,
        &stages,
        source,
        sink,
        Some(lifecycle),
        &PipelineOptions::default(),
    )
    .await
    .unwrap();

    assert!(summary.succeeded());
    assert_eq!(summary.items_in, 4);
    assert_eq!(summary.items_persisted, 4);

    // Every message went through the mid-stream persister too.
    assert_eq!(messages.len(), 4);

    // Read the sink back and check the enrichments stuck.
    let enriched = JsonlSource::new(&out_path)
        .open(&SelectionRange::unbounded())
        .unwrap();
    let mut items: Vec<_> = enriched.map(Result::unwrap).collect().await;
    items.sort_by(|a, b| a.id.cmp(&b.id));

    assert_eq!(items[0].language.as_deref(), Some("it"));
    assert!(items[0].sentiment.unwrap() > 0.0);
    assert_eq!(items[0].latitude, Some(41.12));
    assert!(items[0].tokens.iter().any(|t| t.stop_word));

    assert_eq!(items[1].language.as_deref(), Some("en"));
    assert!(items[1].sentiment.unwrap() < 0.0);
    assert!(items[1].latitude.is_none());

    assert_eq!(items[3].language.as_deref(), Some("en"));
    assert!(items[3].sentiment.unwrap() > 0.0);

    // Lifecycle reported the terminal outcome to the store.
    let run = store.get_run(&RunId::new("R-e2e")).unwrap().unwrap();
    assert_eq!(run.outcome, RunOutcome::Succeeded);
    assert!(run.started_at.is_some());
    assert!(run.finished_at.is_some());
}
