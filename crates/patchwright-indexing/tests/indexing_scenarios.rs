//! End-to-end indexing scenarios over the mock providers
//!
//! Drives the real dispatcher, queue, worker, and pipeline; only the
//! sandbox backend, embedding model, vector store, and metadata store are
//! in-memory doubles.

use patchwright_embeddings::{BatchedEmbeddingService, EmbeddingService, MockEmbeddingProvider};
use patchwright_indexing::{IndexingJobHandler, IndexingPipeline};
use patchwright_lexical::{Bm25StateStore, LexicalRegistry, MemoryBm25Store};
use patchwright_meta_data::{MetaRepository, MockMetaRepository};
use patchwright_queue::{JobQueue, JobState, MemoryJobQueue, QueueName, RetryPolicy, Worker};
use patchwright_sandbox::{MockBackend, SandboxBackend, SandboxManager};
use patchwright_vector_data::{MockStorage, VectorStorage};
use patchwright_webhook::{DispatchOutcome, WebhookDispatcher, ZERO_SHA};
use std::sync::Arc;
use std::time::Duration;

const REPO: &str = "octo/app";

struct Stack {
    backend: Arc<MockBackend>,
    queue: Arc<MemoryJobQueue>,
    meta: Arc<MockMetaRepository>,
    storage: Arc<MockStorage>,
    lexical: Arc<LexicalRegistry>,
    dispatcher: WebhookDispatcher,
    worker: Worker,
}

fn build_stack() -> Stack {
    build_stack_with_policy(RetryPolicy::default())
}

fn build_stack_with_policy(policy: RetryPolicy) -> Stack {
    let backend = Arc::new(MockBackend::new());
    let queue = Arc::new(MemoryJobQueue::new(policy));
    let meta = Arc::new(MockMetaRepository::new());
    let storage = Arc::new(MockStorage::new());
    let lexical = Arc::new(LexicalRegistry::new(
        Arc::new(MemoryBm25Store::new()) as Arc<dyn Bm25StateStore>
    ));

    let embedding_service: Arc<dyn EmbeddingService> = Arc::new(BatchedEmbeddingService::new(
        Arc::new(MockEmbeddingProvider::new(8)),
        10,
        Duration::ZERO,
    ));
    let sandboxes = Arc::new(SandboxManager::new(
        Arc::clone(&backend) as Arc<dyn SandboxBackend>,
        Duration::from_secs(1800),
    ));

    let pipeline = Arc::new(IndexingPipeline::new(
        sandboxes,
        embedding_service,
        Arc::clone(&lexical),
        Arc::clone(&storage) as Arc<dyn VectorStorage>,
        Arc::clone(&meta) as Arc<dyn MetaRepository>,
        Duration::from_secs(60),
    ));

    let dispatcher = WebhookDispatcher::new(
        Arc::clone(&queue) as Arc<dyn JobQueue>,
        Arc::clone(&meta) as Arc<dyn MetaRepository>,
        100,
    );
    let worker = Worker::new(
        Arc::clone(&queue) as Arc<dyn JobQueue>,
        QueueName::Indexing,
        Arc::new(IndexingJobHandler::new(pipeline)),
        Duration::from_millis(1),
    );

    Stack {
        backend,
        queue,
        meta,
        storage,
        lexical,
        dispatcher,
        worker,
    }
}

fn push_body(before: &str, after: &str, commit: serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "ref": "refs/heads/main",
        "before": before,
        "after": after,
        "repository": {
            "id": 11,
            "name": "app",
            "full_name": REPO,
            "clone_url": "https://github.com/octo/app.git",
        },
        "pusher": {"name": "octocat"},
        "commits": [commit],
    }))
    .unwrap()
}

async fn lexical_chunk_ids(stack: &Stack) -> Vec<String> {
    let index = stack.lexical.get_or_load(REPO, "main").await.unwrap();
    let mut ids = index.read().await.all_chunk_ids();
    ids.sort();
    ids
}

#[tokio::test]
async fn cold_push_runs_full_index_and_commits_meta() {
    let stack = build_stack();
    stack.backend.seed_file(
        "repo/src/a.ts",
        "export function greet(name: string) { return `hi ${name}`; }\n",
    );

    let body = push_body(ZERO_SHA, "abc123", serde_json::json!({"id": "c1", "added": ["src/a.ts"]}));
    let outcome = stack.dispatcher.dispatch("push", &body).await.unwrap();
    let DispatchOutcome::Enqueued { job_id, full: true } = outcome else {
        panic!("cold push must enqueue a full index");
    };

    stack.worker.process_one().await.unwrap();

    let job = stack.queue.get_job(&job_id).await.unwrap().unwrap();
    assert_eq!(job.state, JobState::Completed);
    assert_eq!(job.progress, 100);

    // Meta carries the pushed sha
    let meta = stack.meta.get_index_meta(REPO, "main").await.unwrap().unwrap();
    assert_eq!(meta.last_indexed_sha, "abc123");
    assert!(stack.meta.is_repo_indexed(REPO, "main").await.unwrap());

    // Querying the repo surfaces the new file's chunk in both indexes
    let ids = lexical_chunk_ids(&stack).await;
    assert_eq!(ids, vec!["src/a.ts_fn_greet"]);
    assert_eq!(
        stack.storage.chunk_ids(REPO, "main").await,
        vec!["src/a.ts_fn_greet"]
    );
}

#[tokio::test]
async fn small_push_replaces_only_changed_files() {
    let stack = build_stack();
    stack
        .backend
        .seed_file("repo/src/a.ts", "export function alpha() { return 1; }\n");
    stack
        .backend
        .seed_file("repo/src/b.ts", "export function beta() { return 2; }\n");

    // Baseline full index
    let body = push_body(ZERO_SHA, "sha-1", serde_json::json!({"id": "c1", "added": ["src/a.ts", "src/b.ts"]}));
    stack.dispatcher.dispatch("push", &body).await.unwrap();
    stack.worker.process_one().await.unwrap();

    // Modify one file, push incrementally
    stack
        .backend
        .seed_file("repo/src/a.ts", "export function alphaPrime() { return 10; }\n");
    let body = push_body("sha-1", "sha-2", serde_json::json!({"id": "c2", "modified": ["src/a.ts"]}));
    let outcome = stack.dispatcher.dispatch("push", &body).await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Enqueued { full: false, .. }));
    stack.worker.process_one().await.unwrap();

    // a.ts chunks replaced, b.ts untouched
    let ids = lexical_chunk_ids(&stack).await;
    assert_eq!(ids, vec!["src/a.ts_fn_alphaPrime", "src/b.ts_fn_beta"]);
    assert_eq!(
        stack.storage.chunk_ids(REPO, "main").await,
        vec!["src/a.ts_fn_alphaPrime", "src/b.ts_fn_beta"]
    );

    let meta = stack.meta.get_index_meta(REPO, "main").await.unwrap().unwrap();
    assert_eq!(meta.last_indexed_sha, "sha-2");
}

#[tokio::test]
async fn removed_files_leave_both_indexes() {
    let stack = build_stack();
    stack
        .backend
        .seed_file("repo/src/keep.ts", "export function keep() { return 1; }\n");
    stack
        .backend
        .seed_file("repo/src/gone.ts", "export function gone() { return 2; }\n");

    let body = push_body(ZERO_SHA, "sha-1", serde_json::json!({"id": "c1", "added": ["src/keep.ts", "src/gone.ts"]}));
    stack.dispatcher.dispatch("push", &body).await.unwrap();
    stack.worker.process_one().await.unwrap();

    // The push removes gone.ts
    let body = push_body("sha-1", "sha-2", serde_json::json!({"id": "c2", "removed": ["src/gone.ts"]}));
    stack.dispatcher.dispatch("push", &body).await.unwrap();
    stack.worker.process_one().await.unwrap();

    assert_eq!(lexical_chunk_ids(&stack).await, vec!["src/keep.ts_fn_keep"]);
    assert_eq!(
        stack.storage.chunk_ids(REPO, "main").await,
        vec!["src/keep.ts_fn_keep"]
    );
}

#[tokio::test]
async fn push_above_threshold_reindexes_fully() {
    let stack = build_stack();
    stack
        .backend
        .seed_file("repo/src/a.ts", "export function a() { return 1; }\n");

    let body = push_body(ZERO_SHA, "sha-1", serde_json::json!({"id": "c1", "added": ["src/a.ts"]}));
    stack.dispatcher.dispatch("push", &body).await.unwrap();
    stack.worker.process_one().await.unwrap();

    // 250 modified files exceeds the threshold of 100
    let files: Vec<String> = (0..250).map(|i| format!("src/gen_{i}.ts")).collect();
    let body = push_body("sha-1", "sha-2", serde_json::json!({"id": "c2", "modified": files}));
    let outcome = stack.dispatcher.dispatch("push", &body).await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Enqueued { full: true, .. }));

    stack.worker.process_one().await.unwrap();

    let meta = stack.meta.get_index_meta(REPO, "main").await.unwrap().unwrap();
    assert_eq!(meta.last_indexed_sha, "sha-2");
    assert_eq!(meta.last_index_type, patchwright_meta_data::IndexType::Full);
}

#[tokio::test]
async fn incremental_sequence_matches_full_reindex_of_final_tree() {
    // Stack A: full index of v1, then incremental to v2
    let incremental = build_stack();
    incremental
        .backend
        .seed_file("repo/src/a.ts", "export function one() { return 1; }\n");
    incremental
        .backend
        .seed_file("repo/src/b.ts", "export function two() { return 2; }\n");

    let body = push_body(ZERO_SHA, "v1", serde_json::json!({"id": "c1", "added": ["src/a.ts", "src/b.ts"]}));
    incremental.dispatcher.dispatch("push", &body).await.unwrap();
    incremental.worker.process_one().await.unwrap();

    incremental
        .backend
        .seed_file("repo/src/a.ts", "export function oneBis() { return 11; }\n");
    incremental
        .backend
        .seed_file("repo/src/c.ts", "export function three() { return 3; }\n");
    let body = push_body(
        "v1",
        "v2",
        serde_json::json!({"id": "c2", "added": ["src/c.ts"], "modified": ["src/a.ts"], "removed": ["src/b.ts"]}),
    );
    incremental.dispatcher.dispatch("push", &body).await.unwrap();
    incremental.worker.process_one().await.unwrap();

    // Stack B: fresh full index over the final tree
    let full = build_stack();
    full.backend
        .seed_file("repo/src/a.ts", "export function oneBis() { return 11; }\n");
    full.backend
        .seed_file("repo/src/c.ts", "export function three() { return 3; }\n");
    let body = push_body(ZERO_SHA, "v2", serde_json::json!({"id": "c1", "added": ["src/a.ts", "src/c.ts"]}));
    full.dispatcher.dispatch("push", &body).await.unwrap();
    full.worker.process_one().await.unwrap();

    // Id-stable set equality between the two routes
    assert_eq!(
        lexical_chunk_ids(&incremental).await,
        lexical_chunk_ids(&full).await
    );
    assert_eq!(
        incremental.storage.chunk_ids(REPO, "main").await,
        full.storage.chunk_ids(REPO, "main").await
    );
}

#[tokio::test]
async fn empty_repository_fails_with_integrity_error() {
    let stack = build_stack_with_policy(RetryPolicy {
        max_attempts: 3,
        backoff_base: Duration::from_millis(1),
        retention: 100,
    });
    // No files seeded: the clone yields nothing indexable

    let body = push_body(ZERO_SHA, "sha-1", serde_json::json!({"id": "c1"}));
    let DispatchOutcome::Enqueued { job_id, .. } =
        stack.dispatcher.dispatch("push", &body).await.unwrap()
    else {
        panic!("expected enqueue");
    };

    // Drive the job through every retry until it lands in a terminal state
    let mut job = stack.queue.get_job(&job_id).await.unwrap().unwrap();
    while !job.state.is_terminal() {
        stack.worker.process_one().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        job = stack.queue.get_job(&job_id).await.unwrap().unwrap();
    }

    assert_eq!(job.state, JobState::Failed);
    assert_eq!(job.attempts, 3);
    assert!(job.failed_reason.unwrap().contains("zero chunks"));
    // Meta was never committed
    assert!(!stack.meta.is_repo_indexed(REPO, "main").await.unwrap());
}
