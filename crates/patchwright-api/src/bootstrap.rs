//! Application bootstrap and service initialization
//!
//! Builds the whole dependency graph in order: config, database pool,
//! providers, pipelines, then the two queue workers. No module-level
//! singletons; everything is injected from here.

use crate::AppState;
use patchwright_config::ApplicationConfig;
use patchwright_embeddings::{BatchedEmbeddingService, EmbeddingService, HttpEmbeddingProvider};
use patchwright_forge::{ForgeClient, GithubClient};
use patchwright_generation::{GenerationJobHandler, GenerationPipeline, PipelineSettings};
use patchwright_indexing::{IndexingJobHandler, IndexingPipeline};
use patchwright_lexical::{Bm25StateStore, LexicalRegistry};
use patchwright_llm::{HttpLlmProvider, LlmProvider};
use patchwright_meta_data::{DbMetaRepository, MetaBm25Store, MetaRepository, initialize_database};
use patchwright_queue::{
    JobQueue, JobStatusLookup, PostgresJobQueue, QueueName, RetryPolicy, Worker,
};
use patchwright_sandbox::{LocalProcessBackend, SandboxBackend, SandboxManager};
use patchwright_search::{HybridRetriever, Retriever};
use patchwright_validation::{Validator, ValidatorTimeouts};
use patchwright_vector_data::{QdrantStorage, VectorStorage};
use patchwright_webhook::WebhookDispatcher;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use tracing::info;

/// Bootstrap result type
pub type BootstrapResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Everything main() needs to run and shut down
pub struct Services {
    pub state: AppState,
    pub worker_handles: Vec<tokio::task::JoinHandle<()>>,
    pub shutdown_signals: Vec<Arc<AtomicBool>>,
    pub reaper_handle: tokio::task::JoinHandle<()>,
}

/// Initialize all services and spawn the workers
///
/// Order: config is already loaded by the caller; then database, providers,
/// pipelines, dispatcher, workers.
///
/// # Errors
///
/// Returns error if any service initialization fails; the binary exits 1.
pub async fn initialize_services(config: &ApplicationConfig) -> BootstrapResult<Services> {
    // 1. Database (queue backend + bookkeeping + BM25 persistence)
    info!(
        "Initializing database pool ({})...",
        config.database.safe_connection_string()
    );
    let pool = initialize_database(&config.database).await?;

    let meta: Arc<dyn MetaRepository> = Arc::new(DbMetaRepository::new(pool.clone()));

    // 2. Queues
    let retry_policy = RetryPolicy {
        max_attempts: config.queue.attempts,
        backoff_base: Duration::from_millis(config.queue.backoff_base_ms),
        retention: config.queue.retention,
    };
    let pg_queue = PostgresJobQueue::new(pool, retry_policy);
    let queue: Arc<dyn JobQueue> = Arc::new(pg_queue.clone());
    // The generation worker only gets a status-lookup view of the queues
    let indexing_jobs: Arc<dyn JobStatusLookup> = Arc::new(pg_queue);

    // 3. Index stores
    info!("Initializing vector storage...");
    let vector_storage: Arc<dyn VectorStorage> =
        Arc::new(QdrantStorage::new(&config.vector_storage)?);

    let bm25_store: Arc<dyn Bm25StateStore> = Arc::new(MetaBm25Store::new(Arc::clone(&meta)));
    let lexical = Arc::new(LexicalRegistry::new(bm25_store));

    // 4. Providers
    info!("Initializing embedding provider...");
    let embedding_service: Arc<dyn EmbeddingService> = Arc::new(BatchedEmbeddingService::new(
        Arc::new(HttpEmbeddingProvider::new(&config.embedding)?),
        config.embedding.batch_size,
        Duration::from_millis(config.embedding.batch_delay_ms),
    ));

    info!("Initializing LLM provider...");
    let llm: Arc<dyn LlmProvider> = Arc::new(HttpLlmProvider::new(&config.llm)?);

    info!("Initializing forge client...");
    let forge: Arc<dyn ForgeClient> = Arc::new(GithubClient::new(&config.forge)?);

    // 5. Sandboxes + reaper
    let backend: Arc<dyn SandboxBackend> = Arc::new(LocalProcessBackend::temporary()?);
    let sandboxes = Arc::new(SandboxManager::new(
        backend,
        Duration::from_secs(config.sandbox.lifetime_seconds),
    ));
    let reaper_handle = sandboxes.spawn_reaper(Duration::from_secs(60));

    // 6. Pipelines
    let indexing_pipeline = Arc::new(IndexingPipeline::new(
        Arc::clone(&sandboxes),
        Arc::clone(&embedding_service),
        Arc::clone(&lexical),
        Arc::clone(&vector_storage),
        Arc::clone(&meta),
        Duration::from_secs(config.sandbox.clone_timeout_seconds),
    ));

    let retriever: Arc<dyn Retriever> = Arc::new(HybridRetriever::new(
        Arc::clone(&embedding_service),
        Arc::clone(&vector_storage),
        Arc::clone(&lexical),
    ));
    let validator = Validator::new(ValidatorTimeouts {
        command: Duration::from_secs(config.sandbox.command_timeout_seconds),
        test: Duration::from_secs(config.sandbox.test_timeout_seconds),
        build: Duration::from_secs(config.sandbox.build_timeout_seconds),
    });
    let generation_pipeline = Arc::new(GenerationPipeline::new(
        Arc::clone(&sandboxes),
        retriever,
        llm,
        validator,
        forge,
        Arc::clone(&meta),
        indexing_jobs,
        PipelineSettings {
            retrieval_top_k: config.generation.retrieval_top_k,
            selection_fallback_limit: config.generation.selection_fallback_limit,
            max_iterations: config.llm.max_iterations,
            indexing_poll: Duration::from_secs(config.generation.indexing_poll_seconds),
            indexing_wait_cap: Duration::from_secs(config.generation.indexing_wait_cap_seconds),
            clone_timeout: Duration::from_secs(config.sandbox.clone_timeout_seconds),
            install_timeout: Duration::from_secs(config.sandbox.install_timeout_seconds),
            command_timeout: Duration::from_secs(config.sandbox.command_timeout_seconds),
        },
    ));

    // 7. Workers, one per queue
    let poll = Duration::from_millis(config.queue.poll_interval_ms);
    let indexing_worker = Worker::new(
        Arc::clone(&queue),
        QueueName::Indexing,
        Arc::new(IndexingJobHandler::new(indexing_pipeline)),
        poll,
    );
    let generation_worker = Worker::new(
        Arc::clone(&queue),
        QueueName::Generation,
        Arc::new(GenerationJobHandler::new(generation_pipeline)),
        poll,
    );

    let shutdown_signals = vec![
        indexing_worker.shutdown_handle(),
        generation_worker.shutdown_handle(),
    ];
    let worker_handles = vec![
        tokio::spawn(async move { indexing_worker.run().await }),
        tokio::spawn(async move { generation_worker.run().await }),
    ];

    // 8. Webhook dispatcher + HTTP state
    let dispatcher = Arc::new(WebhookDispatcher::new(
        Arc::clone(&queue),
        Arc::clone(&meta),
        config.webhook.incremental_threshold,
    ));
    let state = AppState::new(queue, dispatcher, config.webhook.secret.clone());

    info!("Services initialized");
    Ok(Services {
        state,
        worker_handles,
        shutdown_signals,
        reaper_handle,
    })
}
