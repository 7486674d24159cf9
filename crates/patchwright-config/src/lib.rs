//! Centralized configuration management for patchwright
//!
//! This crate provides a unified configuration system that eliminates duplication
//! across the codebase and provides type-safe, validated configuration.
//!
//! Configuration follows a simple hierarchy:
//! 1. Safe defaults (defined as constants)
//! 2. Environment variable overrides
//! 3. Runtime validation

pub mod error;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use validation::Validate;

// =============================================================================
// SAFE DEFAULTS - Work for any environment (dev, staging, prod, test)
// =============================================================================

// Embedding Provider Configuration
const DEFAULT_EMBEDDING_API_URL: &str = "https://api.openai.com/v1/embeddings";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_EMBEDDING_DIMENSION: usize = 1536;
const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 10;
const DEFAULT_EMBEDDING_BATCH_DELAY_MS: u64 = 1000; // Provider rate pacing between batches
const DEFAULT_EMBEDDING_TIMEOUT_SECONDS: u64 = 30;

// LLM Provider Configuration
const DEFAULT_LLM_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_LLM_MODEL: &str = "gpt-4o";
const DEFAULT_LLM_TIMEOUT_SECONDS: u64 = 120;
const DEFAULT_MAX_ITERATIONS: u32 = 3; // Generate-validate loop bound

// Database Configuration (queue backend + bookkeeping; safe local defaults)
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_DB_NAME: &str = "patchwright";
const DEFAULT_DB_USER: &str = "patchwright";
const DEFAULT_DB_PASSWORD: &str = "localdev123";
const DEFAULT_DB_SSL_MODE: &str = "disable";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20; // Single process-wide pool
const DEFAULT_DB_MIN_CONNECTIONS: u32 = 2;
const DEFAULT_DB_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_DB_IDLE_TIMEOUT_SECONDS: u64 = 300;

// Vector Storage Configuration
const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
const DEFAULT_VECTOR_COLLECTION: &str = "patchwright_chunks";
const DEFAULT_VECTOR_TIMEOUT_SECONDS: u64 = 30;

// Sandbox Configuration
const DEFAULT_SANDBOX_LIFETIME_SECONDS: u64 = 30 * 60; // Reaper kills idle sandboxes
const DEFAULT_CLONE_TIMEOUT_SECONDS: u64 = 5 * 60;
const DEFAULT_INSTALL_TIMEOUT_SECONDS: u64 = 10 * 60;
const DEFAULT_TEST_TIMEOUT_SECONDS: u64 = 5 * 60;
const DEFAULT_BUILD_TIMEOUT_SECONDS: u64 = 10 * 60;
const DEFAULT_COMMAND_TIMEOUT_SECONDS: u64 = 3 * 60;

// Webhook Configuration
const DEFAULT_INCREMENTAL_THRESHOLD: usize = 100; // Changed-file count above which we full-index

// Generation Configuration
const DEFAULT_RETRIEVAL_TOP_K: usize = 20;
const DEFAULT_SELECTION_FALLBACK_LIMIT: usize = 5;
const DEFAULT_INDEXING_POLL_SECONDS: u64 = 5;
const DEFAULT_INDEXING_WAIT_CAP_SECONDS: u64 = 10 * 60;

// Forge Provider Configuration
const DEFAULT_FORGE_API_URL: &str = "https://api.github.com";

// API Server Configuration
const DEFAULT_API_HOST: &str = "127.0.0.1"; // Localhost only for security
const DEFAULT_API_PORT: u16 = 3000;
const DEFAULT_API_TIMEOUT_SECONDS: u64 = 60;

// Queue Configuration
const DEFAULT_JOB_ATTEMPTS: i32 = 3;
const DEFAULT_BACKOFF_BASE_MS: u64 = 2000; // Exponential: base * 2^attempt
const DEFAULT_JOB_RETENTION: i64 = 100; // Completed and failed kept per queue
const DEFAULT_QUEUE_POLL_MS: u64 = 1000;

// Database imports for PostgreSQL functionality
use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
};
use std::time::Duration;

/// Core configuration for the entire patchwright application
///
/// All settings have safe defaults and can be overridden via environment variables.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ApplicationConfig {
    /// Embedding provider configuration
    pub embedding: EmbeddingConfig,

    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Vector storage configuration
    pub vector_storage: VectorStorageConfig,

    /// Database configuration (queue backend + installation bookkeeping)
    pub database: DatabaseConfig,

    /// Sandbox provider configuration
    pub sandbox: SandboxConfig,

    /// Webhook dispatcher configuration
    pub webhook: WebhookConfig,

    /// Forge provider configuration
    pub forge: ForgeConfig,

    /// Generation pipeline configuration
    pub generation: GenerationConfig,

    /// Queue and worker configuration
    pub queue: QueueConfig,

    /// API server configuration
    pub api: ApiConfig,
}

impl ApplicationConfig {
    /// Load the full configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        Self {
            embedding: EmbeddingConfig::from_env(),
            llm: LlmConfig::from_env(),
            vector_storage: VectorStorageConfig::from_env(),
            database: DatabaseConfig::from_env(),
            sandbox: SandboxConfig::from_env(),
            webhook: WebhookConfig::from_env(),
            forge: ForgeConfig::from_env(),
            generation: GenerationConfig::from_env(),
            queue: QueueConfig::from_env(),
            api: ApiConfig::from_env(),
        }
    }
}

impl Validate for ApplicationConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.embedding.validate()?;
        self.llm.validate()?;
        self.vector_storage.validate()?;
        self.database.validate()?;
        self.webhook.validate()?;
        self.api.validate()?;
        Ok(())
    }
}

/// Remote embedding provider configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding API endpoint URL
    pub api_url: String,

    /// API key for the embedding provider
    pub api_key: String,

    /// Model identifier sent with each request
    pub model: String,

    /// Embedding dimensions produced by this model
    /// Must match vector storage configuration for consistency
    pub dimension: usize,

    /// Number of chunks embedded per batch
    pub batch_size: usize,

    /// Pause between batches to respect provider rate limits
    pub batch_delay_ms: u64,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
}

impl EmbeddingConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        let api_url = std::env::var("PATCHWRIGHT_EMBEDDING_API_URL")
            .unwrap_or_else(|_| DEFAULT_EMBEDDING_API_URL.to_string());

        let api_key = std::env::var("PATCHWRIGHT_EMBEDDING_API_KEY")
            .or_else(|_| std::env::var("PATCHWRIGHT_LLM_API_KEY"))
            .unwrap_or_default();

        let model = std::env::var("PATCHWRIGHT_EMBEDDING_MODEL")
            .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string());

        let dimension = std::env::var("PATCHWRIGHT_EMBEDDING_DIMENSION")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_EMBEDDING_DIMENSION);

        let batch_size = std::env::var("PATCHWRIGHT_EMBEDDING_BATCH_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_EMBEDDING_BATCH_SIZE);

        let batch_delay_ms = std::env::var("PATCHWRIGHT_EMBEDDING_BATCH_DELAY_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_EMBEDDING_BATCH_DELAY_MS);

        let timeout_seconds = std::env::var("PATCHWRIGHT_EMBEDDING_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_EMBEDDING_TIMEOUT_SECONDS);

        Self {
            api_url,
            api_key,
            model,
            dimension,
            batch_size,
            batch_delay_ms,
            timeout_seconds,
        }
    }
}

impl Validate for EmbeddingConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_url(&self.api_url, "embedding.api_url")?;
        validation::validate_range(self.dimension as u64, 1, 16384, "embedding.dimension")?;
        validation::validate_range(self.batch_size as u64, 1, 1000, "embedding.batch_size")?;
        Ok(())
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LlmConfig {
    /// Chat completion API endpoint URL
    pub api_url: String,

    /// API key for the LLM provider
    pub api_key: String,

    /// Model identifier sent with each request
    pub model: String,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,

    /// Maximum generate-validate iterations before a task fails
    pub max_iterations: u32,
}

impl LlmConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        let api_url = std::env::var("PATCHWRIGHT_LLM_API_URL")
            .unwrap_or_else(|_| DEFAULT_LLM_API_URL.to_string());

        let api_key = std::env::var("PATCHWRIGHT_LLM_API_KEY").unwrap_or_default();

        let model =
            std::env::var("PATCHWRIGHT_LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string());

        let timeout_seconds = std::env::var("PATCHWRIGHT_LLM_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_LLM_TIMEOUT_SECONDS);

        let max_iterations = std::env::var("PATCHWRIGHT_MAX_ITERATIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_ITERATIONS);

        Self {
            api_url,
            api_key,
            model,
            timeout_seconds,
            max_iterations,
        }
    }
}

impl Validate for LlmConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_url(&self.api_url, "llm.api_url")?;
        validation::validate_range(u64::from(self.max_iterations), 1, 10, "llm.max_iterations")?;
        Ok(())
    }
}

/// Vector storage configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VectorStorageConfig {
    /// Qdrant server URL
    pub url: String,

    /// Collection name holding all repository chunks
    pub collection_name: String,

    /// Vector dimension (must match the embedding model)
    pub vector_dimension: usize,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl VectorStorageConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        let url = std::env::var("PATCHWRIGHT_VECTOR_STORAGE_URL")
            .unwrap_or_else(|_| DEFAULT_QDRANT_URL.to_string());

        let collection_name = std::env::var("PATCHWRIGHT_VECTOR_STORAGE_COLLECTION_NAME")
            .unwrap_or_else(|_| DEFAULT_VECTOR_COLLECTION.to_string());

        let vector_dimension = std::env::var("PATCHWRIGHT_VECTOR_STORAGE_DIMENSION")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_EMBEDDING_DIMENSION);

        let timeout_seconds = std::env::var("PATCHWRIGHT_VECTOR_STORAGE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_VECTOR_TIMEOUT_SECONDS);

        Self {
            url,
            collection_name,
            vector_dimension,
            timeout_seconds,
        }
    }
}

impl Validate for VectorStorageConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_url(&self.url, "vector_storage.url")?;
        validation::validate_non_empty(&self.collection_name, "vector_storage.collection_name")?;
        Ok(())
    }
}

/// Database configuration (queue backend + installation bookkeeping)
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DatabaseConfig {
    /// Database host
    pub host: String,

    /// Database port
    pub port: u16,

    /// Database name
    pub database: String,

    /// Username
    pub username: String,

    /// Password
    pub password: String,

    /// SSL mode for connections ("disable", "prefer", "require")
    pub ssl_mode: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// Minimum number of connections in pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub timeout_seconds: u64,

    /// Idle timeout in seconds
    pub idle_timeout_seconds: u64,
}

impl DatabaseConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        let host = std::env::var("PATCHWRIGHT_DATABASE_HOST")
            .or_else(|_| std::env::var("DB_HOST"))
            .unwrap_or_else(|_| DEFAULT_DB_HOST.to_string());

        let port = std::env::var("PATCHWRIGHT_DATABASE_PORT")
            .or_else(|_| std::env::var("DB_PORT"))
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DB_PORT);

        let database = std::env::var("PATCHWRIGHT_DATABASE_NAME")
            .or_else(|_| std::env::var("DB_NAME"))
            .unwrap_or_else(|_| DEFAULT_DB_NAME.to_string());

        let username = std::env::var("PATCHWRIGHT_DATABASE_USERNAME")
            .or_else(|_| std::env::var("DB_USER"))
            .unwrap_or_else(|_| DEFAULT_DB_USER.to_string());

        let password = std::env::var("PATCHWRIGHT_DATABASE_PASSWORD")
            .or_else(|_| std::env::var("DB_PASSWORD"))
            .unwrap_or_else(|_| {
                tracing::warn!(
                    "Using default database password - set PATCHWRIGHT_DATABASE_PASSWORD or DB_PASSWORD. NEVER use the default password in production!"
                );
                DEFAULT_DB_PASSWORD.to_string()
            });

        let ssl_mode = std::env::var("PATCHWRIGHT_DATABASE_SSL_MODE")
            .or_else(|_| std::env::var("DB_SSLMODE"))
            .unwrap_or_else(|_| DEFAULT_DB_SSL_MODE.to_string());

        let max_connections = std::env::var("PATCHWRIGHT_DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);

        let min_connections = std::env::var("PATCHWRIGHT_DATABASE_MIN_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DB_MIN_CONNECTIONS);

        let timeout_seconds = std::env::var("PATCHWRIGHT_DATABASE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DB_TIMEOUT_SECONDS);

        let idle_timeout_seconds = std::env::var("PATCHWRIGHT_DATABASE_IDLE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_DB_IDLE_TIMEOUT_SECONDS);

        Self {
            host,
            port,
            database,
            username,
            password,
            ssl_mode,
            max_connections,
            min_connections,
            timeout_seconds,
            idle_timeout_seconds,
        }
    }

    /// Convert string SSL mode to `PgSslMode`
    fn parse_ssl_mode(&self) -> PgSslMode {
        match self.ssl_mode.as_str() {
            "disable" => PgSslMode::Disable,
            "require" => PgSslMode::Require,
            _ => PgSslMode::Prefer, // Safe default for "prefer" and unknown values
        }
    }

    /// Build `PostgreSQL` connection options (no URL with password exposed!)
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.username)
            .password(&self.password)
            .ssl_mode(self.parse_ssl_mode())
    }

    /// Create a `PostgreSQL` connection pool with proper configuration
    ///
    /// # Errors
    /// Returns an error if connection to database fails
    pub async fn create_pool(&self) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.timeout_seconds))
            .idle_timeout(Duration::from_secs(self.idle_timeout_seconds))
            .connect_with(self.connect_options())
            .await
    }

    /// Get connection info for logging (NO PASSWORD!)
    pub fn safe_connection_string(&self) -> String {
        format!(
            "{}@{}:{}/{} (ssl: {:?})",
            self.username, self.host, self.port, self.database, self.ssl_mode
        )
    }
}

impl Validate for DatabaseConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_non_empty(&self.host, "database.host")?;
        validation::validate_range(
            u64::from(self.max_connections),
            1,
            1000,
            "database.max_connections",
        )?;
        validation::validate_range(self.timeout_seconds, 1, 3600, "database.timeout_seconds")?;
        Ok(())
    }
}

/// Sandbox provider configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SandboxConfig {
    /// API key for the sandbox provider (unused by the local backend)
    pub api_key: String,

    /// Sandbox wall-clock lifetime before the reaper kills it
    pub lifetime_seconds: u64,

    /// Timeout for repository clone commands
    pub clone_timeout_seconds: u64,

    /// Timeout for dependency install commands
    pub install_timeout_seconds: u64,

    /// Timeout for test runs
    pub test_timeout_seconds: u64,

    /// Timeout for build runs
    pub build_timeout_seconds: u64,

    /// Timeout for generic shell commands
    pub command_timeout_seconds: u64,
}

impl SandboxConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        let api_key = std::env::var("PATCHWRIGHT_SANDBOX_API_KEY").unwrap_or_default();

        let lifetime_seconds = std::env::var("PATCHWRIGHT_SANDBOX_LIFETIME_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SANDBOX_LIFETIME_SECONDS);

        let clone_timeout_seconds = std::env::var("PATCHWRIGHT_SANDBOX_CLONE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CLONE_TIMEOUT_SECONDS);

        let install_timeout_seconds = std::env::var("PATCHWRIGHT_SANDBOX_INSTALL_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_INSTALL_TIMEOUT_SECONDS);

        let test_timeout_seconds = std::env::var("PATCHWRIGHT_SANDBOX_TEST_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TEST_TIMEOUT_SECONDS);

        let build_timeout_seconds = std::env::var("PATCHWRIGHT_SANDBOX_BUILD_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_BUILD_TIMEOUT_SECONDS);

        let command_timeout_seconds = std::env::var("PATCHWRIGHT_SANDBOX_COMMAND_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECONDS);

        Self {
            api_key,
            lifetime_seconds,
            clone_timeout_seconds,
            install_timeout_seconds,
            test_timeout_seconds,
            build_timeout_seconds,
            command_timeout_seconds,
        }
    }
}

/// Webhook dispatcher configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct WebhookConfig {
    /// Shared HMAC secret for signature verification
    pub secret: String,

    /// Changed-file count above which a push triggers a full reindex
    pub incremental_threshold: usize,
}

impl WebhookConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        let secret = std::env::var("PATCHWRIGHT_WEBHOOK_SECRET").unwrap_or_default();

        let incremental_threshold = std::env::var("PATCHWRIGHT_INCREMENTAL_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_INCREMENTAL_THRESHOLD);

        Self {
            secret,
            incremental_threshold,
        }
    }
}

impl Validate for WebhookConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_range(
            self.incremental_threshold as u64,
            1,
            100_000,
            "webhook.incremental_threshold",
        )?;
        Ok(())
    }
}

/// Forge provider configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ForgeConfig {
    /// Forge REST API base URL
    pub api_url: String,

    /// App credential used to mint installation tokens
    pub app_token: String,
}

impl ForgeConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        let api_url = std::env::var("PATCHWRIGHT_FORGE_API_URL")
            .unwrap_or_else(|_| DEFAULT_FORGE_API_URL.to_string());

        let app_token = std::env::var("PATCHWRIGHT_FORGE_APP_TOKEN").unwrap_or_default();

        Self { api_url, app_token }
    }
}

/// Generation pipeline configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GenerationConfig {
    /// Number of chunks requested from hybrid retrieval
    pub retrieval_top_k: usize,

    /// How many ranked files to fall back to when the LLM selects none
    pub selection_fallback_limit: usize,

    /// Poll interval while waiting on an upstream indexing job
    pub indexing_poll_seconds: u64,

    /// Hard cap on the indexing wait loop
    pub indexing_wait_cap_seconds: u64,
}

impl GenerationConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        let retrieval_top_k = std::env::var("PATCHWRIGHT_RETRIEVAL_TOP_K")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RETRIEVAL_TOP_K);

        let selection_fallback_limit = std::env::var("PATCHWRIGHT_SELECTION_FALLBACK_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SELECTION_FALLBACK_LIMIT);

        let indexing_poll_seconds = std::env::var("PATCHWRIGHT_INDEXING_POLL_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_INDEXING_POLL_SECONDS);

        let indexing_wait_cap_seconds = std::env::var("PATCHWRIGHT_INDEXING_WAIT_CAP_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_INDEXING_WAIT_CAP_SECONDS);

        Self {
            retrieval_top_k,
            selection_fallback_limit,
            indexing_poll_seconds,
            indexing_wait_cap_seconds,
        }
    }
}

/// Queue and worker configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct QueueConfig {
    /// Default attempts before a job fails permanently
    pub attempts: i32,

    /// Exponential backoff base delay in milliseconds
    pub backoff_base_ms: u64,

    /// Completed/failed jobs retained per queue before eviction
    pub retention: i64,

    /// Worker poll interval in milliseconds
    pub poll_interval_ms: u64,
}

impl QueueConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        let attempts = std::env::var("PATCHWRIGHT_QUEUE_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_JOB_ATTEMPTS);

        let backoff_base_ms = std::env::var("PATCHWRIGHT_QUEUE_BACKOFF_BASE_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_BACKOFF_BASE_MS);

        let retention = std::env::var("PATCHWRIGHT_QUEUE_RETENTION")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_JOB_RETENTION);

        let poll_interval_ms = std::env::var("PATCHWRIGHT_QUEUE_POLL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_QUEUE_POLL_MS);

        Self {
            attempts,
            backoff_base_ms,
            retention,
            poll_interval_ms,
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl ApiConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        let host =
            std::env::var("PATCHWRIGHT_API_HOST").unwrap_or_else(|_| DEFAULT_API_HOST.to_string());

        let port = std::env::var("PATCHWRIGHT_API_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_API_PORT);

        let timeout_seconds = std::env::var("PATCHWRIGHT_API_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_API_TIMEOUT_SECONDS);

        Self {
            host,
            port,
            timeout_seconds,
        }
    }
}

impl Validate for ApiConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_non_empty(&self.host, "api.host")?;
        if self.port != 0 {
            validation::validate_port(self.port, "api.port")?;
        }
        validation::validate_range(self.timeout_seconds, 1, 3600, "api.timeout_seconds")?;
        Ok(())
    }
}
