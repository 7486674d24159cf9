//! Qdrant vector database storage backend
//!
//! Stores chunk embeddings in a single collection partitioned by `repo_id`
//! and `branch` payload keys. Point ids are deterministic (UUID v5 of the
//! partition-qualified chunk id) so re-upserting a chunk overwrites its
//! previous point instead of duplicating it.

use crate::storage::traits::{ChunkMetadata, VectorHit, VectorRecord, VectorStorage};
use crate::{VectorDataError, VectorDataResult};
use async_trait::async_trait;
use patchwright_common::CorrelationId;
use patchwright_config::VectorStorageConfig;
use qdrant_client::qdrant::{
    CollectionExistsRequest, Condition, CountPoints, CreateCollection, DeletePoints, Distance,
    Filter, PointStruct, SearchPoints, UpsertPoints, Value, VectorParams,
};
use qdrant_client::{Payload, Qdrant};
use std::collections::HashMap;

/// Vector database client for storing and searching chunk embeddings
#[derive(Clone)]
pub struct QdrantStorage {
    client: Qdrant,
    collection_name: String,
    vector_dimension: usize,
}

impl QdrantStorage {
    /// Create a new client and verify connectivity
    ///
    /// # Errors
    ///
    /// Returns `VectorDataError::Storage` if the client cannot be built.
    pub fn new(config: &VectorStorageConfig) -> VectorDataResult<Self> {
        let mut builder = Qdrant::from_url(&config.url);

        // If QDRANT_API_KEY is set, use it for authentication
        if let Ok(api_key) = std::env::var("QDRANT_API_KEY") {
            builder = builder.api_key(api_key);
        }

        let client = builder.build().map_err(|e| {
            VectorDataError::Storage(format!("Failed to create Qdrant client: {e}"))
        })?;

        Ok(Self {
            client,
            collection_name: config.collection_name.clone(),
            vector_dimension: config.vector_dimension,
        })
    }

    async fn collection_exists(&self) -> VectorDataResult<bool> {
        let request = CollectionExistsRequest {
            collection_name: self.collection_name.clone(),
        };

        self.client.collection_exists(request).await.map_err(|e| {
            VectorDataError::Storage(format!("Failed to check collection exists: {e}"))
        })
    }

    async fn ensure_collection(&self) -> VectorDataResult<()> {
        if self.collection_exists().await? {
            return Ok(());
        }

        let request = CreateCollection {
            collection_name: self.collection_name.clone(),
            vectors_config: Some(
                VectorParams {
                    size: self.vector_dimension as u64,
                    distance: Distance::Cosine as i32,
                    ..Default::default()
                }
                .into(),
            ),
            ..Default::default()
        };

        match self.client.create_collection(request).await {
            Ok(_) => Ok(()),
            Err(e) => {
                // Race: collection created by another process between check and create
                if e.to_string().contains("already exists") {
                    Ok(())
                } else {
                    Err(VectorDataError::Storage(format!(
                        "Failed to create collection '{}': {e}",
                        self.collection_name
                    )))
                }
            }
        }
    }

    fn partition_filter(repo_id: &str, branch: &str) -> Filter {
        Filter::must([
            Condition::matches("repo_id", repo_id.to_string()),
            Condition::matches("branch", branch.to_string()),
        ])
    }

    async fn delete_by_filter(&self, filter: Filter) -> VectorDataResult<()> {
        let request = DeletePoints {
            collection_name: self.collection_name.clone(),
            points: Some(filter.into()),
            ..Default::default()
        };

        self.client
            .delete_points(request)
            .await
            .map_err(|e| VectorDataError::Storage(format!("Failed to delete points: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl VectorStorage for QdrantStorage {
    #[tracing::instrument(skip(self))]
    async fn initialize(&self, repo_id: &str, branch: &str) -> VectorDataResult<()> {
        self.ensure_collection().await?;
        // Full index replaces everything previously stored for this partition
        self.delete_by_filter(Self::partition_filter(repo_id, branch))
            .await
    }

    #[tracing::instrument(skip(self, records), fields(record_count = records.len()))]
    async fn upsert_vectors(
        &self,
        records: &[VectorRecord],
        correlation_id: &CorrelationId,
    ) -> VectorDataResult<usize> {
        let mut points = Vec::with_capacity(records.len());

        for record in records {
            if record.vector.is_empty() {
                continue;
            }
            if record.vector.len() != self.vector_dimension {
                return Err(VectorDataError::DimensionMismatch {
                    expected: self.vector_dimension,
                    actual: record.vector.len(),
                });
            }

            let meta = &record.metadata;
            let mut payload = HashMap::new();
            payload.insert("chunk_id".to_string(), Value::from(record.chunk_id.clone()));
            payload.insert("repo_id".to_string(), Value::from(meta.repo_id.clone()));
            payload.insert("branch".to_string(), Value::from(meta.branch.clone()));
            payload.insert("file_path".to_string(), Value::from(meta.file_path.clone()));
            payload.insert("line_start".to_string(), Value::from(meta.line_start as i64));
            payload.insert("line_end".to_string(), Value::from(meta.line_end as i64));
            payload.insert("chunk_type".to_string(), Value::from(meta.chunk_type.clone()));
            payload.insert(
                "content_preview".to_string(),
                Value::from(meta.content_preview.clone()),
            );

            points.push(PointStruct::new(
                record.point_id().to_string(),
                record.vector.clone(),
                Payload::from(payload),
            ));
        }

        if points.is_empty() {
            return Ok(0);
        }

        let written = points.len();
        tracing::info!(
            correlation_id = %correlation_id,
            collection = %self.collection_name,
            points = written,
            "Upserting chunk vectors"
        );

        let request = UpsertPoints {
            collection_name: self.collection_name.clone(),
            points,
            ..Default::default()
        };

        self.client
            .upsert_points(request)
            .await
            .map_err(|e| VectorDataError::Storage(format!("Failed to upsert vectors: {e}")))?;

        Ok(written)
    }

    async fn delete_by_file_path(
        &self,
        repo_id: &str,
        branch: &str,
        file_path: &str,
    ) -> VectorDataResult<()> {
        let filter = Filter::must([
            Condition::matches("repo_id", repo_id.to_string()),
            Condition::matches("branch", branch.to_string()),
            Condition::matches("file_path", file_path.to_string()),
        ]);
        self.delete_by_filter(filter).await
    }

    #[tracing::instrument(skip(self, vector), fields(query_dim = vector.len(), top_k))]
    async fn query(
        &self,
        repo_id: &str,
        branch: &str,
        vector: Vec<f32>,
        top_k: usize,
        correlation_id: &CorrelationId,
    ) -> VectorDataResult<Vec<VectorHit>> {
        tracing::debug!(
            correlation_id = %correlation_id,
            repo_id = %repo_id,
            branch = %branch,
            top_k = top_k,
            "Performing vector search"
        );

        let request = SearchPoints {
            collection_name: self.collection_name.clone(),
            vector,
            limit: top_k as u64,
            filter: Some(Self::partition_filter(repo_id, branch)),
            with_payload: Some(true.into()),
            ..Default::default()
        };

        let response = self
            .client
            .search_points(request)
            .await
            .map_err(|e| VectorDataError::Storage(format!("Search failed: {e}")))?;

        let mut hits = Vec::with_capacity(response.result.len());
        for scored in response.result {
            let payload = &scored.payload;
            let get_str = |key: &str| {
                payload
                    .get(key)
                    .and_then(|v| v.as_str())
                    .map(std::string::ToString::to_string)
                    .unwrap_or_default()
            };
            let get_usize = |key: &str| {
                payload
                    .get(key)
                    .and_then(|v| v.as_integer())
                    .and_then(|v| usize::try_from(v).ok())
                    .unwrap_or(0)
            };

            hits.push(VectorHit {
                chunk_id: get_str("chunk_id"),
                score: scored.score,
                metadata: ChunkMetadata {
                    repo_id: get_str("repo_id"),
                    branch: get_str("branch"),
                    file_path: get_str("file_path"),
                    line_start: get_usize("line_start"),
                    line_end: get_usize("line_end"),
                    chunk_type: get_str("chunk_type"),
                    content_preview: get_str("content_preview"),
                },
            });
        }

        Ok(hits)
    }

    async fn count(&self, repo_id: &str, branch: &str) -> VectorDataResult<usize> {
        let request = CountPoints {
            collection_name: self.collection_name.clone(),
            filter: Some(Self::partition_filter(repo_id, branch)),
            exact: Some(true),
            ..Default::default()
        };

        let response = self
            .client
            .count(request)
            .await
            .map_err(|e| VectorDataError::Storage(format!("Count failed: {e}")))?;

        Ok(response
            .result
            .map(|r| r.count as usize)
            .unwrap_or_default())
    }
}
