//! In-memory mock storage for tests

use crate::storage::traits::{VectorHit, VectorRecord, VectorStorage};
use crate::VectorDataResult;
use async_trait::async_trait;
use patchwright_common::CorrelationId;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Exact-scan mock of [`VectorStorage`]
///
/// Stores records in a map keyed by deterministic point id and answers
/// queries with an exact cosine-similarity scan, so tests get the same
/// semantics as the real backend without a running server.
#[derive(Default)]
pub struct MockStorage {
    points: Mutex<HashMap<Uuid, VectorRecord>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// All chunk ids currently stored for a partition (test helper)
    pub async fn chunk_ids(&self, repo_id: &str, branch: &str) -> Vec<String> {
        let points = self.points.lock().await;
        let mut ids: Vec<String> = points
            .values()
            .filter(|r| r.metadata.repo_id == repo_id && r.metadata.branch == branch)
            .map(|r| r.chunk_id.clone())
            .collect();
        ids.sort();
        ids
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStorage for MockStorage {
    async fn initialize(&self, repo_id: &str, branch: &str) -> VectorDataResult<()> {
        let mut points = self.points.lock().await;
        points.retain(|_, r| !(r.metadata.repo_id == repo_id && r.metadata.branch == branch));
        Ok(())
    }

    async fn upsert_vectors(
        &self,
        records: &[VectorRecord],
        _correlation_id: &CorrelationId,
    ) -> VectorDataResult<usize> {
        let mut points = self.points.lock().await;
        let mut written = 0;
        for record in records {
            if record.vector.is_empty() {
                continue;
            }
            points.insert(record.point_id(), record.clone());
            written += 1;
        }
        Ok(written)
    }

    async fn delete_by_file_path(
        &self,
        repo_id: &str,
        branch: &str,
        file_path: &str,
    ) -> VectorDataResult<()> {
        let mut points = self.points.lock().await;
        points.retain(|_, r| {
            !(r.metadata.repo_id == repo_id
                && r.metadata.branch == branch
                && r.metadata.file_path == file_path)
        });
        Ok(())
    }

    async fn query(
        &self,
        repo_id: &str,
        branch: &str,
        vector: Vec<f32>,
        top_k: usize,
        _correlation_id: &CorrelationId,
    ) -> VectorDataResult<Vec<VectorHit>> {
        let points = self.points.lock().await;
        let mut hits: Vec<VectorHit> = points
            .values()
            .filter(|r| r.metadata.repo_id == repo_id && r.metadata.branch == branch)
            .map(|r| VectorHit {
                chunk_id: r.chunk_id.clone(),
                score: cosine_similarity(&r.vector, &vector),
                metadata: r.metadata.clone(),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk_id.cmp(&b.chunk_id))
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn count(&self, repo_id: &str, branch: &str) -> VectorDataResult<usize> {
        let points = self.points.lock().await;
        Ok(points
            .values()
            .filter(|r| r.metadata.repo_id == repo_id && r.metadata.branch == branch)
            .count())
    }
}
