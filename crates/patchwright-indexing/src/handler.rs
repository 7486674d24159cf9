//! Indexing queue job handler

use crate::pipeline::IndexingPipeline;
use async_trait::async_trait;
use patchwright_common::CorrelationId;
use patchwright_queue::{
    IncrementalIndexPayload, IndexRepoPayload, Job, JobHandler, JobProgress,
};
use std::sync::Arc;

/// Consumes both job kinds of the `indexing` queue
///
/// The two payloads share a queue; the presence of `changedFiles`
/// distinguishes an incremental job from a full one.
pub struct IndexingJobHandler {
    pipeline: Arc<IndexingPipeline>,
}

impl IndexingJobHandler {
    pub fn new(pipeline: Arc<IndexingPipeline>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl JobHandler for IndexingJobHandler {
    async fn handle(&self, job: &Job, progress: &JobProgress) -> Result<serde_json::Value, String> {
        let correlation_id = CorrelationId::new();

        let summary = if job.payload.get("changedFiles").is_some() {
            let payload: IncrementalIndexPayload = job
                .typed_payload()
                .map_err(|e| format!("Invalid incremental-index payload: {e}"))?;
            self.pipeline
                .incremental_index(&payload, progress, &correlation_id)
                .await
                .map_err(|e| e.to_string())?
        } else {
            let payload: IndexRepoPayload = job
                .typed_payload()
                .map_err(|e| format!("Invalid index-repo payload: {e}"))?;
            self.pipeline
                .full_index(&payload, progress, &correlation_id)
                .await
                .map_err(|e| e.to_string())?
        };

        serde_json::to_value(&summary).map_err(|e| format!("Failed to serialize summary: {e}"))
    }
}
