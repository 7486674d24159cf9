//! Generation queue job handler

use crate::pipeline::GenerationPipeline;
use async_trait::async_trait;
use patchwright_common::CorrelationId;
use patchwright_queue::{Job, JobHandler, JobProgress, ProcessTaskPayload};
use std::sync::Arc;

/// Consumes `process` jobs from the generation queue
pub struct GenerationJobHandler {
    pipeline: Arc<GenerationPipeline>,
}

impl GenerationJobHandler {
    pub fn new(pipeline: Arc<GenerationPipeline>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl JobHandler for GenerationJobHandler {
    async fn handle(&self, job: &Job, progress: &JobProgress) -> Result<serde_json::Value, String> {
        let correlation_id = CorrelationId::new();

        let payload: ProcessTaskPayload = job
            .typed_payload()
            .map_err(|e| format!("Invalid process payload: {e}"))?;

        let outcome = self
            .pipeline
            .run(&payload, progress, &correlation_id)
            .await
            .map_err(|e| e.to_string())?;

        serde_json::to_value(&outcome).map_err(|e| format!("Failed to serialize outcome: {e}"))
    }
}
