//! Patchwright generation crate
//!
//! The task-to-pull-request pipeline: wait on upstream indexing, retrieve
//! candidate chunks, build skeletons, drive the LLM through a bounded
//! generate-validate loop inside the sandbox, and on success commit a branch
//! and open a pull request.

pub mod branch;
pub mod diff;
pub mod error;
pub mod handler;
pub mod pipeline;
pub mod statemachine;

pub use branch::{branch_name_for_task, slug_of};
pub use diff::{
    FileDiff, LOCKFILE_DENYLIST, collect_file_diffs, detect_default_branch, synthesize_unified_diff,
};
pub use error::{GenerationError, GenerationResult};
pub use handler::GenerationJobHandler;
pub use pipeline::{GenerationOutcome, GenerationPipeline, PipelineSettings};
pub use statemachine::{LoopState, LoopTransition, advance};
