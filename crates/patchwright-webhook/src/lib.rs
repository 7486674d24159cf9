//! Patchwright webhook crate
//!
//! Verifies, classifies, and dispatches forge webhook deliveries: installation
//! bookkeeping, and the full-vs-incremental indexing decision for pushes and
//! pull requests.

pub mod decision;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod signature;

pub use decision::{IndexDecision, ZERO_SHA, decide_index_kind};
pub use dispatcher::{DispatchOutcome, WebhookDispatcher};
pub use error::{WebhookError, WebhookResult};
pub use events::{
    EventKind, InstallationPayload, PullRequestPayload, PushCommit, PushPayload,
    extract_changed_files,
};
pub use signature::{sign, verify_signature};
