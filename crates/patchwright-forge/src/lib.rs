//! Patchwright forge provider crate
//!
//! The forge is an external collaborator: this crate pins down the contract
//! the pipelines rely on (installation tokens, default-branch lookup, pull
//! request creation) and ships a thin GitHub REST implementation plus a mock.

pub mod client;
pub mod error;
pub mod github;
pub mod mock;

pub use client::{CreatedPullRequest, ForgeClient, PullRequestSpec, authenticated_clone_url};
pub use error::{ForgeError, ForgeResult};
pub use github::GithubClient;
pub use mock::MockForge;
