//! Patchwright LLM crate
//!
//! The LLM provider contract plus the two typed operations the generation
//! pipeline performs: selecting files to modify (from skeletons) and
//! generating structured file operations. Model output is only ever
//! interpreted through the strict [`GenerateOutput`] schema or the liberal
//! path parser; nothing else leaks out of this crate.

pub mod error;
pub mod extraction;
pub mod prompts;
pub mod provider;
pub mod schema;

pub use error::{LlmError, LlmResult};
pub use extraction::{parse_generate_output, parse_selected_paths};
pub use prompts::{build_generation_prompt, build_selection_prompt};
pub use provider::{CompletionRequest, HttpLlmProvider, LlmProvider, MockLlm};
pub use schema::GenerateOutput;
