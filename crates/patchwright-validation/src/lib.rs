//! Patchwright validation crate
//!
//! Runs syntax, type, test, and build checks inside a sandboxed repository
//! clone and condenses the outcome into a weighted score. The generation
//! loop gates PR creation on `all_passed`.

pub mod error;
pub mod report;
pub mod validator;

pub use error::{ValidationError, ValidationResult};
pub use report::{
    CheckResult, TestCheckResult, ValidationChecks, ValidationOptions, ValidationReport,
    compute_score,
};
pub use validator::{Validator, ValidatorTimeouts};
