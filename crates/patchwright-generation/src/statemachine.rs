//! The generate-validate loop as a pure transition function
//!
//! IO (LLM calls, file operations, validator runs) lives in the pipeline;
//! this module only decides what happens next given a validation outcome, so
//! the loop's bounds and guards are testable in isolation.

use patchwright_validation::ValidationReport;

/// Loop state carried between iterations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopState {
    /// Completed generate-validate rounds
    pub iteration: u32,
    /// Errors from the last validation, fed verbatim into the next prompt
    pub validation_errors: Vec<String>,
}

impl LoopState {
    pub fn initial() -> Self {
        Self::default()
    }
}

/// Where the loop goes after one validation
#[derive(Debug, Clone, PartialEq)]
pub enum LoopTransition {
    /// All checks passed: proceed to PR creation
    CreatePr,
    /// Checks failed with iterations remaining: regenerate with the errors
    Retry(LoopState),
    /// Iteration bound reached: terminal failure carrying the last error set
    Failed { iterations: u32, errors: Vec<String> },
}

/// Advance the loop after a validation run
///
/// Guards: `all_passed` routes to PR creation regardless of iteration count;
/// otherwise the loop retries until `max_iterations` rounds have completed.
pub fn advance(state: &LoopState, report: &ValidationReport, max_iterations: u32) -> LoopTransition {
    let completed = state.iteration + 1;

    if report.all_passed {
        return LoopTransition::CreatePr;
    }

    let errors = report.all_errors();
    if completed >= max_iterations {
        LoopTransition::Failed {
            iterations: completed,
            errors,
        }
    } else {
        LoopTransition::Retry(LoopState {
            iteration: completed,
            validation_errors: errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchwright_validation::{CheckResult, ValidationChecks, ValidationReport, compute_score};

    fn report(all_passed: bool, errors: Vec<&str>) -> ValidationReport {
        let checks = ValidationChecks {
            syntax: Some(CheckResult::passing()),
            types: Some(CheckResult {
                passed: all_passed,
                errors: errors.iter().map(|e| (*e).to_string()).collect(),
            }),
            tests: None,
            build: None,
        };
        ValidationReport {
            all_passed,
            score: compute_score(&checks),
            error_count: errors.len(),
            checks,
            execution_time_ms: 1,
        }
    }

    #[test]
    fn passing_validation_goes_to_pr_creation() {
        let transition = advance(&LoopState::initial(), &report(true, vec![]), 3);
        assert_eq!(transition, LoopTransition::CreatePr);
    }

    #[test]
    fn failing_validation_retries_with_errors() {
        let transition = advance(
            &LoopState::initial(),
            &report(false, vec!["error TS2304"]),
            3,
        );

        let LoopTransition::Retry(next) = transition else {
            panic!("expected retry");
        };
        assert_eq!(next.iteration, 1);
        assert_eq!(next.validation_errors, vec!["error TS2304"]);
    }

    #[test]
    fn loop_terminates_at_max_iterations() {
        let mut state = LoopState::initial();
        let failing = report(false, vec!["still broken"]);

        for _ in 0..2 {
            match advance(&state, &failing, 3) {
                LoopTransition::Retry(next) => state = next,
                other => panic!("expected retry, got {other:?}"),
            }
        }

        let transition = advance(&state, &failing, 3);
        let LoopTransition::Failed { iterations, errors } = transition else {
            panic!("expected terminal failure");
        };
        assert_eq!(iterations, 3);
        assert_eq!(errors, vec!["still broken"]);
    }

    #[test]
    fn iteration_count_never_exceeds_bound() {
        let mut state = LoopState::initial();
        let failing = report(false, vec!["x"]);

        let mut transitions = 0;
        loop {
            transitions += 1;
            match advance(&state, &failing, 3) {
                LoopTransition::Retry(next) => state = next,
                LoopTransition::Failed { iterations, .. } => {
                    assert!(iterations <= 3);
                    break;
                }
                LoopTransition::CreatePr => panic!("failing report cannot pass"),
            }
            assert!(transitions <= 3, "loop must terminate");
        }
    }

    #[test]
    fn pass_on_final_iteration_still_creates_pr() {
        let state = LoopState {
            iteration: 2,
            validation_errors: vec!["previous".to_string()],
        };
        assert_eq!(advance(&state, &report(true, vec![]), 3), LoopTransition::CreatePr);
    }
}
