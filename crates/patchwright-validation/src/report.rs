//! Validation report types and scoring
//!
//! Scoring is a pure function over check outcomes so the weights are
//! testable without a sandbox.

use serde::{Deserialize, Serialize};

const SYNTAX_WEIGHT: f32 = 0.2;
const TYPES_WEIGHT: f32 = 0.2;
const TESTS_WEIGHT: f32 = 0.6;

/// Which checks to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOptions {
    pub check_syntax: bool,
    pub check_types: bool,
    pub run_tests: bool,
    pub run_build: bool,
}

impl ValidationOptions {
    /// The conservative set the generation loop uses: syntax and types only
    pub fn conservative() -> Self {
        Self {
            check_syntax: true,
            check_types: true,
            run_tests: false,
            run_build: false,
        }
    }

    /// Everything on
    pub fn full() -> Self {
        Self {
            check_syntax: true,
            check_types: true,
            run_tests: true,
            run_build: true,
        }
    }
}

/// Outcome of one pass/fail check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub passed: bool,
    pub errors: Vec<String>,
}

impl CheckResult {
    pub fn passing() -> Self {
        Self {
            passed: true,
            errors: Vec::new(),
        }
    }
}

/// Outcome of the test run, with counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCheckResult {
    pub passed: bool,
    pub pass_count: u32,
    pub fail_count: u32,
    pub errors: Vec<String>,
}

impl TestCheckResult {
    /// No detectable test runner: neutral result
    pub fn neutral() -> Self {
        Self {
            passed: true,
            pass_count: 0,
            fail_count: 0,
            errors: Vec::new(),
        }
    }

    fn ratio(&self) -> f32 {
        let total = self.pass_count + self.fail_count;
        if total == 0 {
            // Neutral: no runner or no tests discovered
            1.0
        } else {
            self.pass_count as f32 / total as f32
        }
    }
}

/// Per-check outcomes; `None` means the check wasn't requested or was
/// skipped by a short-circuit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationChecks {
    pub syntax: Option<CheckResult>,
    pub types: Option<CheckResult>,
    pub tests: Option<TestCheckResult>,
    pub build: Option<CheckResult>,
}

/// The validator's structured verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub all_passed: bool,
    /// Weighted score in [0, 1]
    pub score: f32,
    pub error_count: usize,
    pub checks: ValidationChecks,
    pub execution_time_ms: u64,
}

impl ValidationReport {
    /// Flatten every error message across checks, for prompt feedback
    pub fn all_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let Some(check) = &self.checks.syntax {
            errors.extend(check.errors.iter().cloned());
        }
        if let Some(check) = &self.checks.types {
            errors.extend(check.errors.iter().cloned());
        }
        if let Some(check) = &self.checks.tests {
            errors.extend(check.errors.iter().cloned());
        }
        if let Some(check) = &self.checks.build {
            errors.extend(check.errors.iter().cloned());
        }
        errors
    }
}

/// Weighted score: syntax 0.2, types 0.2, tests 0.6 x pass ratio
///
/// Checks that didn't run contribute their full weight; only observed
/// failures subtract.
pub fn compute_score(checks: &ValidationChecks) -> f32 {
    let syntax = checks
        .syntax
        .as_ref()
        .map_or(1.0, |c| if c.passed { 1.0 } else { 0.0 });
    let types = checks
        .types
        .as_ref()
        .map_or(1.0, |c| if c.passed { 1.0 } else { 0.0 });
    let tests = checks.tests.as_ref().map_or(1.0, TestCheckResult::ratio);

    SYNTAX_WEIGHT * syntax + TYPES_WEIGHT * types + TESTS_WEIGHT * tests
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_passing_scores_one() {
        let checks = ValidationChecks {
            syntax: Some(CheckResult::passing()),
            types: Some(CheckResult::passing()),
            tests: Some(TestCheckResult {
                passed: true,
                pass_count: 10,
                fail_count: 0,
                errors: Vec::new(),
            }),
            build: None,
        };
        assert!((compute_score(&checks) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn failing_types_costs_their_weight() {
        let checks = ValidationChecks {
            syntax: Some(CheckResult::passing()),
            types: Some(CheckResult {
                passed: false,
                errors: vec!["error TS2322".to_string()],
            }),
            tests: None,
            build: None,
        };
        assert!((compute_score(&checks) - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn partial_test_failures_scale_the_test_weight() {
        let checks = ValidationChecks {
            syntax: Some(CheckResult::passing()),
            types: Some(CheckResult::passing()),
            tests: Some(TestCheckResult {
                passed: false,
                pass_count: 3,
                fail_count: 1,
                errors: Vec::new(),
            }),
            build: None,
        };
        // 0.2 + 0.2 + 0.6 * 0.75
        assert!((compute_score(&checks) - 0.85).abs() < 1e-6);
    }

    #[test]
    fn missing_test_runner_is_neutral() {
        let checks = ValidationChecks {
            syntax: Some(CheckResult::passing()),
            types: Some(CheckResult::passing()),
            tests: Some(TestCheckResult::neutral()),
            build: None,
        };
        assert!((compute_score(&checks) - 1.0).abs() < f32::EPSILON);

        let neutral = TestCheckResult::neutral();
        assert!(neutral.passed);
        assert_eq!((neutral.pass_count, neutral.fail_count), (0, 0));
    }
}
