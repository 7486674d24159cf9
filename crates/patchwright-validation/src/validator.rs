//! Runs validation checks inside a sandbox

use crate::report::{
    CheckResult, TestCheckResult, ValidationChecks, ValidationOptions, ValidationReport,
    compute_score,
};
use crate::ValidationResult;
use once_cell::sync::Lazy;
use patchwright_sandbox::{PackageManager, Sandbox};
use regex::Regex;
use std::time::{Duration, Instant};

/// Cap on error lines extracted from one check's output
const MAX_ERROR_LINES: usize = 50;

static ERROR_LINE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)\berror\b|\bfailed\b|\bFAIL\b").ok());

static PASSED_COUNT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(\d+)\s+pass(?:ed|ing)?").ok());
static FAILED_COUNT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(\d+)\s+fail(?:ed|ing)?").ok());

/// Per-check timeouts
#[derive(Debug, Clone, Copy)]
pub struct ValidatorTimeouts {
    pub command: Duration,
    pub test: Duration,
    pub build: Duration,
}

impl Default for ValidatorTimeouts {
    fn default() -> Self {
        Self {
            command: Duration::from_secs(3 * 60),
            test: Duration::from_secs(5 * 60),
            build: Duration::from_secs(10 * 60),
        }
    }
}

/// Runs the configured checks for the detected toolchain
pub struct Validator {
    timeouts: ValidatorTimeouts,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidatorTimeouts::default())
    }
}

impl Validator {
    pub fn new(timeouts: ValidatorTimeouts) -> Self {
        Self { timeouts }
    }

    /// Run the requested checks and produce a structured report
    ///
    /// If the syntax check fails, later checks are skipped and the report is
    /// returned immediately.
    ///
    /// # Errors
    /// Returns sandbox failures; check failures are data, not errors.
    pub async fn validate(
        &self,
        sandbox: &Sandbox,
        repo_root: &str,
        package_manager: PackageManager,
        options: ValidationOptions,
    ) -> ValidationResult<ValidationReport> {
        let started = Instant::now();
        let mut checks = ValidationChecks::default();

        if options.check_syntax {
            let syntax = self
                .run_check(
                    sandbox,
                    repo_root,
                    syntax_command(sandbox, repo_root, package_manager).await,
                    self.timeouts.command,
                )
                .await?;
            let failed = !syntax.passed;
            checks.syntax = Some(syntax);

            // Syntax failure short-circuits the rest
            if failed {
                return Ok(finish_report(checks, started));
            }
        }

        if options.check_types {
            let types = self
                .run_check(
                    sandbox,
                    repo_root,
                    types_command(sandbox, repo_root, package_manager).await,
                    self.timeouts.command,
                )
                .await?;
            checks.types = Some(types);
        }

        if options.run_tests {
            checks.tests = Some(
                self.run_tests(sandbox, repo_root, package_manager)
                    .await?,
            );
        }

        if options.run_build {
            let build = self
                .run_check(
                    sandbox,
                    repo_root,
                    build_command(package_manager),
                    self.timeouts.build,
                )
                .await?;
            checks.build = Some(build);
        }

        Ok(finish_report(checks, started))
    }

    async fn run_check(
        &self,
        sandbox: &Sandbox,
        repo_root: &str,
        command: Option<String>,
        timeout: Duration,
    ) -> ValidationResult<CheckResult> {
        let Some(command) = command else {
            // No applicable tool detected: neutral pass
            return Ok(CheckResult::passing());
        };

        tracing::debug!(command = %command, "Running validation check");
        let output = sandbox
            .run_command(&command, Some(repo_root), timeout)
            .await?;

        if output.success() {
            Ok(CheckResult::passing())
        } else {
            Ok(CheckResult {
                passed: false,
                errors: extract_error_lines(&output.combined()),
            })
        }
    }

    async fn run_tests(
        &self,
        sandbox: &Sandbox,
        repo_root: &str,
        package_manager: PackageManager,
    ) -> ValidationResult<TestCheckResult> {
        let Some(command) = test_command(sandbox, repo_root, package_manager).await else {
            return Ok(TestCheckResult::neutral());
        };

        tracing::debug!(command = %command, "Running test check");
        let output = sandbox
            .run_command(&command, Some(repo_root), self.timeouts.test)
            .await?;

        let combined = output.combined();
        let (pass_count, fail_count) = parse_test_counts(&combined);

        if output.success() && fail_count == 0 {
            Ok(TestCheckResult {
                passed: true,
                pass_count,
                fail_count,
                errors: Vec::new(),
            })
        } else {
            Ok(TestCheckResult {
                passed: false,
                // A failing exit with no parsed counts still means >0 failures
                fail_count: fail_count.max(1),
                pass_count,
                errors: extract_error_lines(&combined),
            })
        }
    }
}

fn finish_report(checks: ValidationChecks, started: Instant) -> ValidationReport {
    let all_passed = checks.syntax.as_ref().is_none_or(|c| c.passed)
        && checks.types.as_ref().is_none_or(|c| c.passed)
        && checks.tests.as_ref().is_none_or(|c| c.passed)
        && checks.build.as_ref().is_none_or(|c| c.passed);

    let error_count = checks.syntax.as_ref().map_or(0, |c| c.errors.len())
        + checks.types.as_ref().map_or(0, |c| c.errors.len())
        + checks.tests.as_ref().map_or(0, |c| c.errors.len())
        + checks.build.as_ref().map_or(0, |c| c.errors.len());

    ValidationReport {
        all_passed,
        score: compute_score(&checks),
        error_count,
        checks,
        execution_time_ms: started.elapsed().as_millis() as u64,
    }
}

async fn has_marker(sandbox: &Sandbox, repo_root: &str, marker: &str) -> bool {
    let root = repo_root.trim_end_matches('/');
    let path = if root.is_empty() {
        marker.to_string()
    } else {
        format!("{root}/{marker}")
    };
    sandbox.file_exists(&path).await
}

/// Syntax check for the detected toolchain, `None` when nothing applies
async fn syntax_command(
    sandbox: &Sandbox,
    repo_root: &str,
    package_manager: PackageManager,
) -> Option<String> {
    match package_manager {
        PackageManager::Npm | PackageManager::Pnpm | PackageManager::Yarn => {
            if has_marker(sandbox, repo_root, "tsconfig.json").await {
                Some("npx tsc --noEmit --skipLibCheck".to_string())
            } else {
                None
            }
        }
        PackageManager::Pip => Some("python -m compileall -q .".to_string()),
        PackageManager::Cargo => Some("cargo check --quiet".to_string()),
        PackageManager::Go => Some("go vet ./...".to_string()),
        PackageManager::Bundler => None,
    }
}

/// Type check for the detected toolchain
async fn types_command(
    sandbox: &Sandbox,
    repo_root: &str,
    package_manager: PackageManager,
) -> Option<String> {
    match package_manager {
        PackageManager::Npm | PackageManager::Pnpm | PackageManager::Yarn => {
            if has_marker(sandbox, repo_root, "tsconfig.json").await {
                Some("npx tsc --noEmit".to_string())
            } else {
                None
            }
        }
        PackageManager::Pip => {
            if has_marker(sandbox, repo_root, "mypy.ini").await {
                Some("python -m mypy .".to_string())
            } else {
                None
            }
        }
        // cargo check / go vet already cover typing at the syntax stage
        PackageManager::Cargo | PackageManager::Go | PackageManager::Bundler => None,
    }
}

/// Test command when a runner is detectable, `None` otherwise
async fn test_command(
    sandbox: &Sandbox,
    repo_root: &str,
    package_manager: PackageManager,
) -> Option<String> {
    match package_manager {
        PackageManager::Npm | PackageManager::Pnpm | PackageManager::Yarn => {
            // A test script in package.json is the runner marker
            let root = repo_root.trim_end_matches('/');
            let manifest = if root.is_empty() {
                "package.json".to_string()
            } else {
                format!("{root}/package.json")
            };
            let content = sandbox.read_file(&manifest).await.ok()?;
            if content.contains("\"test\":") {
                Some(format!("{} test", package_manager.run_prefix()))
            } else {
                None
            }
        }
        PackageManager::Pip => {
            if has_marker(sandbox, repo_root, "pytest.ini").await
                || has_marker(sandbox, repo_root, "pyproject.toml").await
            {
                Some("python -m pytest -q".to_string())
            } else {
                None
            }
        }
        PackageManager::Cargo => Some("cargo test --quiet".to_string()),
        PackageManager::Go => Some("go test ./...".to_string()),
        PackageManager::Bundler => {
            if has_marker(sandbox, repo_root, "spec").await {
                Some("bundle exec rspec".to_string())
            } else {
                None
            }
        }
    }
}

fn build_command(package_manager: PackageManager) -> Option<String> {
    match package_manager {
        PackageManager::Npm | PackageManager::Pnpm | PackageManager::Yarn => Some(format!(
            "{} run build --if-present",
            package_manager.run_prefix()
        )),
        PackageManager::Cargo => Some("cargo build --quiet".to_string()),
        PackageManager::Go => Some("go build ./...".to_string()),
        PackageManager::Pip | PackageManager::Bundler => None,
    }
}

/// Pull error-looking lines out of compiler/runner output
fn extract_error_lines(output: &str) -> Vec<String> {
    let Some(pattern) = ERROR_LINE.as_ref() else {
        return vec![output.to_string()];
    };

    let lines: Vec<String> = output
        .lines()
        .filter(|line| pattern.is_match(line))
        .take(MAX_ERROR_LINES)
        .map(str::to_string)
        .collect();

    if lines.is_empty() {
        // Nothing matched the pattern; keep the tail so the caller sees why
        output
            .lines()
            .rev()
            .take(10)
            .map(str::to_string)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect()
    } else {
        lines
    }
}

/// Best-effort pass/fail counts from runner output
fn parse_test_counts(output: &str) -> (u32, u32) {
    let passed = PASSED_COUNT
        .as_ref()
        .and_then(|re| re.captures(output))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    let failed = FAILED_COUNT
        .as_ref()
        .and_then(|re| re.captures(output))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    (passed, failed)
}
