//! Repository file enumeration and clone-URL validation

use crate::{IndexingError, IndexingResult};
use once_cell::sync::Lazy;
use patchwright_sandbox::Sandbox;
use regex::Regex;

/// Directory inside the sandbox holding the working tree
pub const REPO_DIR: &str = "repo";

/// Directories never indexed
const EXCLUDED_DIRS: &[&str] = &["node_modules", ".git", "dist", "build", ".next", "coverage"];

/// Extensions enumerated as code files
const CODE_EXTENSIONS: &[&str] = &[
    "js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts", "py", "rb", "go", "rs", "java", "c",
    "h", "cpp", "hpp", "cs", "php", "swift", "kt", "vue", "svelte",
];

static REPO_URL: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^https://github\.com/[\w-]+/[\w.-]+(?:\.git)?$").ok());

/// Reject anything that isn't a plain GitHub HTTPS clone URL
///
/// # Errors
/// Returns `IndexingError::InvalidRepoUrl` on mismatch.
pub fn validate_repo_url(url: &str) -> IndexingResult<()> {
    let valid = REPO_URL
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(url));
    if valid {
        Ok(())
    } else {
        Err(IndexingError::InvalidRepoUrl(url.to_string()))
    }
}

/// Whether a repo-relative path should be indexed
pub fn is_indexable_path(path: &str) -> bool {
    let excluded = path
        .split('/')
        .any(|segment| EXCLUDED_DIRS.contains(&segment));
    if excluded {
        return false;
    }

    let extension = path.rsplit('.').next().unwrap_or("").to_lowercase();
    CODE_EXTENSIONS.contains(&extension.as_str())
}

/// List indexable files of the cloned working tree, repo-relative
///
/// # Errors
/// Returns sandbox failures from the tree listing.
pub async fn enumerate_code_files(sandbox: &Sandbox) -> IndexingResult<Vec<String>> {
    let tree = sandbox.file_tree(REPO_DIR).await?;
    Ok(tree.into_iter().filter(|p| is_indexable_path(p)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_github_urls() {
        assert!(validate_repo_url("https://github.com/octo/app").is_ok());
        assert!(validate_repo_url("https://github.com/octo/app.git").is_ok());
        assert!(validate_repo_url("https://github.com/octo-org/my.repo").is_ok());
    }

    #[test]
    fn rejects_everything_else() {
        for url in [
            "http://github.com/octo/app",
            "https://gitlab.com/octo/app",
            "https://github.com/octo/app/tree/main",
            "git@github.com:octo/app.git",
            "https://github.com/octo/app;rm -rf /",
            "",
        ] {
            assert!(validate_repo_url(url).is_err(), "should reject {url}");
        }
    }

    #[test]
    fn excluded_directories_are_skipped() {
        assert!(!is_indexable_path("node_modules/lodash/index.js"));
        assert!(!is_indexable_path("packages/app/dist/bundle.js"));
        assert!(!is_indexable_path(".next/server/page.js"));
        assert!(is_indexable_path("src/server/page.ts"));
    }

    #[test]
    fn only_code_extensions_are_enumerated() {
        assert!(is_indexable_path("src/a.ts"));
        assert!(is_indexable_path("lib/b.py"));
        assert!(!is_indexable_path("README.md"));
        assert!(!is_indexable_path("logo.png"));
        assert!(!is_indexable_path("Makefile"));
    }
}
