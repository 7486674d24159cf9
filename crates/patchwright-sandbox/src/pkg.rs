//! Package manager detection by lockfile presence

use crate::manager::Sandbox;
use serde::{Deserialize, Serialize};

/// Toolchain tag detected for a cloned repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Pnpm,
    Yarn,
    Npm,
    Pip,
    Bundler,
    Cargo,
    Go,
}

impl PackageManager {
    /// Command prefix used to run package scripts
    pub fn run_prefix(self) -> &'static str {
        match self {
            Self::Pnpm => "pnpm",
            Self::Yarn => "yarn",
            Self::Npm => "npm",
            Self::Pip => "python -m",
            Self::Bundler => "bundle exec",
            Self::Cargo => "cargo",
            Self::Go => "go",
        }
    }

    /// Dependency install command for this toolchain
    pub fn install_command(self) -> &'static str {
        match self {
            Self::Pnpm => "pnpm install --frozen-lockfile",
            Self::Yarn => "yarn install --frozen-lockfile",
            Self::Npm => "npm ci || npm install",
            Self::Pip => "pip install -r requirements.txt",
            Self::Bundler => "bundle install",
            Self::Cargo => "cargo fetch",
            Self::Go => "go mod download",
        }
    }
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Self::Pnpm => "pnpm",
            Self::Yarn => "yarn",
            Self::Npm => "npm",
            Self::Pip => "pip",
            Self::Bundler => "bundler",
            Self::Cargo => "cargo",
            Self::Go => "go",
        };
        write!(f, "{tag}")
    }
}

/// Marker files checked in priority order
const DETECTION_ORDER: &[(&str, PackageManager)] = &[
    ("pnpm-lock.yaml", PackageManager::Pnpm),
    ("yarn.lock", PackageManager::Yarn),
    ("package-lock.json", PackageManager::Npm),
    ("requirements.txt", PackageManager::Pip),
    ("pyproject.toml", PackageManager::Pip),
    ("Gemfile", PackageManager::Bundler),
    ("Cargo.toml", PackageManager::Cargo),
    ("go.mod", PackageManager::Go),
];

/// Detect the package manager of a cloned repository
///
/// Checks marker files in priority order under `repo_root`; defaults to npm
/// when nothing matches.
pub async fn detect_package_manager(sandbox: &Sandbox, repo_root: &str) -> PackageManager {
    let root = repo_root.trim_end_matches('/');

    for (marker, manager) in DETECTION_ORDER {
        let path = if root.is_empty() {
            (*marker).to_string()
        } else {
            format!("{root}/{marker}")
        };
        if sandbox.file_exists(&path).await {
            tracing::debug!(marker = %marker, manager = %manager, "Detected package manager");
            return *manager;
        }
    }

    PackageManager::Npm
}
