//! Domain models for database entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A forge app installation
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Installation {
    pub installation_id: i64,
    pub account_login: String,
    pub account_type: String,
    pub installed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A repository covered by an installation
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RepositoryRecord {
    pub github_id: i64,
    pub name: String,
    /// `owner/name`, unique across the table
    pub full_name: String,
    pub private: bool,
    pub installation_id: i64,
    pub added_at: DateTime<Utc>,
    pub removed_at: Option<DateTime<Utc>>,
}

/// How the last index run covered the repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    Full,
    Incremental,
}

impl std::str::FromStr for IndexType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(Self::Full),
            "incremental" => Ok(Self::Incremental),
            _ => Err(format!("Invalid index type: {s}")),
        }
    }
}

impl std::fmt::Display for IndexType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Self::Full => "full",
            Self::Incremental => "incremental",
        };
        write!(f, "{kind}")
    }
}

/// Per-repository/branch index state
///
/// A repository counts as indexed exactly when a meta record exists with a
/// non-empty `last_indexed_sha`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMeta {
    pub repo_id: String,
    pub branch: String,
    pub last_indexed_at: DateTime<Utc>,
    pub last_index_type: IndexType,
    pub last_indexed_sha: String,
}

impl IndexMeta {
    /// Whether this record satisfies the indexed invariant
    pub fn marks_indexed(&self) -> bool {
        !self.last_indexed_sha.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_type_round_trips() {
        assert_eq!("full".parse::<IndexType>().unwrap(), IndexType::Full);
        assert_eq!(IndexType::Incremental.to_string(), "incremental");
        assert!("partial".parse::<IndexType>().is_err());
    }

    #[test]
    fn empty_sha_does_not_mark_indexed() {
        let meta = IndexMeta {
            repo_id: "r".to_string(),
            branch: "main".to_string(),
            last_indexed_at: Utc::now(),
            last_index_type: IndexType::Full,
            last_indexed_sha: String::new(),
        };
        assert!(!meta.marks_indexed());
    }
}
