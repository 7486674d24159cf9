//! Full-vs-incremental indexing decision

use serde::{Deserialize, Serialize};

/// Git's all-zero object id, seen as `before` on force pushes and new branches
pub const ZERO_SHA: &str = "0000000000000000000000000000000000000000";

/// What kind of indexing a push should trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "reason")]
pub enum IndexDecision {
    /// Reindex everything, with the reason for choosing so
    Full(String),
    /// Only touch the changed files
    Incremental,
}

/// Decide between full and incremental indexing for a push
///
/// In order: unindexed repositories, force pushes (all-zero before sha),
/// empty change sets (re-baseline), and change sets above the threshold all
/// force a full reindex; everything else goes incremental.
pub fn decide_index_kind(
    is_indexed: bool,
    before_sha: &str,
    total_changes: usize,
    threshold: usize,
) -> IndexDecision {
    if !is_indexed {
        return IndexDecision::Full("Not indexed".to_string());
    }
    if before_sha == ZERO_SHA {
        return IndexDecision::Full("Force push".to_string());
    }
    if total_changes == 0 {
        return IndexDecision::Full("No changes".to_string());
    }
    if total_changes > threshold {
        return IndexDecision::Full(format!(
            "{total_changes} changed files exceeds threshold {threshold}"
        ));
    }
    IndexDecision::Incremental
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: usize = 100;

    #[test]
    fn unindexed_repo_forces_full() {
        assert_eq!(
            decide_index_kind(false, "abc", 3, THRESHOLD),
            IndexDecision::Full("Not indexed".to_string())
        );
    }

    #[test]
    fn zero_before_sha_forces_full() {
        assert!(matches!(
            decide_index_kind(true, ZERO_SHA, 3, THRESHOLD),
            IndexDecision::Full(_)
        ));
    }

    #[test]
    fn empty_change_set_rebaselines_with_full() {
        assert!(matches!(
            decide_index_kind(true, "abc", 0, THRESHOLD),
            IndexDecision::Full(_)
        ));
    }

    #[test]
    fn above_threshold_forces_full() {
        assert!(matches!(
            decide_index_kind(true, "abc", 250, THRESHOLD),
            IndexDecision::Full(_)
        ));
    }

    #[test]
    fn small_pushes_on_indexed_repos_go_incremental() {
        for total in [1, 50, THRESHOLD] {
            assert_eq!(
                decide_index_kind(true, "abc", total, THRESHOLD),
                IndexDecision::Incremental,
                "total={total}"
            );
        }
    }

    #[test]
    fn incremental_requires_the_repo_to_be_indexed() {
        for total in [1, THRESHOLD] {
            assert!(matches!(
                decide_index_kind(false, "abc", total, THRESHOLD),
                IndexDecision::Full(_)
            ));
        }
    }
}
