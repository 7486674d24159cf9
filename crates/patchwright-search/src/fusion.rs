//! Reciprocal Rank Fusion
//!
//! Pure rank-combination logic, separated from IO so ordering properties are
//! directly testable: `score(d) = Σ 1/(k + rank_s(d))` over the sources `d`
//! appears in, with `k = 60`.

use std::collections::HashMap;

/// The RRF smoothing constant
pub const RRF_K: f32 = 60.0;

/// One entry of a source ranking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub chunk_id: String,
    pub file_path: String,
}

/// Fuse ranked lists into a single ranking
///
/// Each source contributes `1/(k + rank)` per document, with 1-based ranks.
/// Documents are deduplicated by chunk id; ties break by ascending chunk id;
/// the result is capped at `top_k` chunks.
pub fn fuse_rrf(sources: &[Vec<RankedEntry>], top_k: usize) -> Vec<(RankedEntry, f32)> {
    let mut scores: HashMap<&str, f32> = HashMap::new();
    let mut entries: HashMap<&str, &RankedEntry> = HashMap::new();

    for source in sources {
        for (index, entry) in source.iter().enumerate() {
            let rank = (index + 1) as f32;
            *scores.entry(entry.chunk_id.as_str()).or_insert(0.0) += 1.0 / (RRF_K + rank);
            entries.entry(entry.chunk_id.as_str()).or_insert(entry);
        }
    }

    let mut fused: Vec<(&str, f32)> = scores.into_iter().collect();
    fused.sort_by(|(id_a, score_a), (id_b, score_b)| {
        score_b
            .partial_cmp(score_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| id_a.cmp(id_b))
    });
    fused.truncate(top_k);

    fused
        .into_iter()
        .filter_map(|(chunk_id, score)| entries.get(chunk_id).map(|e| ((*e).clone(), score)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(chunk_id: &str, file_path: &str) -> RankedEntry {
        RankedEntry {
            chunk_id: chunk_id.to_string(),
            file_path: file_path.to_string(),
        }
    }

    #[test]
    fn documents_in_both_sources_outrank_single_source_hits() {
        let lexical = vec![entry("shared", "a.ts"), entry("lex_only", "b.ts")];
        let vector = vec![entry("vec_only", "c.ts"), entry("shared", "a.ts")];

        let fused = fuse_rrf(&[lexical, vector], 10);

        assert_eq!(fused[0].0.chunk_id, "shared");
        // 1/(60+1) + 1/(60+2) for shared beats 1/(60+1) for vec_only
        assert!(fused[0].1 > fused[1].1);
    }

    #[test]
    fn fusion_is_stable_across_runs() {
        let lexical = vec![entry("a", "a.ts"), entry("b", "b.ts"), entry("c", "c.ts")];
        let vector = vec![entry("c", "c.ts"), entry("d", "d.ts")];

        let first = fuse_rrf(&[lexical.clone(), vector.clone()], 10);
        let second = fuse_rrf(&[lexical, vector], 10);

        assert_eq!(first, second);
    }

    #[test]
    fn ties_break_by_chunk_id() {
        // Same rank in disjoint sources -> identical scores
        let lexical = vec![entry("zeta", "z.ts")];
        let vector = vec![entry("alpha", "a.ts")];

        let fused = fuse_rrf(&[lexical, vector], 10);

        assert_eq!(fused[0].0.chunk_id, "alpha");
        assert_eq!(fused[1].0.chunk_id, "zeta");
        assert_eq!(fused[0].1, fused[1].1);
    }

    #[test]
    fn caps_at_top_k_chunks() {
        let source: Vec<RankedEntry> = (0..20)
            .map(|i| entry(&format!("chunk_{i:02}"), "a.ts"))
            .collect();

        let fused = fuse_rrf(&[source], 5);
        assert_eq!(fused.len(), 5);
    }

    #[test]
    fn empty_sources_fuse_to_nothing() {
        assert!(fuse_rrf(&[Vec::new(), Vec::new()], 10).is_empty());
    }
}
