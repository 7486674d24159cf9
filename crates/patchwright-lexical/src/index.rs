//! In-process BM25 inverted index

use crate::tokenize::tokenize;
use patchwright_chunking::Chunk;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const DEFAULT_K1: f32 = 1.2;
const DEFAULT_B: f32 = 0.75;

fn default_k1() -> f32 {
    DEFAULT_K1
}

fn default_b() -> f32 {
    DEFAULT_B
}

/// A ranked BM25 hit
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk_id: String,
    pub file_path: String,
    pub score: f32,
}

/// Classical BM25 inverted index over code chunks
///
/// One index per repository/branch. Updates are atomic per file batch:
/// `update_files` removes every existing chunk of the affected files before
/// inserting the replacements, so queries never observe a half-replaced file.
/// The whole structure serializes for persistence across restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bm25Index {
    #[serde(default = "default_k1")]
    k1: f32,
    #[serde(default = "default_b")]
    b: f32,
    /// term -> chunk id -> term frequency
    postings: HashMap<String, HashMap<String, usize>>,
    /// chunk id -> token count
    doc_lengths: HashMap<String, usize>,
    /// chunk id -> file path (needed to surface hits without a second lookup)
    doc_files: HashMap<String, String>,
    /// file path -> chunk ids, for O(affected) per-file invalidation
    file_chunks: HashMap<String, Vec<String>>,
    /// running sum of all document lengths
    total_tokens: u64,
}

impl Default for Bm25Index {
    fn default() -> Self {
        Self::new()
    }
}

impl Bm25Index {
    /// Create an empty index with standard BM25 parameters
    pub fn new() -> Self {
        Self {
            k1: DEFAULT_K1,
            b: DEFAULT_B,
            postings: HashMap::new(),
            doc_lengths: HashMap::new(),
            doc_files: HashMap::new(),
            file_chunks: HashMap::new(),
            total_tokens: 0,
        }
    }

    /// Number of indexed chunks
    pub fn doc_count(&self) -> usize {
        self.doc_lengths.len()
    }

    /// Whether a file currently has chunks in the index
    pub fn contains_file(&self, file_path: &str) -> bool {
        self.file_chunks.contains_key(file_path)
    }

    /// Chunk ids currently indexed for a file
    pub fn chunk_ids_for_file(&self, file_path: &str) -> Vec<String> {
        self.file_chunks.get(file_path).cloned().unwrap_or_default()
    }

    /// All chunk ids in the index
    pub fn all_chunk_ids(&self) -> Vec<String> {
        self.doc_lengths.keys().cloned().collect()
    }

    /// Replace the entire index contents with the given chunks
    pub fn build(&mut self, chunks: &[Chunk]) {
        self.postings.clear();
        self.doc_lengths.clear();
        self.doc_files.clear();
        self.file_chunks.clear();
        self.total_tokens = 0;

        for chunk in chunks {
            self.insert_chunk(chunk);
        }
    }

    /// Remove every chunk belonging to a file
    ///
    /// No-op when the file isn't indexed.
    pub fn remove_file(&mut self, file_path: &str) {
        let Some(chunk_ids) = self.file_chunks.remove(file_path) else {
            return;
        };

        for chunk_id in &chunk_ids {
            self.remove_doc(chunk_id);
        }
    }

    /// Replace the chunks of every file present in `new_chunks`
    ///
    /// Existing chunks for the affected files are removed first, then the new
    /// chunks inserted, as one observable step per file batch.
    pub fn update_files(&mut self, new_chunks: &[Chunk]) {
        let mut affected: Vec<&str> = new_chunks.iter().map(|c| c.file_path.as_str()).collect();
        affected.sort_unstable();
        affected.dedup();

        for file_path in affected {
            self.remove_file(file_path);
        }

        for chunk in new_chunks {
            self.insert_chunk(chunk);
        }
    }

    /// Rank chunks against a query
    ///
    /// Returns at most `top_k` hits ordered by descending score, ties broken
    /// by ascending chunk id. An all-stop-word query yields an empty ranking.
    pub fn query(&self, text: &str, top_k: usize) -> Vec<ScoredChunk> {
        let terms = tokenize(text);
        if terms.is_empty() || self.doc_lengths.is_empty() {
            return Vec::new();
        }

        let doc_count = self.doc_lengths.len() as f32;
        let avg_doc_len = self.total_tokens as f32 / doc_count;
        let mut scores: HashMap<&str, f32> = HashMap::new();

        for term in &terms {
            let Some(posting) = self.postings.get(term) else {
                continue;
            };

            let df = posting.len() as f32;
            let idf = ((doc_count - df + 0.5) / (df + 0.5) + 1.0).ln();

            for (chunk_id, &tf) in posting {
                let doc_len = self.doc_lengths.get(chunk_id).copied().unwrap_or(0) as f32;
                let tf = tf as f32;
                let norm = self.k1 * (1.0 - self.b + self.b * doc_len / avg_doc_len);
                let contribution = idf * tf * (self.k1 + 1.0) / (tf + norm);
                *scores.entry(chunk_id.as_str()).or_insert(0.0) += contribution;
            }
        }

        let mut ranked: Vec<(&str, f32)> = scores.into_iter().collect();
        ranked.sort_by(|(id_a, score_a), (id_b, score_b)| {
            score_b
                .partial_cmp(score_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| id_a.cmp(id_b))
        });
        ranked.truncate(top_k);

        ranked
            .into_iter()
            .map(|(chunk_id, score)| ScoredChunk {
                chunk_id: chunk_id.to_string(),
                file_path: self.doc_files.get(chunk_id).cloned().unwrap_or_default(),
                score,
            })
            .collect()
    }

    fn insert_chunk(&mut self, chunk: &Chunk) {
        let tokens = tokenize(&chunk.content);

        self.doc_lengths.insert(chunk.id.clone(), tokens.len());
        self.doc_files
            .insert(chunk.id.clone(), chunk.file_path.clone());
        self.file_chunks
            .entry(chunk.file_path.clone())
            .or_default()
            .push(chunk.id.clone());
        self.total_tokens += tokens.len() as u64;

        for token in tokens {
            *self
                .postings
                .entry(token)
                .or_default()
                .entry(chunk.id.clone())
                .or_insert(0) += 1;
        }
    }

    fn remove_doc(&mut self, chunk_id: &str) {
        if let Some(len) = self.doc_lengths.remove(chunk_id) {
            self.total_tokens = self.total_tokens.saturating_sub(len as u64);
        }
        self.doc_files.remove(chunk_id);

        self.postings.retain(|_, posting| {
            posting.remove(chunk_id);
            !posting.is_empty()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchwright_chunking::ChunkKind;

    fn chunk(id: &str, file_path: &str, content: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            repo_id: "repo-1".to_string(),
            file_path: file_path.to_string(),
            file_name: file_path.rsplit('/').next().unwrap_or(file_path).to_string(),
            file_type: "ts".to_string(),
            function_name: None,
            line_start: 1,
            line_end: 10,
            content: content.to_string(),
            kind: ChunkKind::Function,
        }
    }

    fn sample_index() -> Bm25Index {
        let mut index = Bm25Index::new();
        index.build(&[
            chunk("a.ts_fn_getUser", "a.ts", "function getUser(id) { return users.find(id); }"),
            chunk("a.ts_fn_deleteUser", "a.ts", "function deleteUser(id) { users.remove(id); }"),
            chunk("b.ts_class_Pool", "b.ts", "class ConnectionPool { acquire() { } release() { } }"),
        ]);
        index
    }

    #[test]
    fn ranks_matching_chunks_first() {
        let index = sample_index();
        let hits = index.query("getUser users", 10);

        assert!(!hits.is_empty());
        assert_eq!(hits[0].chunk_id, "a.ts_fn_getUser");
        assert_eq!(hits[0].file_path, "a.ts");
    }

    #[test]
    fn all_stop_word_query_is_empty_not_an_error() {
        let index = sample_index();
        assert!(index.query("the and with this", 10).is_empty());
    }

    #[test]
    fn remove_file_drops_all_its_chunks() {
        let mut index = sample_index();
        index.remove_file("a.ts");

        assert_eq!(index.doc_count(), 1);
        assert!(!index.contains_file("a.ts"));
        assert!(index.query("getUser", 10).is_empty());
        assert!(!index.query("ConnectionPool", 10).is_empty());
    }

    #[test]
    fn update_files_replaces_in_place() {
        let mut index = sample_index();
        index.update_files(&[chunk(
            "a.ts_fn_findUser",
            "a.ts",
            "function findUser(name) { return users.byName(name); }",
        )]);

        assert_eq!(index.chunk_ids_for_file("a.ts"), vec!["a.ts_fn_findUser"]);
        assert!(index.query("deleteUser", 10).is_empty());
        assert!(!index.query("findUser", 10).is_empty());
        // Untouched files stay intact
        assert_eq!(index.chunk_ids_for_file("b.ts"), vec!["b.ts_class_Pool"]);
    }

    #[test]
    fn remove_then_update_equals_plain_update() {
        let replacement = chunk("a.ts_fn_x", "a.ts", "function x() { return 1; }");

        let mut direct = sample_index();
        direct.update_files(std::slice::from_ref(&replacement));

        let mut removed_first = sample_index();
        removed_first.remove_file("a.ts");
        removed_first.update_files(std::slice::from_ref(&replacement));

        let mut direct_ids = direct.all_chunk_ids();
        let mut removed_ids = removed_first.all_chunk_ids();
        direct_ids.sort();
        removed_ids.sort();
        assert_eq!(direct_ids, removed_ids);

        let direct_hits = direct.query("function", 10);
        let removed_hits = removed_first.query("function", 10);
        assert_eq!(direct_hits, removed_hits);
    }

    #[test]
    fn ties_break_by_chunk_id() {
        let mut index = Bm25Index::new();
        index.build(&[
            chunk("z.ts_fn_same", "z.ts", "identical content here"),
            chunk("a.ts_fn_same", "a.ts", "identical content here"),
        ]);

        let hits = index.query("identical content", 10);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk_id, "a.ts_fn_same");
        assert_eq!(hits[1].chunk_id, "z.ts_fn_same");
    }

    #[test]
    fn survives_serialization_round_trip() {
        let index = sample_index();
        let serialized = serde_json::to_string(&index).unwrap();
        let restored: Bm25Index = serde_json::from_str(&serialized).unwrap();

        assert_eq!(index.doc_count(), restored.doc_count());
        assert_eq!(
            index.query("getUser", 10),
            restored.query("getUser", 10)
        );
    }
}
