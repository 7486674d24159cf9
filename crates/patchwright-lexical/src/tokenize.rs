//! BM25 tokenization

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Minimum token length kept by the tokenizer
const MIN_TOKEN_LEN: usize = 3;

/// Small English stop-word set
///
/// Only words of three or more characters appear here; shorter ones are
/// already dropped by the length filter.
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "has", "have",
        "was", "were", "will", "with", "this", "that", "then", "than", "from", "into", "its",
        "they", "them", "their", "when", "where", "which", "while", "would", "should", "could",
    ]
    .into_iter()
    .collect()
});

/// Tokenize text for indexing and querying
///
/// Lowercases, splits on runs of non-word characters, and drops short tokens
/// and stop words. Identical rules apply to documents and queries so term
/// matching is symmetric.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.len() >= MIN_TOKEN_LEN && !STOP_WORDS.contains(token))
        .map(std::string::ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_splits_on_non_word_runs() {
        let tokens = tokenize("parseConfig(raw: ConfigInput) -> Result");
        assert_eq!(tokens, vec!["parseconfig", "raw", "configinput", "result"]);
    }

    #[test]
    fn drops_short_tokens() {
        let tokens = tokenize("a an to fn ok yes");
        assert_eq!(tokens, vec!["yes"]);
    }

    #[test]
    fn drops_stop_words() {
        let tokens = tokenize("the function that would return them");
        assert_eq!(tokens, vec!["function", "return"]);
    }

    #[test]
    fn all_stop_word_input_yields_nothing() {
        assert!(tokenize("the and for with this").is_empty());
    }

    #[test]
    fn underscores_are_word_characters() {
        let tokens = tokenize("get_user_by_id");
        assert_eq!(tokens, vec!["get_user_by_id"]);
    }
}
