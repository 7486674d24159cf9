//! Branch naming for generated changes

/// Maximum task keywords carried into the slug
const SLUG_WORDS: usize = 4;

/// Lowercase keyword slug of a task description
///
/// Keeps the first few alphanumeric words joined with dashes; empty input
/// slugs to "task".
pub fn slug_of(task: &str) -> String {
    let words: Vec<String> = task
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .take(SLUG_WORDS)
        .collect();

    if words.is_empty() {
        "task".to_string()
    } else {
        words.join("-")
    }
}

/// Encode a number in base36
fn base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Branch name for a task: `feat/{slug}-{base36 millis}`
pub fn branch_name_for_task(task: &str, timestamp_millis: u64) -> String {
    format!("feat/{}-{}", slug_of(task), base36(timestamp_millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_keeps_leading_keywords() {
        assert_eq!(
            slug_of("Rename identifier `foo` to `bar` in src/util.ts"),
            "rename-identifier-foo-to"
        );
    }

    #[test]
    fn slug_of_empty_task_is_stable() {
        assert_eq!(slug_of(""), "task");
        assert_eq!(slug_of("!!! ???"), "task");
    }

    #[test]
    fn base36_encodes_known_values() {
        assert_eq!(base36(0), "0");
        assert_eq!(base36(35), "z");
        assert_eq!(base36(36), "10");
        assert_eq!(base36(1_700_000_000_000), "loyw3v28");
    }

    #[test]
    fn branch_names_are_prefixed_and_timestamped() {
        let name = branch_name_for_task("Add retry logic", 1_700_000_000_000);
        assert_eq!(name, "feat/add-retry-logic-loyw3v28");
    }

    #[test]
    fn distinct_timestamps_give_distinct_branches() {
        let a = branch_name_for_task("fix", 1000);
        let b = branch_name_for_task("fix", 1001);
        assert_ne!(a, b);
    }
}
