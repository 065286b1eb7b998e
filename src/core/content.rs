//! Plain string-list utilities used when editing fragment pools.

use rustc_hash::FxHashSet;

/// Trim every entry and drop the ones left empty.
pub fn format_list<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lexicographic (byte-wise) sort.
pub fn sort_list<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    let mut sorted: Vec<String> = items.iter().map(|s| s.as_ref().to_string()).collect();
    sorted.sort();
    sorted
}

/// Trim, drop empties and remove duplicates, keeping the first occurrence
/// of each entry in its original position.
pub fn dedupe_list<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    let mut seen = FxHashSet::default();
    format_list(items)
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Split free text into fragments: one per line, with commas also acting
/// as separators, then [`format_list`].
pub fn parse_list(text: &str) -> Vec<String> {
    let pieces: Vec<&str> = text.split(['\n', ',']).collect();
    format_list(&pieces)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_trims_and_filters() {
        assert_eq!(
            format_list(&["  a ", "", "\t", "b"]),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn sort_is_lexicographic() {
        assert_eq!(sort_list(&["b", "B", "a", "ab"]), vec!["B", "a", "ab", "b"]);
    }

    #[test]
    fn dedupe_after_trim() {
        let deduped = dedupe_list(&["a", "b", "a", " a "]);
        assert_eq!(deduped, vec!["a", "b"]);
    }

    #[test]
    fn dedupe_keeps_first_position() {
        assert_eq!(dedupe_list(&["c", "a", "c", "b", "a"]), vec!["c", "a", "b"]);
    }

    #[test]
    fn parse_splits_lines_and_commas() {
        let text = "red hair, blue eyes\n\n  smile \r\nhat,";
        assert_eq!(parse_list(text), vec!["red hair", "blue eyes", "smile", "hat"]);
    }
}
