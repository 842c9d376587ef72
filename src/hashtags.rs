use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static HASHTAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\w+").expect("hashtag pattern"));

/// Extract `#tag` tokens from post content.
///
/// Tags come back in the order they first appear, each one once, with the
/// leading `#` kept:
/// "hello #world #foo bar" -> ["#world", "#foo"]
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    HASHTAG
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|tag| seen.insert(*tag))
        .map(str::to_string)
        .collect()
}
