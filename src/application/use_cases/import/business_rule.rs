use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

const KNOWN_TIMINGS: [&str; 4] = ["before", "after", "async", "display"];

static LEADING_COMMENTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?://.*\n|(?s:/\*.*?\*/)\s*)+").unwrap());
static WHEN_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)when(?:\s+to\s+run)?\s*[:=\-]?\s*[`'"]?([A-Za-z ]+)"#).unwrap()
});
static ON_QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)on [`'"]([A-Za-z0-9_.]+)"#).unwrap());
static TABLE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\btable(?:\s+name)?\b\s*[:=\-]?\s*[`'"]?([A-Za-z0-9_.]+)"#).unwrap()
});
static TIMING_WORDS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    ["before", "after", "display", "async"]
        .into_iter()
        .map(|word| (word, Regex::new(&format!(r"(?i)\b{word}\b")).unwrap()))
        .collect()
});

/// Line and block comments at the very top of a script.
pub fn leading_comment_block(script: &str) -> &str {
    LEADING_COMMENTS
        .find(script)
        .map(|m| m.as_str())
        .unwrap_or_default()
}

/// Looks for the rule timing in the script header, then the README. A
/// labelled `when to run:` value takes priority over a bare keyword.
pub fn extract_when(script: &str, readme: &str) -> Option<&'static str> {
    let areas = [leading_comment_block(script), readme];

    for area in areas.iter().filter(|a| !a.is_empty()) {
        if let Some(captures) = WHEN_LABEL.captures(area) {
            let candidate = captures[1].trim().to_lowercase();
            let first = candidate.split_whitespace().next().unwrap_or_default();
            if let Some(timing) = KNOWN_TIMINGS.iter().find(|t| **t == first) {
                return Some(*timing);
            }
        }
    }

    for area in areas.iter().filter(|a| !a.is_empty()) {
        for (word, pattern) in TIMING_WORDS.iter() {
            if pattern.is_match(area) {
                return Some(*word);
            }
        }
    }

    None
}

pub fn extract_table(script: &str, readme: &str) -> Option<String> {
    let areas = [leading_comment_block(script), readme];

    for area in areas.iter().filter(|a| !a.is_empty()) {
        let sanitized = area.replace("**", "");
        if let Some(captures) = ON_QUOTED.captures(&sanitized) {
            return Some(captures[1].to_string());
        }
        if let Some(captures) = TABLE_LABEL.captures(&sanitized) {
            return Some(captures[1].to_string());
        }
    }

    None
}

pub fn build_metadata(script: &str, readme: &str) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("application".into(), Value::from("Global"));
    metadata.insert("active".into(), Value::Bool(true));
    if let Some(when) = extract_when(script, readme) {
        metadata.insert("when".into(), Value::from(when));
    }
    if let Some(table) = extract_table(script, readme) {
        metadata.insert("table".into(), Value::from(table));
    }
    metadata
}
