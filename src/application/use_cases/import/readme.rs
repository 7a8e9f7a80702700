//! Heuristics for pulling snippet details out of free-form README text.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

const SUMMARY_LIMIT: usize = 400;
const DISCOURAGED_TABLE_WORDS: [&str; 5] = ["select", "choose", "set", "this", "any"];

static FENCED_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]\(([^)]*)\)").unwrap());
static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[#>*_`]").unwrap());
static KEY_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-*\x{2022}\x{2023}\x{25E6}\x{25AA}\x{25CF}\s]*([A-Za-z0-9 _/#()]+?)\s*[:=]\s*(.+)$")
        .unwrap()
});
static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.]+$").unwrap());
static QUOTED_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["'`\[]([A-Za-z0-9_.]+)["'`\]]"#).unwrap());
static FIRST_IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Za-z0-9_.]+)").unwrap());
static TABLE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)table(?:\s+name)?\s*[:=\-]?\s*[`'"]?([A-Za-z0-9_.]+)"#).unwrap()
});
static ON_TABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)on\s+(?:the\s+)?([A-Za-z0-9_]+)\s+table").unwrap());
static SCOPED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)scoped").unwrap());
static APPLICATION_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)application\s+([A-Za-z0-9_]+)").unwrap());

/// First three lines of prose, with code, images and markup removed.
pub fn summarize_readme(markdown: &str) -> String {
    if markdown.is_empty() {
        return String::new();
    }

    let text = markdown.replace('\r', "");
    let text = FENCED_CODE.replace_all(&text, "");
    let text = IMAGE.replace_all(&text, "");
    let text = LINK.replace_all(&text, "$1");
    let text = MARKUP.replace_all(&text, "");

    let summary = text
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(3)
        .collect::<Vec<_>>()
        .join(" ");

    if summary.chars().count() > SUMMARY_LIMIT {
        let head: String = summary.chars().take(SUMMARY_LIMIT - 3).collect();
        format!("{}...", head.trim_end())
    } else {
        summary
    }
}

/// `Key: value` and `Key = value` lines of a README, keyed by lowercase key.
#[derive(Debug, Default, Clone)]
pub struct ReadmeFields {
    values: HashMap<String, String>,
}

impl ReadmeFields {
    /// First present key wins.
    pub fn get(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|key| self.values.get(&key.to_lowercase()))
            .map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(&key.to_lowercase())
    }
}

pub fn parse_key_value_map(markdown: &str) -> ReadmeFields {
    let mut values = HashMap::new();
    for line in markdown.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(captures) = KEY_VALUE.captures(line) {
            let key = captures[1].trim().to_lowercase();
            if !key.is_empty() {
                values.insert(key, captures[2].trim().to_string());
            }
        }
    }
    ReadmeFields { values }
}

pub fn parse_boolean(value: Option<&str>, fallback: bool) -> bool {
    let Some(value) = value else {
        return fallback;
    };
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "active" | "checked" | "on" => true,
        "false" | "no" | "n" | "0" | "inactive" | "unchecked" | "off" => false,
        _ => fallback,
    }
}

/// Reduces a README table description to a table name, or `Unknown` when
/// the text is instructions rather than a name.
pub fn normalize_table_value(value: Option<&str>) -> String {
    const UNKNOWN: &str = "Unknown";

    let trimmed = value.unwrap_or_default().trim();
    if trimmed.is_empty() {
        return UNKNOWN.to_string();
    }

    let first_word = trimmed
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();
    if DISCOURAGED_TABLE_WORDS.contains(&first_word.as_str()) {
        return UNKNOWN.to_string();
    }

    if IDENTIFIER.is_match(trimmed) {
        return trimmed.to_string();
    }
    if let Some(captures) = QUOTED_IDENTIFIER.captures(trimmed) {
        return captures[1].to_string();
    }
    if let Some(candidate) = FIRST_IDENTIFIER.find(trimmed).map(|m| m.as_str()) {
        if !DISCOURAGED_TABLE_WORDS.contains(&candidate.to_lowercase().as_str()) {
            return candidate.to_string();
        }
    }

    if trimmed.chars().count() > 40 {
        UNKNOWN.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn extract_table_from_text(text: &str) -> Option<String> {
    TABLE_LABEL
        .captures(text)
        .or_else(|| ON_TABLE.captures(text))
        .map(|captures| captures[1].to_string())
}

pub fn normalize_client_script_type(value: Option<&str>) -> &'static str {
    match value.map(|v| v.trim().to_lowercase()).as_deref() {
        Some("onload" | "on load") => "onLoad",
        Some("onchange" | "on change") => "onChange",
        Some("onsubmit" | "on submit") => "onSubmit",
        Some("oncelledit" | "on cell edit") => "onCellEdit",
        _ => "Unspecified",
    }
}

pub fn normalize_inbound_type(value: Option<&str>) -> &'static str {
    let Some(value) = value.map(|v| v.trim().to_lowercase()) else {
        return "Unspecified";
    };
    if value.contains("reply") {
        "Reply"
    } else if value.contains("forward") {
        "Forward"
    } else if value.contains("new") {
        "New"
    } else {
        "Unspecified"
    }
}

/// Maps schedule wording onto a frequency label. Cron expressions are kept
/// verbatim.
pub fn infer_frequency(value: Option<&str>) -> Option<String> {
    let value = value?;
    let text = value.to_lowercase();
    let label = if text.contains("daily") {
        "Daily"
    } else if text.contains("weekly") {
        "Weekly"
    } else if text.contains("monthly") {
        "Monthly"
    } else if text.contains("hour") {
        "Hourly"
    } else if text.contains("quarter") {
        "Quarterly"
    } else if text.contains("year") {
        "Yearly"
    } else if text.contains("cron") {
        return Some(value.trim().to_string());
    } else {
        return None;
    };
    Some(label.to_string())
}

pub fn detect_application(fields: &ReadmeFields, readme: &str) -> String {
    if let Some(value) = fields.get(&["application", "scope"]) {
        return value.to_string();
    }
    if SCOPED.is_match(readme) {
        if let Some(captures) = APPLICATION_NAME.captures(readme) {
            return captures[1].to_string();
        }
    }
    "Global".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_strips_markup_and_code() {
        let readme = "# Title\r\n\n```js\nvar x = 1;\n```\n![shot](img.png)\nSee [docs](https://example.com) for **more**.\nThird line\nFourth line";
        assert_eq!(
            summarize_readme(readme),
            "Title See https://example.com for more. Third line"
        );
        assert_eq!(summarize_readme(""), "");
    }

    #[test]
    fn test_summarize_truncates_long_text() {
        let long = "word ".repeat(120);
        let summary = summarize_readme(&long);
        assert_eq!(summary, format!("{}wo...", "word ".repeat(79)));
        assert_eq!(summary.chars().count(), 400);

        let cut_at_space = format!("{} {}", "a".repeat(396), "b".repeat(50));
        assert_eq!(summarize_readme(&cut_at_space), format!("{}...", "a".repeat(396)));

        let exactly_limit = "c".repeat(400);
        assert_eq!(summarize_readme(&exactly_limit), exactly_limit);
    }

    #[test]
    fn test_parse_key_value_map() {
        let fields = parse_key_value_map("- Table: incident\n* Run As = admin\n\u{2022} Active: false\nplain text");
        assert_eq!(fields.get(&["table"]), Some("incident"));
        assert_eq!(fields.get(&["run as user", "Run As"]), Some("admin"));
        assert_eq!(fields.get(&["active"]), Some("false"));
        assert!(fields.contains("TABLE"));
        assert!(!fields.contains("plain text"));
    }

    #[test]
    fn test_parse_boolean() {
        assert!(parse_boolean(Some(" Yes "), false));
        assert!(!parse_boolean(Some("inactive"), true));
        assert!(parse_boolean(Some("maybe"), true));
        assert!(!parse_boolean(None, false));
    }

    #[test]
    fn test_normalize_table_value() {
        assert_eq!(normalize_table_value(None), "Unknown");
        assert_eq!(normalize_table_value(Some("  ")), "Unknown");
        assert_eq!(normalize_table_value(Some("Select the table you need")), "Unknown");
        assert_eq!(normalize_table_value(Some("sys_user")), "sys_user");
        assert_eq!(normalize_table_value(Some("the 'change_request' table")), "change_request");
        assert_eq!(normalize_table_value(Some("Incident [incident]")), "incident");
        assert_eq!(normalize_table_value(Some("any table")), "Unknown");
        assert_eq!(normalize_table_value(Some("Problem table")), "Problem");
    }

    #[test]
    fn test_extract_table_from_text() {
        assert_eq!(extract_table_from_text("Table: `incident`").as_deref(), Some("incident"));
        assert_eq!(extract_table_from_text("Runs on the problem table").as_deref(), Some("problem"));
        assert!(extract_table_from_text("nothing useful").is_none());
    }

    #[test]
    fn test_type_normalizers() {
        assert_eq!(normalize_client_script_type(Some("On Change")), "onChange");
        assert_eq!(normalize_client_script_type(Some("onBlur")), "Unspecified");
        assert_eq!(normalize_client_script_type(None), "Unspecified");
        assert_eq!(normalize_inbound_type(Some("Reply to ticket")), "Reply");
        assert_eq!(normalize_inbound_type(Some("Fwd")), "Unspecified");
        assert_eq!(normalize_inbound_type(Some("new email")), "New");
    }

    #[test]
    fn test_infer_frequency() {
        assert_eq!(infer_frequency(Some("Runs daily at 2am")).as_deref(), Some("Daily"));
        assert_eq!(infer_frequency(Some("every hour")).as_deref(), Some("Hourly"));
        assert_eq!(infer_frequency(Some(" cron 0 * * * * ")).as_deref(), Some("cron 0 * * * *"));
        assert!(infer_frequency(Some("on demand")).is_none());
        assert!(infer_frequency(None).is_none());
    }

    #[test]
    fn test_detect_application() {
        let explicit = parse_key_value_map("Scope: x_acme_app");
        assert_eq!(detect_application(&explicit, ""), "x_acme_app");

        let readme = "This scoped utility ships with application x_acme_tools.";
        assert_eq!(detect_application(&ReadmeFields::default(), readme), "x_acme_tools");
        assert_eq!(detect_application(&ReadmeFields::default(), "application foo"), "Global");
    }
}
