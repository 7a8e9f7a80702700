//! Metadata builders for each imported snippet category.

use super::files::WidgetFiles;
use super::readme::{
    detect_application, extract_table_from_text, infer_frequency, normalize_client_script_type,
    normalize_inbound_type, normalize_table_value, parse_boolean, parse_key_value_map,
    summarize_readme,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static CLIENT_CALLABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)client callable").unwrap());
static GLIDE_AJAX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)GlideAjax").unwrap());
static POST_CLONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)post[- ]clone").unwrap());
static BACKGROUND_SCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)background script").unwrap());
static FIX_SCRIPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)fix script").unwrap());

/// What a builder gets to look at for one snippet folder.
#[derive(Debug, Clone, Copy)]
pub struct SnippetSource<'a> {
    pub readme: &'a str,
    pub script: &'a str,
}

pub type MetadataBuilder = fn(SnippetSource<'_>) -> Map<String, Value>;

pub fn client_script(source: SnippetSource<'_>) -> Map<String, Value> {
    let fields = parse_key_value_map(source.readme);
    let table = fields
        .get(&["table"])
        .map(str::to_string)
        .or_else(|| extract_table_from_text(source.readme));

    let mut metadata = Map::new();
    metadata.insert("application".into(), detect_application(&fields, source.readme).into());
    metadata.insert("table".into(), normalize_table_value(table.as_deref()).into());
    metadata.insert(
        "type".into(),
        normalize_client_script_type(fields.get(&["type", "script type"])).into(),
    );
    metadata.insert("active".into(), parse_boolean(fields.get(&["active"]), true).into());
    if let Some(field) = fields.get(&["field", "target field", "field name"]) {
        metadata.insert("field".into(), field.into());
    }
    metadata
}

pub fn ui_action(source: SnippetSource<'_>) -> Map<String, Value> {
    let fields = parse_key_value_map(source.readme);
    let table = fields
        .get(&["table"])
        .map(str::to_string)
        .or_else(|| extract_table_from_text(source.readme));

    let mut client = parse_boolean(fields.get(&["client"]), false);
    if !fields.contains("client") && CLIENT_CALLABLE.is_match(source.readme) {
        client = true;
    }

    let mut metadata = Map::new();
    metadata.insert("application".into(), detect_application(&fields, source.readme).into());
    metadata.insert("table".into(), normalize_table_value(table.as_deref()).into());
    metadata.insert("showInsert".into(), parse_boolean(fields.get(&["show insert"]), true).into());
    metadata.insert("showUpdate".into(), parse_boolean(fields.get(&["show update"]), true).into());
    metadata.insert("client".into(), client.into());
    metadata.insert(
        "formLink".into(),
        parse_boolean(fields.get(&["form link", "display as form link"]), false).into(),
    );
    if let Some(on_click) = fields.get(&["onclick", "on click"]) {
        metadata.insert("onClick".into(), on_click.into());
    }
    metadata.insert(
        "condition".into(),
        fields.get(&["condition"]).unwrap_or_default().into(),
    );
    metadata
}

pub fn script_include(source: SnippetSource<'_>) -> Map<String, Value> {
    let fields = parse_key_value_map(source.readme);

    let accessible_from = match fields.get(&["accessible from", "scope"]) {
        Some(value) if value.to_lowercase().contains("this application") => {
            "This application scope only"
        }
        _ => "All application scopes",
    };

    let mut client_callable = parse_boolean(fields.get(&["client callable"]), false);
    if !fields.contains("client callable") && CLIENT_CALLABLE.is_match(source.readme) {
        client_callable = true;
    }
    if !client_callable && GLIDE_AJAX.is_match(source.script) {
        client_callable = true;
    }

    let mut metadata = Map::new();
    metadata.insert("application".into(), detect_application(&fields, source.readme).into());
    metadata.insert("accessibleFrom".into(), accessible_from.into());
    metadata.insert("clientCallable".into(), client_callable.into());
    metadata
}

pub fn scheduled_job(source: SnippetSource<'_>) -> Map<String, Value> {
    let fields = parse_key_value_map(source.readme);
    let frequency_hint = fields
        .get(&["frequency", "run frequency", "schedule", "when"])
        .map(str::to_string)
        .or_else(|| infer_frequency(Some(source.readme)));

    let mut metadata = Map::new();
    metadata.insert("application".into(), detect_application(&fields, source.readme).into());
    metadata.insert("active".into(), parse_boolean(fields.get(&["active"]), true).into());
    if let Some(frequency) = infer_frequency(frequency_hint.as_deref()) {
        metadata.insert("runFrequency".into(), frequency.into());
    }
    if let Some(run_as) = fields
        .get(&["run as", "run as user", "execute as"])
        .filter(|v| !v.is_empty())
    {
        metadata.insert("runAs".into(), run_as.into());
    }
    if let Some(condition) = fields
        .get(&["condition", "filter", "encoded query", "query"])
        .filter(|v| !v.is_empty())
    {
        metadata.insert("condition".into(), condition.into());
    }
    metadata
}

pub fn inbound_action(source: SnippetSource<'_>) -> Map<String, Value> {
    let fields = parse_key_value_map(source.readme);
    let table = fields
        .get(&["table", "target table"])
        .map(str::to_string)
        .or_else(|| extract_table_from_text(source.readme));

    let mut metadata = Map::new();
    metadata.insert("application".into(), detect_application(&fields, source.readme).into());
    metadata.insert("targetTable".into(), normalize_table_value(table.as_deref()).into());
    metadata.insert(
        "type".into(),
        normalize_inbound_type(fields.get(&["type", "action type"])).into(),
    );
    metadata.insert(
        "stopProcessing".into(),
        parse_boolean(fields.get(&["stop processing"]), false).into(),
    );
    metadata.insert("active".into(), parse_boolean(fields.get(&["active"]), true).into());
    metadata.insert(
        "condition".into(),
        fields.get(&["condition", "criteria"]).unwrap_or_default().into(),
    );
    metadata
}

pub fn fix_script(source: SnippetSource<'_>) -> Map<String, Value> {
    let fields = parse_key_value_map(source.readme);
    let run_context = fields
        .get(&["run context", "usage", "context"])
        .map(str::to_string)
        .or_else(|| {
            let context = if POST_CLONE.is_match(source.readme) {
                "Post-clone"
            } else if BACKGROUND_SCRIPT.is_match(source.readme) {
                "Background script"
            } else if FIX_SCRIPT.is_match(source.readme) {
                "Fix script"
            } else {
                return None;
            };
            Some(context.to_string())
        });
    let notes: String = summarize_readme(source.readme).chars().take(400).collect();

    let mut metadata = Map::new();
    metadata.insert("application".into(), detect_application(&fields, source.readme).into());
    if let Some(run_context) = run_context {
        metadata.insert("runContext".into(), run_context.into());
    }
    if !notes.is_empty() {
        metadata.insert("notes".into(), notes.into());
    }
    metadata
}

pub fn mail_script(source: SnippetSource<'_>) -> Map<String, Value> {
    let fields = parse_key_value_map(source.readme);
    let table = fields
        .get(&["table"])
        .map(str::to_string)
        .or_else(|| extract_table_from_text(source.readme))
        .or_else(|| extract_table_from_text(source.script));

    let mut metadata = Map::new();
    metadata.insert("application".into(), detect_application(&fields, source.readme).into());
    metadata.insert("table".into(), normalize_table_value(table.as_deref()).into());
    metadata.insert("active".into(), parse_boolean(fields.get(&["active"]), true).into());
    metadata
}

/// Widget folders carry their parts as separate files; each one found is
/// copied into the matching metadata field.
pub fn widget(readme: &str, folder_name: &str, files: &WidgetFiles) -> Map<String, Value> {
    let fields = parse_key_value_map(readme);
    let name = folder_name.replace("%20", " ").trim().to_string();

    let mut metadata = Map::new();
    metadata.insert("application".into(), detect_application(&fields, readme).into());
    metadata.insert("id".into(), widget_id(&name).into());
    metadata.insert("name".into(), name.into());
    metadata.insert("active".into(), parse_boolean(fields.get(&["active"]), true).into());
    for (key, file) in [
        ("html_template", &files.html),
        ("css", &files.css),
        ("client_script", &files.client),
        ("server_script", &files.server),
    ] {
        if let Some(file) = file {
            metadata.insert(key.into(), file.content.clone().into());
        }
    }
    metadata
}

/// Lowercase slug: whitespace runs become `-`, anything else outside
/// `[a-z0-9-]` is dropped.
pub fn widget_id(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::files::SourceFile;
    use super::*;

    fn source<'a>(readme: &'a str, script: &'a str) -> SnippetSource<'a> {
        SnippetSource { readme, script }
    }

    #[test]
    fn test_client_script_metadata() {
        let readme = "- Table: incident\n- Type: on change\n- Field: priority\n- Active: no";
        let metadata = client_script(source(readme, ""));
        assert_eq!(metadata["application"], "Global");
        assert_eq!(metadata["table"], "incident");
        assert_eq!(metadata["type"], "onChange");
        assert_eq!(metadata["field"], "priority");
        assert_eq!(metadata["active"], false);

        let bare = client_script(source("", ""));
        assert_eq!(bare["table"], "Unknown");
        assert_eq!(bare["type"], "Unspecified");
        assert!(bare.get("field").is_none());
    }

    #[test]
    fn test_ui_action_metadata() {
        let readme = "- Table: problem\nThe action is client callable.\nOnclick: runIt()";
        let metadata = ui_action(source(readme, ""));
        assert_eq!(metadata["table"], "problem");
        assert_eq!(metadata["client"], true);
        assert_eq!(metadata["showInsert"], true);
        assert_eq!(metadata["formLink"], false);
        assert_eq!(metadata["onClick"], "runIt()");
        assert_eq!(metadata["condition"], "");
    }

    #[test]
    fn test_script_include_detects_glide_ajax() {
        let metadata = script_include(source("Accessible from: This application scope only", "var ga = new GlideAjax('X');"));
        assert_eq!(metadata["accessibleFrom"], "This application scope only");
        assert_eq!(metadata["clientCallable"], true);

        let plain = script_include(source("", "var x = 1;"));
        assert_eq!(plain["accessibleFrom"], "All application scopes");
        assert_eq!(plain["clientCallable"], false);
    }

    #[test]
    fn test_scheduled_job_metadata() {
        let metadata = scheduled_job(source("Schedule: every Monday, weekly\nRun as: admin", ""));
        assert_eq!(metadata["runFrequency"], "Weekly");
        assert_eq!(metadata["runAs"], "admin");
        assert!(metadata.get("condition").is_none());

        let inferred = scheduled_job(source("This job runs daily.", ""));
        assert_eq!(inferred["runFrequency"], "Daily");
    }

    #[test]
    fn test_inbound_action_metadata() {
        let metadata = inbound_action(source("Target table: sc_req_item\nAction type: Reply\nStop processing: yes", ""));
        assert_eq!(metadata["targetTable"], "sc_req_item");
        assert_eq!(metadata["type"], "Reply");
        assert_eq!(metadata["stopProcessing"], true);
        assert_eq!(metadata["active"], true);
    }

    #[test]
    fn test_fix_script_metadata() {
        let metadata = fix_script(source("Run this post-clone to reset credentials.", ""));
        assert_eq!(metadata["runContext"], "Post-clone");
        assert_eq!(metadata["notes"], "Run this post-clone to reset credentials.");
        assert!(fix_script(source("", "")).get("notes").is_none());
    }

    #[test]
    fn test_mail_script_falls_back_to_script() {
        let metadata = mail_script(source("", "var gr = new GlideRecord('x'); // table: sys_user"));
        assert_eq!(metadata["table"], "sys_user");
    }

    #[test]
    fn test_widget_metadata() {
        let files = WidgetFiles {
            html: Some(SourceFile {
                name: "template.html".into(),
                content: "<div></div>".into(),
            }),
            server: Some(SourceFile {
                name: "server.js".into(),
                content: "data.x = 1;".into(),
            }),
            ..Default::default()
        };
        let metadata = widget("", "My%20Cool Widget!", &files);
        assert_eq!(metadata["name"], "My Cool Widget!");
        assert_eq!(metadata["id"], "my-cool-widget");
        assert_eq!(metadata["html_template"], "<div></div>");
        assert_eq!(metadata["server_script"], "data.x = 1;");
        assert!(metadata.get("css").is_none());
    }
}
