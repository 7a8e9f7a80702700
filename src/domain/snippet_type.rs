use crate::domain::error::{AppError, Result};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{Map, Number, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Textarea,
    Select,
    Number,
    Checkbox,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    pub id: &'static str,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<&'static [&'static str]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<bool>,
}

impl FieldDef {
    fn new(id: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            id,
            label,
            kind,
            required: false,
            placeholder: None,
            options: None,
            default_value: None,
        }
    }

    fn text(id: &'static str, label: &'static str) -> Self {
        Self::new(id, label, FieldKind::Text)
    }

    fn textarea(id: &'static str, label: &'static str) -> Self {
        Self::new(id, label, FieldKind::Textarea)
    }

    fn number(id: &'static str, label: &'static str) -> Self {
        Self::new(id, label, FieldKind::Number)
    }

    fn select(id: &'static str, label: &'static str, options: &'static [&'static str]) -> Self {
        Self {
            options: Some(options),
            ..Self::new(id, label, FieldKind::Select)
        }
    }

    fn checkbox(id: &'static str, label: &'static str, default_value: bool) -> Self {
        Self {
            default_value: Some(default_value),
            ..Self::new(id, label, FieldKind::Checkbox)
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SnippetType {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub fields: Vec<FieldDef>,
}

impl SnippetType {
    pub fn field(&self, id: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.id == id)
    }
}

fn application() -> FieldDef {
    FieldDef::text("application", "Application")
        .required()
        .placeholder("Global")
}

fn table() -> FieldDef {
    FieldDef::text("table", "Table")
        .required()
        .placeholder("incident")
}

static CATALOG: Lazy<Vec<SnippetType>> = Lazy::new(|| {
    vec![
        SnippetType {
            id: "business_rule",
            label: "Business Rule",
            description: "Server-side logic triggered by database operations.",
            fields: vec![
                application(),
                table(),
                FieldDef::select(
                    "when",
                    "When to run",
                    &["before", "after", "async", "display"],
                )
                .required(),
                FieldDef::number("order", "Order").placeholder("100"),
                FieldDef::checkbox("active", "Active", true),
                FieldDef::textarea("filterCondition", "Filter condition")
                    .placeholder("current.active == true"),
                FieldDef::textarea("condition", "Condition").placeholder("current.state == 6"),
            ],
        },
        SnippetType {
            id: "client_script",
            label: "Client Script",
            description: "Browser-executed logic reacting to UI interactions.",
            fields: vec![
                application(),
                table(),
                FieldDef::select(
                    "type",
                    "Type",
                    &["onLoad", "onChange", "onSubmit", "onCellEdit"],
                )
                .required(),
                FieldDef::text("field", "Target field (if applicable)")
                    .placeholder("assignment_group"),
                FieldDef::checkbox("active", "Active", true),
            ],
        },
        SnippetType {
            id: "script_include",
            label: "Script Include",
            description: "Reusable server-side class or function library.",
            fields: vec![
                application(),
                FieldDef::select(
                    "accessibleFrom",
                    "Accessible from",
                    &["This application scope only", "All application scopes"],
                )
                .required(),
                FieldDef::checkbox("clientCallable", "Client callable", false),
            ],
        },
        SnippetType {
            id: "ui_policy",
            label: "UI Policy",
            description: "Rules that dynamically adjust form behavior.",
            fields: vec![
                FieldDef::text("application", "Application").required(),
                FieldDef::text("table", "Table").required(),
                FieldDef::text("shortDescription", "Short description")
                    .placeholder("Highlight P1 incidents"),
                FieldDef::textarea("conditions", "Conditions").placeholder("priority == 1"),
            ],
        },
        SnippetType {
            id: "ui_action",
            label: "UI Action",
            description: "Form or list buttons that trigger contextual automation.",
            fields: vec![
                application(),
                table(),
                FieldDef::checkbox("showInsert", "Show insert", true),
                FieldDef::checkbox("showUpdate", "Show update", true),
                FieldDef::checkbox("client", "Client-side", false),
                FieldDef::checkbox("formLink", "Display as form link", false),
                FieldDef::text("onClick", "Onclick").placeholder("runClientCode()"),
                FieldDef::textarea("condition", "Condition").placeholder("current.active == true"),
            ],
        },
        SnippetType {
            id: "scheduled_job",
            label: "Scheduled Job",
            description: "Server-side script executed on a recurring schedule.",
            fields: vec![
                application(),
                FieldDef::select(
                    "runFrequency",
                    "Run frequency",
                    &["Daily", "Weekly", "Monthly", "Hourly", "Quarterly", "Yearly"],
                ),
                FieldDef::text("runAs", "Run as").placeholder("System Administrator"),
                FieldDef::checkbox("active", "Active", true),
                FieldDef::textarea("condition", "Condition"),
            ],
        },
        SnippetType {
            id: "inbound_action",
            label: "Inbound Action",
            description: "Email processing logic for incoming messages.",
            fields: vec![
                application(),
                FieldDef::text("targetTable", "Target table")
                    .required()
                    .placeholder("incident"),
                FieldDef::select("type", "Action type", &["New", "Reply", "Forward", "Unspecified"])
                    .required(),
                FieldDef::checkbox("stopProcessing", "Stop processing", false),
                FieldDef::checkbox("active", "Active", true),
                FieldDef::textarea("condition", "Condition"),
            ],
        },
        SnippetType {
            id: "fix_script",
            label: "Fix Script",
            description: "One-off server-side scripts for data repair and upgrades.",
            fields: vec![
                application(),
                FieldDef::text("runContext", "Run context").placeholder("Background script"),
                FieldDef::textarea("notes", "Notes"),
            ],
        },
        SnippetType {
            id: "service_portal_widget",
            label: "Service Portal Widget",
            description: "Reusable portal component with template, styles and controllers.",
            fields: vec![
                application(),
                FieldDef::text("name", "Widget name").required(),
                FieldDef::text("id", "Widget id").required(),
                FieldDef::checkbox("active", "Active", true),
                FieldDef::textarea("html_template", "HTML template"),
                FieldDef::textarea("css", "CSS / SCSS"),
                FieldDef::textarea("client_script", "Client controller"),
                FieldDef::textarea("server_script", "Server script"),
            ],
        },
        SnippetType {
            id: "mail_script",
            label: "Mail Script",
            description: "Email notification scripts that render dynamic content.",
            fields: vec![
                application(),
                table(),
                FieldDef::checkbox("active", "Active", true),
            ],
        },
    ]
});

pub fn all() -> &'static [SnippetType] {
    &CATALOG
}

pub fn find(id: &str) -> Option<&'static SnippetType> {
    CATALOG.iter().find(|snippet_type| snippet_type.id == id)
}

/// Applies the same clean-up the editor form does before submitting:
/// trimmed strings, blank optional values dropped, numeric strings
/// converted and missing checkboxes filled with their default.
pub fn normalize_metadata(snippet_type: &SnippetType, metadata: Map<String, Value>) -> Map<String, Value> {
    let mut normalized = metadata;

    for field in &snippet_type.fields {
        let current = normalized.remove(field.id);
        let next = match (field.kind, current) {
            (FieldKind::Checkbox, None | Some(Value::Null)) => {
                Some(Value::Bool(field.default_value.unwrap_or(false)))
            }
            (_, None | Some(Value::Null)) => None,
            (FieldKind::Number, Some(Value::String(raw))) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(parse_number(trimmed).unwrap_or_else(|| Value::String(trimmed.to_string())))
                }
            }
            (_, Some(Value::String(raw))) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() && !field.required {
                    None
                } else {
                    Some(Value::String(trimmed.to_string()))
                }
            }
            (_, Some(other)) => Some(other),
        };

        if let Some(value) = next {
            normalized.insert(field.id.to_string(), value);
        }
    }

    normalized
}

pub fn validate_metadata(snippet_type: &SnippetType, metadata: &Map<String, Value>) -> Result<()> {
    for field in &snippet_type.fields {
        let value = match metadata.get(field.id) {
            None | Some(Value::Null) => {
                if field.required {
                    return Err(AppError::ValidationError(format!(
                        "{} is required",
                        field.label
                    )));
                }
                continue;
            }
            Some(value) => value,
        };

        match (field.kind, value) {
            (FieldKind::Checkbox, Value::Bool(_)) => {}
            (FieldKind::Checkbox, _) => {
                return Err(invalid(field, "must be true or false"));
            }
            (FieldKind::Number, Value::Number(_)) => {}
            (FieldKind::Number, Value::String(raw)) if parse_number(raw.trim()).is_some() => {}
            (FieldKind::Number, _) => {
                return Err(invalid(field, "must be a number"));
            }
            (FieldKind::Select, Value::String(raw)) => {
                let options = field.options.unwrap_or(&[]);
                if !options.contains(&raw.as_str()) {
                    return Err(invalid(
                        field,
                        &format!("must be one of: {}", options.join(", ")),
                    ));
                }
            }
            (FieldKind::Text | FieldKind::Textarea, Value::String(raw)) => {
                if field.required && raw.trim().is_empty() {
                    return Err(AppError::ValidationError(format!(
                        "{} is required",
                        field.label
                    )));
                }
            }
            (FieldKind::Select | FieldKind::Text | FieldKind::Textarea, _) => {
                return Err(invalid(field, "must be text"));
            }
        }
    }

    Ok(())
}

fn invalid(field: &FieldDef, reason: &str) -> AppError {
    AppError::ValidationError(format!("{} {}", field.label, reason))
}

fn parse_number(raw: &str) -> Option<Value> {
    if let Ok(int) = raw.parse::<i64>() {
        return Some(Value::Number(int.into()));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}
