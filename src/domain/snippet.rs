use crate::domain::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetOwner {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: i64,
    #[serde(skip)]
    pub user_id: i64,
    #[serde(rename = "type")]
    pub snippet_type: String,
    pub name: String,
    pub description: String,
    pub script: String,
    pub metadata: Value,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<SnippetOwner>,
    pub can_manage: bool,
}

impl Snippet {
    /// Metadata column is free-form text; anything that is not a JSON
    /// object is surfaced as an empty object.
    pub fn parse_metadata(raw: Option<&str>) -> Value {
        raw.and_then(|text| serde_json::from_str::<Value>(text).ok())
            .filter(Value::is_object)
            .unwrap_or_else(|| Value::Object(Map::new()))
    }
}

/// Body of create and update requests. Every field is optional so the
/// update path can fall back to stored values.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SnippetInput {
    #[serde(rename = "type", default)]
    #[validate(length(max = 64))]
    pub snippet_type: Option<String>,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl SnippetInput {
    pub fn trimmed_type(&self) -> Option<String> {
        non_blank(self.snippet_type.as_deref())
    }

    pub fn trimmed_name(&self) -> Option<String> {
        non_blank(self.name.as_deref())
    }

    pub fn metadata_map(&self) -> Result<Map<String, Value>> {
        match &self.metadata {
            None | Some(Value::Null) => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(_) => Err(AppError::ValidationError(
                "Metadata must be an object".to_string(),
            )),
        }
    }
}

/// Fully resolved values written to the store.
#[derive(Debug, Clone)]
pub struct SnippetFields {
    pub snippet_type: String,
    pub name: String,
    pub description: String,
    pub script: String,
    pub metadata: Value,
}

/// Listing filters. `query` is a substring match over name, description,
/// script and metadata text.
#[derive(Debug, Clone, Default)]
pub struct SnippetFilter {
    pub query: Option<String>,
    pub snippet_type: Option<String>,
    pub owner_id: Option<i64>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_metadata_falls_back_to_empty_object() {
        assert_eq!(Snippet::parse_metadata(None), json!({}));
        assert_eq!(Snippet::parse_metadata(Some("{broken")), json!({}));
        assert_eq!(Snippet::parse_metadata(Some("[1,2]")), json!({}));
        assert_eq!(
            Snippet::parse_metadata(Some(r#"{"table":"incident"}"#)),
            json!({ "table": "incident" })
        );
    }

    #[test]
    fn test_snippet_wire_shape() {
        let snippet = Snippet {
            id: 4,
            user_id: 2,
            snippet_type: "business_rule".into(),
            name: "Close child incidents".into(),
            description: String::new(),
            script: "gs.info('x');".into(),
            metadata: json!({}),
            created_at: Some("2024-01-01T00:00:00Z".into()),
            updated_at: Some("2024-01-02T00:00:00Z".into()),
            owner: Some(SnippetOwner {
                email: "dev@example.com".into(),
            }),
            can_manage: true,
        };
        let value = serde_json::to_value(&snippet).unwrap();
        assert_eq!(value["type"], "business_rule");
        assert_eq!(value["canManage"], true);
        assert_eq!(value["updatedAt"], "2024-01-02T00:00:00Z");
        assert_eq!(value["owner"]["email"], "dev@example.com");
        assert!(value.get("userId").is_none());
    }

    #[test]
    fn test_input_helpers() {
        let input: SnippetInput = serde_json::from_value(json!({
            "type": " client_script ",
            "name": "   ",
            "metadata": { "table": "incident" }
        }))
        .unwrap();
        assert_eq!(input.trimmed_type().as_deref(), Some("client_script"));
        assert!(input.trimmed_name().is_none());
        assert_eq!(input.metadata_map().unwrap()["table"], "incident");

        let bad: SnippetInput = serde_json::from_value(json!({ "metadata": "text" })).unwrap();
        assert!(bad.metadata_map().is_err());
    }
}
