//! CloudKit Web Services wire types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Record types and fields of the recipe schema.
pub mod schema {
    pub const RECIPE: &str = "CD_Recipe";
    pub const INGREDIENT: &str = "CD_Ingredient";
    pub const INSTRUCTION: &str = "CD_Instruction";
    pub const RECIPE_IMAGE: &str = "CD_RecipeImage";

    /// Candidate name fields, highest priority first.
    pub const RECIPE_NAME_FIELDS: &[&str] = &["CD_name", "CD_title", "name", "title"];
    pub const RECIPE_URL_FIELDS: &[&str] = &["CD_url", "CD_sourceURL", "url"];
    pub const RECIPE_DATE_CREATED: &str = "CD_dateCreated";

    /// Foreign key from child records to their recipe.
    pub const RECIPE_REFERENCE: &str = "CD_recipe";
    pub const INGREDIENT_TEXT: &str = "CD_unparsedString";
    pub const INSTRUCTION_TEXT: &str = "CD_instruction";
    pub const INSTRUCTION_INDEX: &str = "CD_index";
    pub const IMAGE_DATA: &str = "CD_imageData";
}

/// Server error code for a missing record.
pub const NOT_FOUND: &str = "NOT_FOUND";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub record_type: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filter_by: Vec<Filter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort_by: Vec<SortDescriptor>,
}

impl Query {
    pub fn new(record_type: &'static str) -> Self {
        Self {
            record_type,
            filter_by: Vec::new(),
            sort_by: Vec::new(),
        }
    }

    #[must_use]
    pub fn filter_equals(mut self, field_name: &'static str, value: &str) -> Self {
        self.filter_by.push(Filter {
            field_name,
            comparator: Comparator::Equals,
            field_value: FilterValue {
                value: Value::String(value.to_string()),
            },
        });
        self
    }

    #[must_use]
    pub fn sort(mut self, field_name: &'static str, ascending: bool) -> Self {
        self.sort_by.push(SortDescriptor {
            field_name,
            ascending,
        });
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub field_name: &'static str,
    pub comparator: Comparator,
    pub field_value: FilterValue,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Comparator {
    Equals,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterValue {
    pub value: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortDescriptor {
    pub field_name: &'static str,
    pub ascending: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest<'a> {
    pub query: &'a Query,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_marker: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct LookupRequest<'a> {
    pub records: Vec<RecordRef<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRef<'a> {
    pub record_name: &'a str,
}

/// Envelope shared by query and lookup responses.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordsResponse {
    #[serde(default)]
    pub records: Vec<RawRecord>,
    #[serde(default)]
    pub continuation_marker: Option<String>,
    #[serde(default)]
    pub has_errors: bool,
    #[serde(default)]
    pub errors: Vec<ServerError>,
}

/// A record as returned by the backend, or a per-record error entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    #[serde(default)]
    pub record_name: String,
    #[serde(default)]
    pub record_type: Option<String>,
    #[serde(default)]
    pub fields: HashMap<String, FieldValue>,
    #[serde(default)]
    pub created: Option<RecordTimestamp>,
    #[serde(default)]
    pub server_error_code: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl RawRecord {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).map(|field| &field.value)
    }

    /// Non-blank string value of a field.
    pub fn string_field(&self, name: &str) -> Option<&str> {
        self.field(name)
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn error(&self) -> Option<ServerError> {
        self.server_error_code.as_ref().map(|code| ServerError {
            server_error_code: code.clone(),
            reason: self.reason.clone(),
            record_name: Some(self.record_name.clone()).filter(|name| !name.is_empty()),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldValue {
    #[serde(default)]
    pub value: Value,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RecordTimestamp {
    /// Milliseconds since the epoch.
    pub timestamp: i64,
}

/// Structured error reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerError {
    #[serde(default)]
    pub server_error_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_name: Option<String>,
}

/// Top-level error envelope of a failed request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub server_error_code: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(rename = "redirectURL", default)]
    pub redirect_url: Option<String>,
}
