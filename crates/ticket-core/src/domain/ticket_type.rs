//! Ticket Type Entity
//!
//! A named category with a display colour and a custom-field schema that
//! every ticket of the type must satisfy.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use super::entity::{DomainError, DomainResult, Entity, FieldError};

/// Value kind of a custom field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    /// RFC 3339 timestamp string
    Date,
    /// One of the field's options
    Select,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Date => "date",
            FieldKind::Select => "select",
        }
    }
}

/// Schema entry for one custom field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,
    /// Allowed values for select fields
    #[serde(default)]
    pub options: Vec<String>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: None,
            options: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Check a single value against this field, returning the complaint
    fn check_value(&self, value: &Value) -> Option<String> {
        let ok = match self.kind {
            FieldKind::Text => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Date => value
                .as_str()
                .map(|s| DateTime::parse_from_rfc3339(s).is_ok())
                .unwrap_or(false),
            FieldKind::Select => {
                return match value.as_str() {
                    Some(s) if self.options.iter().any(|o| o == s) => None,
                    _ => Some(format!("must be one of: {}", self.options.join(", "))),
                };
            }
        };
        if ok {
            None
        } else {
            Some(format!("must be a {} value", self.kind.as_str()))
        }
    }
}

/// A ticket category: name, colour and custom-field schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketType {
    pub id: u32,
    pub name: String,
    /// Display colour (#rgb or #rrggbb)
    pub color: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl TicketType {
    pub fn new(id: u32, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate the type definition itself
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "is required"));
        }
        if !is_hex_color(&self.color) {
            errors.push(FieldError::new("color", "must be #rgb or #rrggbb"));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                errors.push(FieldError::new("fields", "field name is required"));
                continue;
            }
            if !seen.insert(field.name.as_str()) {
                errors.push(FieldError::new(&field.name, "duplicate field name"));
            }
            if field.kind == FieldKind::Select && field.options.is_empty() {
                errors.push(FieldError::new(&field.name, "select field needs options"));
            }
            if let Some(default) = &field.default {
                if let Some(message) = field.check_value(default) {
                    errors.push(FieldError::new(&field.name, format!("default {}", message)));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(errors))
        }
    }

    /// Validate a ticket's custom properties against the schema.
    /// Collects every failing field instead of stopping at the first one.
    pub fn validate_properties(&self, properties: &Map<String, Value>) -> DomainResult<()> {
        let mut errors = Vec::new();

        for field in &self.fields {
            match properties.get(&field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        errors.push(FieldError::new(&field.name, "is required"));
                    }
                }
                Some(value) => {
                    if let Some(message) = field.check_value(value) {
                        errors.push(FieldError::new(&field.name, message));
                    }
                }
            }
        }

        for key in properties.keys() {
            if self.field(key).is_none() {
                errors.push(FieldError::new(key, format!("is not a field of {}", self.name)));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(errors))
        }
    }

    /// Fill in defaults for fields that are missing or null
    pub fn apply_defaults(&self, properties: &mut Map<String, Value>) {
        for field in &self.fields {
            let Some(default) = &field.default else { continue };
            let missing = matches!(properties.get(&field.name), None | Some(Value::Null));
            if missing {
                properties.insert(field.name.clone(), default.clone());
            }
        }
    }
}

impl Entity for TicketType {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}

fn is_hex_color(color: &str) -> bool {
    match color.strip_prefix('#') {
        Some(hex) => (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meeting_type() -> TicketType {
        TicketType::new(1, "Meeting", "#3498db")
            .with_field(FieldDefinition::new("room", FieldKind::Text).required())
            .with_field(FieldDefinition::new("attendees", FieldKind::Number).with_default(json!(2)))
            .with_field(
                FieldDefinition::new("priority", FieldKind::Select)
                    .with_options(["low", "high"])
                    .with_default(json!("low")),
            )
            .with_field(FieldDefinition::new("follow_up", FieldKind::Date))
    }

    fn props(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_valid_type_definition() {
        assert!(meeting_type().validate().is_ok());
    }

    #[test]
    fn test_type_definition_errors() {
        let bad = TicketType::new(2, " ", "blue")
            .with_field(FieldDefinition::new("size", FieldKind::Select))
            .with_field(FieldDefinition::new("size", FieldKind::Number).with_default(json!("big")));
        let err = bad.validate().unwrap_err();
        let fields: Vec<&str> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "color", "size", "size", "size"]);
    }

    #[test]
    fn test_accepts_matching_properties() {
        let ty = meeting_type();
        let p = props(json!({
            "room": "B12",
            "attendees": 5,
            "priority": "high",
            "follow_up": "2024-03-05T09:00:00Z"
        }));
        assert!(ty.validate_properties(&p).is_ok());
    }

    #[test]
    fn test_rejects_malformed_properties() {
        let ty = meeting_type();
        let p = props(json!({
            "attendees": "many",
            "priority": "urgent",
            "follow_up": "tomorrow",
            "colour": "red"
        }));
        let err = ty.validate_properties(&p).unwrap_err();
        let fields: Vec<&str> = err.field_errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["room", "attendees", "priority", "follow_up", "colour"]);
    }

    #[test]
    fn test_null_counts_as_missing() {
        let ty = meeting_type();
        let err = ty.validate_properties(&props(json!({ "room": null }))).unwrap_err();
        assert_eq!(err.field_errors()[0], FieldError::new("room", "is required"));
    }

    #[test]
    fn test_apply_defaults_keeps_existing_values() {
        let ty = meeting_type();
        let mut p = props(json!({ "room": "A1", "priority": "high" }));
        ty.apply_defaults(&mut p);
        assert_eq!(p["attendees"], json!(2));
        assert_eq!(p["priority"], json!("high"));
        assert!(!p.contains_key("follow_up"));
    }

    #[test]
    fn test_hex_color() {
        assert!(is_hex_color("#fff"));
        assert!(is_hex_color("#A0b1C2"));
        assert!(!is_hex_color("#abcd"));
        assert!(!is_hex_color("fff"));
    }
}
