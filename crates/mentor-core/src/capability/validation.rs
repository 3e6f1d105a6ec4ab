//! Structured-output validation gate.
//!
//! Every capability call that returns structured data goes through this
//! gate before the rest of the engine may treat the result as a typed
//! object. The gate does three things: dig a JSON object out of whatever
//! prose the model wrapped it in, check the parsed value against the
//! declared schema, and only then deserialize into the target type.
//!
//! Unknown extra fields are ignored (forward-compatible); a missing or
//! mistyped *required* field is a hard error carrying the capability and
//! schema names - never a silently substituted default.

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::CapabilityError;

/// Expected type of a schema field.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Bool,
    Number,
    String,
    /// Array with homogeneous element type.
    Array(Box<FieldKind>),
    /// Nested object with its own field list, checked recursively.
    Object(Vec<Field>),
}

/// One declared field of a capability output schema.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl Field {
    pub fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// A named capability output schema.
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: &'static str,
    pub fields: Vec<Field>,
}

/// Schema for the safety capability's verdict payload.
pub static SAFETY_SCHEMA: Lazy<Schema> = Lazy::new(|| Schema {
    name: "SafetyVerdict",
    fields: vec![
        Field::required("isSafe", FieldKind::Bool),
        Field::optional("violationType", FieldKind::String),
        Field::optional("guidance", FieldKind::String),
        Field::required("shouldWarn", FieldKind::Bool),
    ],
});

/// Schema for the turn-decision capability's directive payload.
pub static TURN_SCHEMA: Lazy<Schema> = Lazy::new(|| Schema {
    name: "TurnDirective",
    fields: vec![
        Field::required("response", FieldKind::String),
        Field::required("intent", FieldKind::String),
        Field::optional("answerCorrect", FieldKind::Bool),
        Field::required(
            "misconceptionsDetected",
            FieldKind::Array(Box::new(FieldKind::String)),
        ),
        Field::required(
            "masteryUpdates",
            FieldKind::Array(Box::new(FieldKind::Object(vec![
                Field::required("concept", FieldKind::String),
                Field::required("score", FieldKind::Number),
            ]))),
        ),
        Field::optional("advanceToStep", FieldKind::Number),
        Field::optional("questionAsked", FieldKind::String),
        Field::optional("expectedAnswer", FieldKind::String),
        Field::optional("questionConcept", FieldKind::String),
        Field::required("sessionComplete", FieldKind::Bool),
        Field::required("turnSummary", FieldKind::String),
        Field::required("reasoning", FieldKind::String),
    ],
});

/// Extracts a JSON object from raw capability output.
///
/// Tries a fenced ```json block first, then any fenced block containing
/// an object, then the first balanced top-level `{...}` span.
pub fn extract_json(output: &str) -> Option<String> {
    if let Some(start) = output.find("```json") {
        let after_marker = &output[start + 7..];
        if let Some(end) = after_marker.find("```") {
            return Some(after_marker[..end].trim().to_string());
        }
    }

    if let Some(start) = output.find("```") {
        let after_marker = &output[start + 3..];
        if let Some(end) = after_marker.find("```") {
            if let Some(json_start) = after_marker[..end].find('{') {
                let content = after_marker[json_start..end].trim();
                if !content.is_empty() {
                    return Some(content.to_string());
                }
            }
        }
    }

    if let Some(start) = output.find('{') {
        let mut depth = 0;
        let mut end = start;
        for (i, c) in output[start..].char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        end = start + i + 1;
                        break;
                    }
                }
                _ => {}
            }
        }
        if depth == 0 && end > start {
            return Some(output[start..end].to_string());
        }
    }

    None
}

fn kind_matches(value: &Value, kind: &FieldKind, path: &str) -> Result<(), String> {
    match kind {
        FieldKind::Bool => {
            if !value.is_boolean() {
                return Err(format!("field '{path}' is not a boolean"));
            }
        }
        FieldKind::Number => {
            if !value.is_number() {
                return Err(format!("field '{path}' is not a number"));
            }
        }
        FieldKind::String => {
            if !value.is_string() {
                return Err(format!("field '{path}' is not a string"));
            }
        }
        FieldKind::Array(element) => {
            let Some(items) = value.as_array() else {
                return Err(format!("field '{path}' is not an array"));
            };
            for (i, item) in items.iter().enumerate() {
                kind_matches(item, element, &format!("{path}[{i}]"))?;
            }
        }
        FieldKind::Object(fields) => {
            validate_object(value, fields, path)?;
        }
    }
    Ok(())
}

fn validate_object(value: &Value, fields: &[Field], path: &str) -> Result<(), String> {
    let Some(object) = value.as_object() else {
        return Err(format!("'{path}' is not an object"));
    };
    for field in fields {
        let field_path = if path.is_empty() {
            field.name.to_string()
        } else {
            format!("{path}.{}", field.name)
        };
        match object.get(field.name) {
            // Null reads as absent: fine for optional, an error for required.
            None | Some(Value::Null) => {
                if field.required {
                    return Err(format!("missing required field '{field_path}'"));
                }
            }
            Some(present) => kind_matches(present, &field.kind, &field_path)?,
        }
    }
    Ok(())
}

/// Parses and validates raw capability output into a typed payload.
///
/// # Errors
///
/// Returns [`CapabilityError::InvalidOutput`] naming the capability and
/// schema when no JSON object can be found, the JSON does not parse, or
/// a required field is missing or mistyped.
pub fn parse_validated<T: DeserializeOwned>(
    capability: &str,
    schema: &Schema,
    raw: &str,
) -> Result<T, CapabilityError> {
    let extracted = extract_json(raw).ok_or_else(|| {
        CapabilityError::invalid_output(capability, schema.name, "no JSON object found in output")
    })?;

    let value: Value = serde_json::from_str(&extracted)
        .map_err(|err| CapabilityError::invalid_output(capability, schema.name, err.to_string()))?;

    validate_object(&value, &schema.fields, "")
        .map_err(|message| CapabilityError::invalid_output(capability, schema.name, message))?;

    serde_json::from_value(value)
        .map_err(|err| CapabilityError::invalid_output(capability, schema.name, err.to_string()))
}
