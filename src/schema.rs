//! JSON Schema normalization and argument validation.
//!
//! Servers frequently declare parameters with a list-valued `type` (e.g.
//! `"type": ["string", "null"]`), which many schema consumers reject.
//! [`normalize_schema`] rewrites that form into an equivalent `anyOf` and
//! leaves everything else untouched. [`ParameterSchema`] wraps a normalized
//! schema and checks call arguments against a small subset of JSON Schema:
//! `type`, `required`, `properties`, `items`, `enum` and `anyOf`.

use serde_json::{json, Map, Value};

/// Errors raised while validating tool arguments against a schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A value had the wrong JSON type.
    #[error("'{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: &'static str,
    },

    /// A required property was absent.
    #[error("'{path}': missing required property '{name}'")]
    MissingProperty { path: String, name: String },

    /// A value was not one of the enumerated alternatives.
    #[error("'{path}': value is not one of the allowed alternatives")]
    NotInEnum { path: String },

    /// No `anyOf` branch accepted the value.
    #[error("'{path}': value matched none of {count} alternatives")]
    NoVariantMatched { path: String, count: usize },
}

/// Rewrite list-valued `type` keywords into `anyOf` unions, recursively.
///
/// Every mapping value in the schema is visited; non-mapping values pass
/// through unchanged. Applying the function twice yields the same result
/// as applying it once.
pub fn normalize_schema(schema: Value) -> Value {
    match schema {
        Value::Object(map) => {
            let mut map = map;
            if let Some(Value::Array(types)) = map.get("type") {
                let variants: Vec<Value> =
                    types.iter().map(|t| json!({ "type": t })).collect();
                map.remove("type");
                map.insert("anyOf".to_string(), Value::Array(variants));
            }
            let map: Map<String, Value> = map
                .into_iter()
                .map(|(key, value)| (key, normalize_schema(value)))
                .collect();
            Value::Object(map)
        }
        other => other,
    }
}

/// A compiled parameter schema for a single tool.
#[derive(Debug, Clone)]
pub struct ParameterSchema {
    schema: Value,
}

impl ParameterSchema {
    /// Normalize and wrap a raw schema from a tool declaration.
    pub fn compile(raw: Value) -> Self {
        Self {
            schema: normalize_schema(raw),
        }
    }

    /// The normalized schema document.
    pub fn as_value(&self) -> &Value {
        &self.schema
    }

    /// Check `arguments` against the schema.
    pub fn validate(&self, arguments: &Value) -> Result<(), SchemaError> {
        check(&self.schema, arguments, "$")
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_accepts(expected: &str, value: &Value) -> bool {
    match expected {
        // every integer is a number
        "number" => matches!(value, Value::Number(_)),
        other => json_type_name(value) == other,
    }
}

fn check(schema: &Value, value: &Value, path: &str) -> Result<(), SchemaError> {
    let Value::Object(schema) = schema else {
        // Non-object schemas (true/false or junk) accept everything.
        return Ok(());
    };

    if let Some(Value::Array(variants)) = schema.get("anyOf") {
        let matched = variants
            .iter()
            .any(|variant| check(variant, value, path).is_ok());
        if !matched {
            return Err(SchemaError::NoVariantMatched {
                path: path.to_string(),
                count: variants.len(),
            });
        }
    }

    if let Some(Value::String(expected)) = schema.get("type") {
        if !type_accepts(expected, value) {
            return Err(SchemaError::TypeMismatch {
                path: path.to_string(),
                expected: expected.clone(),
                found: json_type_name(value),
            });
        }
    }

    if let Some(Value::Array(allowed)) = schema.get("enum") {
        if !allowed.contains(value) {
            return Err(SchemaError::NotInEnum {
                path: path.to_string(),
            });
        }
    }

    if let Value::Object(fields) = value {
        if let Some(Value::Array(required)) = schema.get("required") {
            for name in required.iter().filter_map(Value::as_str) {
                if !fields.contains_key(name) {
                    return Err(SchemaError::MissingProperty {
                        path: path.to_string(),
                        name: name.to_string(),
                    });
                }
            }
        }
        if let Some(Value::Object(properties)) = schema.get("properties") {
            for (name, subschema) in properties {
                if let Some(field) = fields.get(name) {
                    check(subschema, field, &format!("{}.{}", path, name))?;
                }
            }
        }
    }

    if let Value::Array(items) = value {
        if let Some(item_schema) = schema.get("items") {
            for (index, item) in items.iter().enumerate() {
                check(item_schema, item, &format!("{}[{}]", path, index))?;
            }
        }
    }

    Ok(())
}
