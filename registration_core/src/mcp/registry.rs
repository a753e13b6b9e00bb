use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolMeta {
    pub name: String,
    pub description: String,
    pub input_schema: Option<Value>,
}

impl ToolMeta {
    /// The OpenAI function-calling spec for this tool. Rebuilt on every
    /// dispatch, never cached.
    pub fn function_spec(&self) -> Value {
        let description = if self.description.is_empty() {
            "No description provided."
        } else {
            self.description.as_str()
        };
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": description,
                "parameters": ensure_object_schema(self.input_schema.clone()),
            }
        })
    }
}

/// Coerces a parameter schema into a JSON object. A string-encoded schema
/// is parsed; anything else falls back to an empty object schema, so the
/// spec stays transmittable no matter what the server sent.
pub fn ensure_object_schema(schema: Option<Value>) -> Value {
    match schema {
        Some(Value::Object(m)) => Value::Object(m),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(&s) {
            Ok(Value::Object(m)) => Value::Object(m),
            _ => empty_object_schema(),
        },
        _ => empty_object_schema(),
    }
}

fn empty_object_schema() -> Value {
    json!({"type": "object", "properties": {}, "required": []})
}
