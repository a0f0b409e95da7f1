use quill_rt::accessor::MapAccessor;
use quill_rt::value::Value;

/// Converts host JSON data into runtime values. JSON null has no runtime
/// counterpart and becomes empty text.
pub fn value_from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Text(String::new()),
        serde_json::Value::Bool(v) => Value::Boolean(*v),
        serde_json::Value::Number(v) => Value::Number(v.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(v) => Value::Text(v.clone()),
        serde_json::Value::Array(items) => {
            Value::Sequence(items.iter().map(value_from_json).collect())
        }
        serde_json::Value::Object(fields) => Value::Map(
            fields
                .iter()
                .map(|(name, value)| (name.clone(), value_from_json(value)))
                .collect(),
        ),
    }
}

pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Text(v) => serde_json::Value::String(v.clone()),
        Value::Boolean(v) => serde_json::Value::Bool(*v),
        Value::Number(v) => serde_json::Number::from_f64(*v)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Sequence(items) => {
            serde_json::Value::Array(items.iter().map(value_to_json).collect())
        }
        Value::Map(fields) => serde_json::Value::Object(
            fields
                .iter()
                .map(|(name, value)| (name.clone(), value_to_json(value)))
                .collect(),
        ),
    }
}

/// Builds a root scope from a JSON object; other JSON kinds have no
/// top-level bindings to offer.
pub fn accessor_from_json(json: &serde_json::Value) -> Option<MapAccessor> {
    match value_from_json(json) {
        Value::Map(fields) => Some(MapAccessor::from(fields)),
        _ => None,
    }
}
