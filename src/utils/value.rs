use serde_json::Value;

/// Render a status cell as a Prometheus label value.
///
/// Strings lose their JSON quotes, everything else uses its JSON text.
pub fn value_to_label(value: &Value) -> String {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    };
    sanitize_label_value(raw)
}

fn sanitize_label_value(s: String) -> String {
    s.chars().filter(|c| !c.is_control()).collect()
}
