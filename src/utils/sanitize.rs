use serde_json::Value;

use crate::domain::Fields;

/// Masks secret values in a JSON document for logging or display.
pub fn sanitize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sanitized = serde_json::Map::new();
            for (key, val) in map {
                let sanitized_val = if is_sensitive_field(key) {
                    mask_value(val)
                } else {
                    sanitize_json(val)
                };
                sanitized.insert(key.clone(), sanitized_val);
            }
            Value::Object(sanitized)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sanitize_json).collect()),
        _ => value.clone(),
    }
}

/// Copy of `fields` with secret values masked.
pub fn sanitize_fields(fields: &Fields) -> Fields {
    fields
        .iter()
        .map(|(key, value)| {
            let value = if is_sensitive_field(key) {
                mask_str(value)
            } else {
                value.to_string()
            };
            (key, value)
        })
        .collect()
}

fn is_sensitive_field(key: &str) -> bool {
    matches!(
        key.to_lowercase().as_str(),
        "securitykey"
            | "vpssignature"
            | "cv2"
            | "cardnumber"
            | "bankauthcode"
            | "txauthno"
            | "password"
            | "secret"
            | "token"
            | "authorization"
            | "database_url"
    )
}

fn mask_str(s: &str) -> String {
    if s.chars().count() > 8 {
        let chars: Vec<char> = s.chars().collect();
        let visible: String = chars[..2].iter().collect();
        let end: String = chars[chars.len() - 2..].iter().collect();
        format!("{}****{}", visible, end)
    } else {
        "****".to_string()
    }
}

fn mask_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(mask_str(s)),
        _ => Value::String("****".to_string()),
    }
}
