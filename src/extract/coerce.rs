//! Type coercion of collaborator output
//!
//! The collaborator returns loosely typed JSON. Each value is coerced to the
//! declared kind; a value that cannot be coerced makes its field absent.

use crate::extract::FieldKind;
use serde_json::{Number, Value};

/// Coerces a raw value to `kind`, or None when it does not fit
///
/// # Examples
///
/// ```
/// use leadscout::extract::{coerce, FieldKind};
/// use serde_json::json;
///
/// assert_eq!(coerce(&json!("1,200"), FieldKind::Number), Some(json!(1200)));
/// assert_eq!(coerce(&json!("yes"), FieldKind::Boolean), Some(json!(true)));
/// assert_eq!(coerce(&json!("lots"), FieldKind::Number), None);
/// ```
pub fn coerce(value: &Value, kind: FieldKind) -> Option<Value> {
    if value.is_null() {
        return None;
    }

    match kind {
        FieldKind::String => coerce_string(value),
        FieldKind::Number => coerce_number(value),
        FieldKind::Boolean => coerce_boolean(value),
        FieldKind::List => coerce_list(value),
    }
}

fn coerce_string(value: &Value) -> Option<Value> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(scalar_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
        Value::Null => return None,
    };

    (!text.is_empty()).then_some(Value::String(text))
}

fn coerce_number(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) => Some(Value::Number(n.clone())),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !c.is_whitespace() && *c != ',' && *c != '$')
                .collect();
            if let Ok(int) = cleaned.parse::<i64>() {
                return Some(Value::Number(int.into()));
            }
            cleaned
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
        }
        _ => None,
    }
}

fn coerce_boolean(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(b) => Some(Value::Bool(*b)),
        Value::Number(n) => match n.as_f64() {
            Some(x) if x == 1.0 => Some(Value::Bool(true)),
            Some(x) if x == 0.0 => Some(Value::Bool(false)),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(Value::Bool(true)),
            "false" | "no" | "n" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

fn coerce_list(value: &Value) -> Option<Value> {
    let items: Vec<Value> = match value {
        Value::Array(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .filter(|item| !matches!(item, Value::String(s) if s.trim().is_empty()))
            .cloned()
            .collect(),
        Value::String(s) => s
            .split(|c| c == ',' || c == ';')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| Value::String(part.to_string()))
            .collect(),
        Value::Number(_) | Value::Bool(_) => vec![value.clone()],
        Value::Object(_) => vec![value.clone()],
        Value::Null => Vec::new(),
    };

    (!items.is_empty()).then_some(Value::Array(items))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_accepts_raw_text() {
        assert_eq!(
            coerce(&json!("  Acme Corp "), FieldKind::String),
            Some(json!("Acme Corp"))
        );
        assert_eq!(coerce(&json!(42), FieldKind::String), Some(json!("42")));
        assert_eq!(coerce(&json!(""), FieldKind::String), None);
        assert_eq!(
            coerce(&json!(["a", "b"]), FieldKind::String),
            Some(json!("a, b"))
        );
    }

    #[test]
    fn test_null_is_always_absent() {
        for kind in [
            FieldKind::String,
            FieldKind::Number,
            FieldKind::Boolean,
            FieldKind::List,
        ] {
            assert_eq!(coerce(&Value::Null, kind), None);
        }
    }

    #[test]
    fn test_number_parsing() {
        assert_eq!(coerce(&json!(7), FieldKind::Number), Some(json!(7)));
        assert_eq!(coerce(&json!("$4.5"), FieldKind::Number), Some(json!(4.5)));
        assert_eq!(coerce(&json!("about 50"), FieldKind::Number), None);
        assert_eq!(coerce(&json!(true), FieldKind::Number), None);
    }

    #[test]
    fn test_boolean_parsing() {
        assert_eq!(coerce(&json!("No"), FieldKind::Boolean), Some(json!(false)));
        assert_eq!(coerce(&json!(1), FieldKind::Boolean), Some(json!(true)));
        assert_eq!(coerce(&json!(2), FieldKind::Boolean), None);
        assert_eq!(coerce(&json!("maybe"), FieldKind::Boolean), None);
    }

    #[test]
    fn test_list_parsing() {
        assert_eq!(
            coerce(&json!("React; AWS, Python"), FieldKind::List),
            Some(json!(["React", "AWS", "Python"]))
        );
        assert_eq!(
            coerce(&json!(["a", null, ""]), FieldKind::List),
            Some(json!(["a"]))
        );
        assert_eq!(coerce(&json!([]), FieldKind::List), None);
        assert_eq!(coerce(&json!("solo"), FieldKind::List), Some(json!(["solo"])));
    }
}
