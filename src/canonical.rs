//! Canonical JSON encoding for payload comparison.
//!
//! Two payloads are equal when their canonical encodings are byte-identical.
//! Object keys come out sorted with no insignificant whitespace, and
//! integral numbers are written in integer form so `1.0` and `1` compare
//! equal.

use serde_json::{Number, Value};

/// Canonical encoding of a live request body.
pub fn canonicalize_bytes(raw: &[u8]) -> serde_json::Result<Vec<u8>> {
    let value: Value = serde_json::from_slice(raw)?;
    canonicalize(&value)
}

/// Canonical encoding of an already-decoded payload.
pub fn canonicalize(value: &Value) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(&normalize(value))
}

fn normalize(value: &Value) -> Value {
    match value {
        Value::Number(n) => Value::Number(normalize_number(n)),
        Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        Value::Object(obj) => {
            let mut entries: Vec<_> = obj
                .iter()
                .map(|(k, v)| (k.clone(), normalize(v)))
                .collect();
            // sorted regardless of the map backing serde_json was built with
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().collect())
        }
        _ => value.clone(),
    }
}

fn normalize_number(n: &Number) -> Number {
    if n.is_i64() || n.is_u64() {
        return n.clone();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Number::from(f as i64)
        }
        _ => n.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_order_and_whitespace_ignored() {
        let a = canonicalize_bytes(br#"{"b": 2, "a": {"y": true, "x": null}}"#).unwrap();
        let b = canonicalize_bytes(br#"{"a":{"x":null,"y":true},"b":2}"#).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, br#"{"a":{"x":null,"y":true},"b":2}"#.to_vec());
    }

    #[test]
    fn test_fixture_and_body_agree() {
        let fixture = json!({"name": "jane", "tags": ["a", "b"], "age": 30});
        let body = br#"
            {
                "tags": ["a", "b"],
                "age": 30,
                "name": "jane"
            }
        "#;
        assert_eq!(canonicalize(&fixture).unwrap(), canonicalize_bytes(body).unwrap());
    }

    #[test]
    fn test_array_order_is_significant() {
        let a = canonicalize_bytes(b"[1,2]").unwrap();
        let b = canonicalize_bytes(b"[2,1]").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_integral_floats_normalized() {
        assert_eq!(
            canonicalize_bytes(br#"{"n": 1.0}"#).unwrap(),
            canonicalize_bytes(br#"{"n": 1}"#).unwrap()
        );
        assert_eq!(
            canonicalize_bytes(b"1e2").unwrap(),
            canonicalize_bytes(b"100").unwrap()
        );
        assert_eq!(canonicalize_bytes(b"1.5").unwrap(), b"1.5".to_vec());
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let once = canonicalize_bytes(br#"{ "z": [ {"b":1,"a":2} ], "y": "s" }"#).unwrap();
        let twice = canonicalize_bytes(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_malformed_body() {
        assert!(canonicalize_bytes(b"{\"a\":").is_err());
        assert!(canonicalize_bytes(b"").is_err());
    }
}
