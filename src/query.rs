//! Query-string projection of stub payloads.
//!
//! Query-bearing stubs declare their expected parameters as a JSON object.
//! Both that object and the live query string are reduced to the same
//! canonical `application/x-www-form-urlencoded` form (pairs sorted by key,
//! values for a repeated key kept in their original order) and compared as
//! opaque strings.

use serde_json::Value;
use url::form_urlencoded;

/// Canonical query form of a stub's declared payload.
///
/// Non-object payloads project to no parameters.
pub fn project(payload: &Value) -> String {
    let pairs = match payload {
        Value::Object(obj) => obj
            .iter()
            .map(|(k, v)| (k.clone(), scalar_string(v)))
            .collect(),
        _ => Vec::new(),
    };
    encode(pairs)
}

/// Canonical query form of a raw live query string (without the leading `?`).
pub fn canonical_query(raw: Option<&str>) -> String {
    let pairs = form_urlencoded::parse(raw.unwrap_or("").as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    encode(pairs)
}

/// String form of a value as a query parameter: strings pass through,
/// `null` is empty, everything else uses its JSON text.
fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn encode(mut pairs: Vec<(String, String)>) -> String {
    // stable: repeated keys keep their relative order
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}
