//! Request matching logic.
//!
//! Selects the stub answering a live request. Matching is a linear,
//! first-match, exact-equality scan over the stubs in file order:
//!
//! 1. keep only stubs whose method equals the live method (case-sensitive);
//!    none left means 405 before the body is read
//! 2. a stub without a request payload matches only a request with an empty
//!    query and an empty body
//! 3. body-bearing methods compare canonical JSON encodings of the stub
//!    payload and the live body
//! 4. query-bearing methods compare the canonical query projection of the
//!    stub payload with the live query string
//! 5. a payload stub on any other method rejects the request outright

use crate::canonical;
use crate::error::SelectError;
use crate::query;
use crate::stub::StubDefinition;
use tracing::{debug, trace};

/// How a method carries its request payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodClass {
    /// Payload travels in the body (POST, PUT, PATCH)
    Body,
    /// Payload travels in the query string (GET, HEAD)
    Query,
    /// No payload channel
    Other,
}

impl MethodClass {
    pub fn of(method: &str) -> Self {
        match method {
            "POST" | "PUT" | "PATCH" => MethodClass::Body,
            "GET" | "HEAD" => MethodClass::Query,
            _ => MethodClass::Other,
        }
    }
}

/// The parts of a live request the selector looks at.
#[derive(Debug, Clone, Copy)]
pub struct LiveRequest<'a> {
    pub method: &'a str,
    /// Raw query string without the leading `?`
    pub query: Option<&'a str>,
    pub body: &'a [u8],
}

/// Stubs declared for `method`, in file order.
pub fn candidates<'a>(stubs: &'a [StubDefinition], method: &str) -> Vec<&'a StubDefinition> {
    stubs
        .iter()
        .filter(|stub| stub.request.method() == method)
        .collect()
}

/// Find the first stub matching a request.
pub fn find_match<'a>(
    stubs: &'a [StubDefinition],
    request: &LiveRequest<'_>,
) -> Result<&'a StubDefinition, SelectError> {
    let candidates = candidates(stubs, request.method);
    if candidates.is_empty() {
        return Err(SelectError::MethodNotAllowed);
    }
    select(&candidates, request)
}

/// Scan method-filtered candidates in order and return the first match.
pub fn select<'a>(
    candidates: &[&'a StubDefinition],
    request: &LiveRequest<'_>,
) -> Result<&'a StubDefinition, SelectError> {
    let class = MethodClass::of(request.method);
    let live_query = query::canonical_query(request.query);

    // canonicalized on first use; a malformed body only matters once a
    // payload stub needs it
    let mut live_body: Option<Vec<u8>> = None;

    for stub in candidates.iter().copied() {
        let Some(expected) = stub.request.payload() else {
            if live_query.is_empty() && request.body.is_empty() {
                debug!(stub = %stub.name, method = %request.method, "Request matched stub");
                return Ok(stub);
            }
            trace!(stub = %stub.name, "Stub expects an empty request, skipping");
            continue;
        };

        let matched = match class {
            MethodClass::Body => {
                if live_body.is_none() {
                    live_body = Some(
                        canonical::canonicalize_bytes(request.body)
                            .map_err(SelectError::MalformedBody)?,
                    );
                }
                let expected = canonical::canonicalize(expected).map_err(SelectError::Encode)?;
                live_body.as_deref() == Some(expected.as_slice())
            }
            MethodClass::Query => query::project(expected) == live_query,
            MethodClass::Other => return Err(SelectError::UnsupportedMethod),
        };

        if matched {
            debug!(stub = %stub.name, method = %request.method, "Request matched stub");
            return Ok(stub);
        }
        trace!(stub = %stub.name, "Payload differs, skipping");
    }

    Err(SelectError::NoMatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::{RequestSpec, ResponseKind};
    use serde_json::{json, Value};

    fn make_stub(name: &str, method: &str, payload: Option<Value>) -> StubDefinition {
        StubDefinition {
            name: name.to_string(),
            request: RequestSpec {
                method: method.to_string(),
                payload,
            },
            response: ResponseKind::Data(json!({ "stub": name })),
        }
    }

    fn request<'a>(method: &'a str, query: Option<&'a str>, body: &'a [u8]) -> LiveRequest<'a> {
        LiveRequest {
            method,
            query,
            body,
        }
    }

    #[test]
    fn test_method_not_allowed() {
        let stubs = vec![make_stub("get", "GET", None)];
        let result = find_match(&stubs, &request("DELETE", None, b""));
        assert!(matches!(result, Err(SelectError::MethodNotAllowed)));
    }

    #[test]
    fn test_method_is_case_sensitive() {
        let stubs = vec![make_stub("get", "get", None)];
        let result = find_match(&stubs, &request("GET", None, b""));
        assert!(matches!(result, Err(SelectError::MethodNotAllowed)));
    }

    #[test]
    fn test_payloadless_stub_matches_empty_request() {
        let stubs = vec![make_stub("empty", "GET", None)];
        let stub = find_match(&stubs, &request("GET", None, b"")).unwrap();
        assert_eq!(stub.name, "empty");

        let stub = find_match(&stubs, &request("GET", Some(""), b"")).unwrap();
        assert_eq!(stub.name, "empty");
    }

    #[test]
    fn test_payloadless_stub_rejects_query_or_body() {
        let stubs = vec![make_stub("empty", "GET", None)];
        assert!(matches!(
            find_match(&stubs, &request("GET", Some("a=1"), b"")),
            Err(SelectError::NoMatch)
        ));

        let stubs = vec![make_stub("empty", "POST", None)];
        assert!(matches!(
            find_match(&stubs, &request("POST", None, b"{}")),
            Err(SelectError::NoMatch)
        ));
    }

    #[test]
    fn test_payloadless_mismatch_falls_through() {
        let stubs = vec![
            make_stub("empty", "GET", None),
            make_stub("paged", "GET", Some(json!({"page": 2}))),
        ];
        let stub = find_match(&stubs, &request("GET", Some("page=2"), b"")).unwrap();
        assert_eq!(stub.name, "paged");
    }

    #[test]
    fn test_first_match_wins() {
        let stubs = vec![
            make_stub("first", "POST", Some(json!({"a": 1}))),
            make_stub("second", "POST", Some(json!({"a": 1}))),
        ];
        let stub = find_match(&stubs, &request("POST", None, br#"{"a":1}"#)).unwrap();
        assert_eq!(stub.name, "first");

        let stubs = vec![
            make_stub("empty", "GET", None),
            make_stub("also-empty", "GET", None),
        ];
        let stub = find_match(&stubs, &request("GET", None, b"")).unwrap();
        assert_eq!(stub.name, "empty");
    }

    #[test]
    fn test_body_matching_ignores_formatting() {
        let stubs = vec![
            make_stub("other", "PUT", Some(json!({"id": 2}))),
            make_stub("target", "PUT", Some(json!({"id": 1, "tags": ["x"]}))),
        ];
        let body = br#"
            { "tags": [ "x" ],
              "id": 1 }
        "#;
        let stub = find_match(&stubs, &request("PUT", None, body)).unwrap();
        assert_eq!(stub.name, "target");
    }

    #[test]
    fn test_body_mismatch_is_no_match() {
        let stubs = vec![make_stub("target", "POST", Some(json!({"id": 1})))];
        let result = find_match(&stubs, &request("POST", None, br#"{"id":2}"#));
        assert!(matches!(result, Err(SelectError::NoMatch)));
    }

    #[test]
    fn test_malformed_body_aborts() {
        let stubs = vec![
            make_stub("a", "POST", Some(json!({"id": 1}))),
            make_stub("b", "POST", None),
        ];
        let result = find_match(&stubs, &request("POST", None, b"{oops"));
        assert!(matches!(result, Err(SelectError::MalformedBody(_))));
    }

    #[test]
    fn test_query_order_ignored() {
        let stubs = vec![make_stub("q", "GET", Some(json!({"a": 1, "b": "two"})))];
        for q in ["a=1&b=two", "b=two&a=1"] {
            let stub = find_match(&stubs, &request("GET", Some(q), b"")).unwrap();
            assert_eq!(stub.name, "q");
        }

        let result = find_match(&stubs, &request("GET", Some("a=1"), b""));
        assert!(matches!(result, Err(SelectError::NoMatch)));
    }

    #[test]
    fn test_payload_on_other_method_rejected() {
        let stubs = vec![
            make_stub("del", "DELETE", Some(json!({"id": 1}))),
            make_stub("del-empty", "DELETE", None),
        ];
        let result = find_match(&stubs, &request("DELETE", Some("id=1"), b""));
        assert!(matches!(result, Err(SelectError::UnsupportedMethod)));
    }

    #[test]
    fn test_payloadless_other_method_matches() {
        let stubs = vec![make_stub("del", "DELETE", None)];
        let stub = find_match(&stubs, &request("DELETE", None, b"")).unwrap();
        assert_eq!(stub.name, "del");
    }

    #[test]
    fn test_method_class() {
        assert_eq!(MethodClass::of("POST"), MethodClass::Body);
        assert_eq!(MethodClass::of("PATCH"), MethodClass::Body);
        assert_eq!(MethodClass::of("GET"), MethodClass::Query);
        assert_eq!(MethodClass::of("OPTIONS"), MethodClass::Other);
        assert_eq!(MethodClass::of("post"), MethodClass::Other);
    }
}
