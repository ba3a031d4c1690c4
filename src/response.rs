//! Response rendering.
//!
//! Turns a selected stub's [`ResponseKind`] into exactly one status, content
//! type and body.

use crate::error::HandlerError;
use crate::stub::ResponseKind;
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

pub const APPLICATION_JSON: &str = "application/json";
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// A fully rendered response, ready to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub status: StatusCode,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl Rendered {
    /// Plain-text error body with the given status.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            content_type: TEXT_PLAIN.to_string(),
            body: message.into().into_bytes(),
        }
    }
}

/// Render a stub response declaration.
pub fn render(kind: &ResponseKind) -> Result<Rendered, HandlerError> {
    match kind {
        ResponseKind::Error { code, message } => Ok(Rendered::error(status(*code), message.clone())),
        ResponseKind::Empty { code, content_type } => Ok(Rendered {
            status: status(*code),
            content_type: content_type.clone(),
            body: Vec::new(),
        }),
        ResponseKind::Data(payload) => Ok(Rendered {
            status: StatusCode::OK,
            content_type: APPLICATION_JSON.to_string(),
            body: serde_json::to_vec(payload).map_err(HandlerError::Encode)?,
        }),
    }
}

// codes are range-checked at load time
fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for Rendered {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;

        let content_type = HeaderValue::from_str(&self.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, content_type);
        if self.content_type == TEXT_PLAIN {
            headers.insert(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            );
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_error() {
        let rendered = render(&ResponseKind::Error {
            code: 401,
            message: "not allowed".to_string(),
        })
        .unwrap();

        assert_eq!(rendered.status, StatusCode::UNAUTHORIZED);
        assert_eq!(rendered.content_type, TEXT_PLAIN);
        assert_eq!(rendered.body, b"not allowed");
    }

    #[test]
    fn test_render_empty() {
        let rendered = render(&ResponseKind::Empty {
            code: 201,
            content_type: "text/plain".to_string(),
        })
        .unwrap();

        assert_eq!(rendered.status, StatusCode::CREATED);
        assert_eq!(rendered.content_type, "text/plain");
        assert!(rendered.body.is_empty());
    }

    #[test]
    fn test_render_data_round_trips() {
        for payload in [
            json!([1, 2, 3]),
            json!({"id": 7, "name": "jane", "tags": ["a"]}),
            json!("plain"),
            json!(42),
            json!(null),
        ] {
            let rendered = render(&ResponseKind::Data(payload.clone())).unwrap();
            assert_eq!(rendered.status, StatusCode::OK);
            assert_eq!(rendered.content_type, APPLICATION_JSON);

            let decoded: serde_json::Value = serde_json::from_slice(&rendered.body).unwrap();
            assert_eq!(decoded, payload);
        }
    }

    #[test]
    fn test_render_array_body() {
        let rendered = render(&ResponseKind::Data(json!([1, 2, 3]))).unwrap();
        assert_eq!(rendered.body, b"[1,2,3]");
    }

    #[test]
    fn test_into_response_headers() {
        let response = Rendered::error(StatusCode::BAD_REQUEST, "invalid request").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], TEXT_PLAIN);
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");

        let response = render(&ResponseKind::Data(json!({})))
            .unwrap()
            .into_response();
        assert_eq!(response.headers()[header::CONTENT_TYPE], APPLICATION_JSON);
        assert!(response.headers().get(header::X_CONTENT_TYPE_OPTIONS).is_none());
    }
}
