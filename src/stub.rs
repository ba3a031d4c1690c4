//! Fixture data model.
//!
//! A fixture file declares one route and an ordered list of stubs. Shapes
//! are checked once when the file is parsed; response kinds are resolved
//! into [`ResponseKind`] up front so request handling never inspects raw
//! JSON to decide how to answer.

use crate::error::LoadError;
use axum::http::HeaderValue;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::Path;

/// One fixture document: a route plus its candidate stubs, in file order.
#[derive(Debug, Clone, Deserialize)]
pub struct StubFile {
    /// URL path the stubs are served on
    #[serde(default)]
    pub route: String,

    /// Candidate stubs, evaluated first to last
    #[serde(default)]
    pub stubs: Vec<StubDefinition>,
}

impl StubFile {
    /// Parse a fixture document from raw bytes.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Read, parse and validate a fixture file from disk.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file = Self::from_slice(&content).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        file.validate().map_err(|e| LoadError::Invalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(file)
    }

    /// Validate the fixture.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.route.is_empty() {
            anyhow::bail!("invalid route: route cannot be empty");
        }
        if !self.route.starts_with('/') {
            anyhow::bail!("invalid route {}: must start with '/'", self.route);
        }
        for (i, stub) in self.stubs.iter().enumerate() {
            stub.validate()
                .map_err(|e| anyhow::anyhow!("stub {} ({}): {}", i, stub.name, e))?;
        }
        Ok(())
    }
}

/// A single candidate rule.
#[derive(Debug, Clone, Deserialize)]
pub struct StubDefinition {
    /// Identifier used only in diagnostics
    #[serde(default)]
    pub name: String,

    /// Request the stub answers
    pub request: RequestSpec,

    /// Canned response
    pub response: ResponseKind,
}

impl StubDefinition {
    /// Validate the stub definition.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.request.method.is_empty() {
            anyhow::bail!("request method cannot be empty");
        }
        self.response.validate()
    }
}

/// Request side of a stub.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestSpec {
    /// HTTP method, compared case-sensitively
    #[serde(default)]
    pub method: String,

    /// Expected body (or query projection). `None` only when the key is
    /// absent; an explicit `null` is a declared payload.
    #[serde(default, deserialize_with = "present")]
    pub payload: Option<Value>,
}

impl RequestSpec {
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Response side of a stub, resolved at parse time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawResponse")]
pub enum ResponseKind {
    /// Payload returned as JSON with status 200
    Data(Value),
    /// Plain-text error body with the given status
    Error { code: u16, message: String },
    /// Status and content type only, empty body
    Empty { code: u16, content_type: String },
}

impl ResponseKind {
    /// Validate the response declaration.
    pub fn validate(&self) -> anyhow::Result<()> {
        match self {
            ResponseKind::Data(_) => Ok(()),
            ResponseKind::Error { code, .. } => validate_code(*code),
            ResponseKind::Empty { code, content_type } => {
                validate_code(*code)?;
                if content_type.is_empty() {
                    anyhow::bail!("data.empty response requires a content-type");
                }
                HeaderValue::from_str(content_type)
                    .map_err(|_| anyhow::anyhow!("invalid content-type: {:?}", content_type))?;
                Ok(())
            }
        }
    }
}

// 1xx codes are interim and cannot carry the stub's response
fn validate_code(code: u16) -> anyhow::Result<()> {
    if !(200..=599).contains(&code) {
        anyhow::bail!("invalid status code: {}", code);
    }
    Ok(())
}

/// Wire shape of a response before its kind is resolved.
#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(rename = "type", default)]
    kind: Option<String>,

    #[serde(default)]
    payload: Value,
}

impl TryFrom<RawResponse> for ResponseKind {
    type Error = String;

    fn try_from(raw: RawResponse) -> Result<Self, String> {
        match raw.kind.as_deref() {
            Some("error") => Ok(ResponseKind::Error {
                code: status_field(&raw.payload)?,
                message: string_field(&raw.payload, "message").unwrap_or_default(),
            }),
            Some("data.empty") => Ok(ResponseKind::Empty {
                code: status_field(&raw.payload)?,
                content_type: string_field(&raw.payload, "content-type").unwrap_or_default(),
            }),
            _ => Ok(ResponseKind::Data(raw.payload)),
        }
    }
}

fn status_field(payload: &Value) -> Result<u16, String> {
    let code = payload
        .get("code")
        .ok_or_else(|| "response payload is missing \"code\"".to_string())?;
    code.as_u64()
        .and_then(|c| u16::try_from(c).ok())
        .ok_or_else(|| format!("response code {} is not a status code", code))
}

fn string_field(payload: &Value, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(str::to_string)
}
