//! Stuber: a configurable HTTP stub server
//!
//! Reads JSON fixture files from a data directory, binds one route per
//! file, and answers each request with the first stub whose method and
//! payload match it.
//!
//! # Features
//!
//! - **Body Matching**: POST/PUT/PATCH bodies compared as canonical JSON
//!   (key order and whitespace do not matter)
//! - **Query Matching**: GET/HEAD query strings compared against the stub
//!   payload, parameter order ignored
//! - **Canned Responses**: JSON payloads, plain-text errors, or empty
//!   bodies with a chosen status and content type
//! - **First Match Wins**: stubs are tried in file order
//! - **HTTPS**: optional TLS listener next to plain HTTP
//!
//! # Example Fixture
//!
//! ```json
//! {
//!   "route": "/api/users",
//!   "stubs": [
//!     {
//!       "name": "page-2",
//!       "request": { "method": "GET", "payload": { "page": 2 } },
//!       "response": { "type": "data.array", "payload": [{ "id": 7 }] }
//!     },
//!     {
//!       "name": "create",
//!       "request": { "method": "POST", "payload": { "name": "jane" } },
//!       "response": { "type": "data.empty", "payload": { "code": 201, "content-type": "text/plain" } }
//!     },
//!     {
//!       "name": "remove",
//!       "request": { "method": "DELETE" },
//!       "response": { "type": "error", "payload": { "code": 401, "message": "not allowed" } }
//!     }
//!   ]
//! }
//! ```

pub mod canonical;
pub mod config;
pub mod error;
pub mod matcher;
pub mod query;
pub mod response;
pub mod routes;
pub mod server;
pub mod stub;

pub use config::ServerConfig;
pub use error::{HandlerError, LoadError, SelectError};
pub use routes::RouteTable;
pub use server::StubServer;
pub use stub::{ResponseKind, StubDefinition, StubFile};
