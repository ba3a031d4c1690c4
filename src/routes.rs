//! Route table and per-request stub handler.
//!
//! The table is built once from a data directory and never mutated. Each
//! request re-reads its fixture file so the handler holds no cached stub
//! state; fixtures are small and read-only at runtime.

use crate::error::{HandlerError, LoadError, SelectError};
use crate::matcher::{self, LiveRequest};
use crate::response::{self, Rendered};
use crate::stub::StubFile;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Immutable mapping from route pattern to the fixture file serving it.
///
/// Patterns match a request path exactly; patterns ending in `/` also match
/// every path below them, the longest such pattern winning.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: BTreeMap<String, PathBuf>,
}

impl RouteTable {
    /// Scan `dir` for fixture files and bind each declared route.
    ///
    /// Subdirectories and files without a `.json` extension are ignored.
    /// Files are processed in name order so a duplicate is always reported
    /// against the same file.
    pub fn build(dir: &Path) -> Result<Self, LoadError> {
        debug!(dir = %dir.display(), "Processing fixture files");

        let io_err = |source: std::io::Error| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            if entry.file_type().map_err(io_err)?.is_dir() {
                continue;
            }
            let path = entry.path();
            if !is_json(&path) {
                continue;
            }
            files.push(path);
        }
        files.sort();

        let mut table = Self::default();
        for path in files {
            debug!(file = %path.display(), "Processing file");
            let fixture = StubFile::load(&path)?;
            table.bind(fixture.route, path)?;
        }

        info!(routes = table.len(), dir = %dir.display(), "Route table built");
        Ok(table)
    }

    /// Bind `route` to `file`, refusing to overwrite an existing binding.
    pub fn bind(&mut self, route: String, file: PathBuf) -> Result<(), LoadError> {
        if let Some(existing) = self.routes.get(&route) {
            error!(route = %route, file = %file.display(), "Duplicate route");
            return Err(LoadError::DuplicateRoute {
                route,
                path: file,
                existing: existing.clone(),
            });
        }
        debug!(route = %route, file = %file.display(), "Adding handler for route");
        self.routes.insert(route, file);
        Ok(())
    }

    /// Fixture file serving `path`, if any.
    pub fn lookup(&self, path: &str) -> Option<&Path> {
        if let Some(file) = self.routes.get(path) {
            return Some(file.as_path());
        }
        self.routes
            .iter()
            .filter(|(pattern, _)| pattern.ends_with('/') && path.starts_with(pattern.as_str()))
            .max_by_key(|(pattern, _)| pattern.len())
            .map(|(_, file)| file.as_path())
    }

    /// Redirect target for `path` when only its subtree form `path/` is
    /// bound. The query, if any, is carried over.
    pub fn redirect(&self, path: &str, query: Option<&str>) -> Option<String> {
        if path.ends_with('/') || self.lookup(path).is_some() {
            return None;
        }
        let target = format!("{}/", path);
        if !self.routes.contains_key(&target) {
            return None;
        }
        Some(match query {
            Some(q) => format!("{}?{}", target, q),
            None => target,
        })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Bound routes with their fixture files.
    pub fn routes(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.routes.iter().map(|(r, f)| (r.as_str(), f.as_path()))
    }

    /// Wrap the table in an axum router.
    pub fn into_router(self, body_limit: usize) -> Router {
        let state = Arc::new(AppState {
            routes: self,
            body_limit,
        });
        Router::new()
            .fallback(serve_stub)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// State shared by every request.
#[derive(Debug)]
struct AppState {
    routes: RouteTable,
    body_limit: usize,
}

async fn serve_stub(State(state): State<Arc<AppState>>, request: Request<Body>) -> Response {
    let uri = request.uri();
    let Some(file) = state.routes.lookup(uri.path()) else {
        if let Some(location) = state.routes.redirect(uri.path(), uri.query()) {
            debug!(path = %uri.path(), location = %location, "Redirecting to subtree route");
            return (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)])
                .into_response();
        }
        return Rendered::error(StatusCode::NOT_FOUND, "404 page not found").into_response();
    };
    let file = file.to_path_buf();
    respond(&file, state.body_limit, request).await.into_response()
}

async fn respond(file: &Path, body_limit: usize, request: Request<Body>) -> Rendered {
    let fixture = match read_fixture(file).await {
        Ok(fixture) => fixture,
        Err(e) => return handler_error(e),
    };

    let (parts, body) = request.into_parts();
    let method = parts.method.as_str();

    // method filter runs before the body is consumed
    let candidates = matcher::candidates(&fixture.stubs, method);
    if candidates.is_empty() {
        return select_error(method, parts.uri.path(), SelectError::MethodNotAllowed);
    }

    let body = match axum::body::to_bytes(body, body_limit).await {
        Ok(bytes) => bytes,
        Err(e) => return handler_error(HandlerError::Body(e.to_string())),
    };

    let live = LiveRequest {
        method,
        query: parts.uri.query(),
        body: &body,
    };

    let stub = match matcher::select(&candidates, &live) {
        Ok(stub) => stub,
        Err(e) => return select_error(method, parts.uri.path(), e),
    };

    debug!(stub = %stub.name, "Responding for payload set");
    response::render(&stub.response).unwrap_or_else(handler_error)
}

async fn read_fixture(file: &Path) -> Result<StubFile, HandlerError> {
    let content = tokio::fs::read(file)
        .await
        .map_err(|source| HandlerError::Fixture {
            path: file.to_path_buf(),
            source,
        })?;
    StubFile::from_slice(&content).map_err(|source| HandlerError::FixtureParse {
        path: file.to_path_buf(),
        source,
    })
}

fn select_error(method: &str, path: &str, e: SelectError) -> Rendered {
    let status = e.status();
    if status.is_server_error() {
        error!(method = %method, path = %path, error = %e, "Stub selection failed");
    } else {
        warn!(method = %method, path = %path, error = %e, "Request rejected");
    }
    Rendered::error(status, e.to_string())
}

fn handler_error(e: HandlerError) -> Rendered {
    let status = e.status();
    if status.is_server_error() {
        error!(error = %e, "Request failed");
    } else {
        warn!(error = %e, "Request rejected");
    }
    Rendered::error(status, e.to_string())
}
