//! The object endpoint
//!
//! One handler serves every path. The tenant comes from the `Host` header,
//! the method picks the operation, and GETs on `.zip` objects are diverted
//! into archive browsing:
//!
//! | method       | target                  | action                           |
//! |--------------|-------------------------|----------------------------------|
//! | GET / HEAD   | file or directory       | serve bytes / list directory     |
//! | GET / HEAD   | `.zip`, no query        | list archive entries             |
//! | GET / HEAD   | `.zip?p=<locator>`      | extract and serve one entry      |
//! | GET / HEAD   | `.zip?d=true`           | serve the archive itself         |
//! | PUT / POST   | any                     | create or overwrite, 201         |
//! | DELETE       | any                     | remove, 204 or 404               |
//! | other        |                         | 405                              |

use axum::extract::{Path, Query, Request, State};
use axum::http::{header, HeaderMap, Method};
use axum::response::Response;
use serde::Deserialize;

use common::bucket::Resolved;

use crate::ServiceState;

mod archive;
mod error;
mod files;

pub use error::ObjectError;

#[derive(Debug, Default, Deserialize)]
pub struct ObjectQuery {
    /// `true` downloads a `.zip` instead of browsing it
    #[serde(default)]
    pub d: Option<String>,
    /// Locator of a single entry inside a `.zip`
    #[serde(default)]
    pub p: Option<String>,
}

impl ObjectQuery {
    pub fn download(&self) -> bool {
        self.d.as_deref() == Some("true")
    }

    pub fn locator(&self) -> Option<&str> {
        self.p.as_deref().filter(|p| !p.is_empty())
    }
}

/// Everything a verb handler needs about the incoming request.
pub(crate) struct ObjectRequest {
    pub host: String,
    /// Decoded request path, always starting with `/`
    pub path: String,
    pub resolved: Resolved,
    pub query: ObjectQuery,
}

/// Handler for `/`
pub async fn root_handler(
    state: State<ServiceState>,
    query: Query<ObjectQuery>,
    request: Request,
) -> Result<Response, ObjectError> {
    dispatch(state, "/".to_string(), query, request).await
}

/// Handler for `/*path`
pub async fn handler(
    state: State<ServiceState>,
    Path(path): Path<String>,
    query: Query<ObjectQuery>,
    request: Request,
) -> Result<Response, ObjectError> {
    dispatch(state, format!("/{}", path), query, request).await
}

async fn dispatch(
    State(state): State<ServiceState>,
    path: String,
    Query(query): Query<ObjectQuery>,
    request: Request,
) -> Result<Response, ObjectError> {
    let host = request_host(request.headers(), request.uri());
    let resolved = state.resolver().resolve(&host, &path)?;

    tracing::debug!(
        method = %request.method(),
        host = %host,
        bucket = %resolved.bucket,
        path = %path,
        filename = %resolved.path.display(),
        "request"
    );

    let object = ObjectRequest {
        host,
        path,
        resolved,
        query,
    };

    match request.method().clone() {
        Method::GET | Method::HEAD => get(&state, object, request).await,
        Method::PUT | Method::POST => files::put(&state, object, request).await,
        Method::DELETE => files::delete(&state, object).await,
        method => Err(ObjectError::MethodNotAllowed(method)),
    }
}

async fn get(
    state: &ServiceState,
    object: ObjectRequest,
    request: Request,
) -> Result<Response, ObjectError> {
    // missing archives and directories named `*.zip` take the plain path
    if object.resolved.is_zip() && object.resolved.path.is_file() {
        if let Some(token) = object.query.locator() {
            let token = token.to_string();
            return archive::serve_entry(state, &object, &token, request.headers()).await;
        }
        if !object.query.download() {
            return archive::browse(state, &object, request.headers()).await;
        }
    }
    files::serve(state, object, request).await
}

/// Host the client addressed: the `Host` header, or the URI authority for
/// HTTP/2 requests that carry none.
fn request_host(headers: &HeaderMap, uri: &axum::http::Uri) -> String {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|a| a.to_string()))
        .unwrap_or_default()
}

/// Whether the client prefers a JSON body.
pub(crate) fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("application/json"))
        .unwrap_or(false)
}
