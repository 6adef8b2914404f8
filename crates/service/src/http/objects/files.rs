use askama_axum::IntoResponse;
use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use common::store::StoreError;

use super::{wants_json, ObjectError, ObjectRequest};
use crate::http::handlers::not_found_response;
use crate::http::html::{child_href, encode_path, format_bytes, DirectoryItem, DirectoryTemplate};
use crate::ServiceState;

/// Serve a stored object, or list it when it is a directory.
pub async fn serve(
    state: &ServiceState,
    object: ObjectRequest,
    request: Request,
) -> Result<Response, ObjectError> {
    let path = &object.resolved.path;
    let meta = match state.store().stat(path).await {
        Ok(meta) => meta,
        Err(StoreError::NotFound(_)) => {
            return Ok(not_found_response(request.headers(), "File not found"))
        }
        Err(e) => return Err(e.into()),
    };

    if meta.is_dir {
        return list_directory(state, &object, request).await;
    }

    let response = match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response,
        Err(infallible) => match infallible {},
    };
    Ok(response.map(Body::new))
}

async fn list_directory(
    state: &ServiceState,
    object: &ObjectRequest,
    request: Request,
) -> Result<Response, ObjectError> {
    let entries = state.store().list_dir(&object.resolved.path).await?;

    if wants_json(request.headers()) {
        return Ok(Json(entries).into_response());
    }

    let parent_href = if object.path == "/" {
        None
    } else {
        let trimmed = object.path.trim_end_matches('/');
        let parent = match trimmed.rfind('/') {
            Some(0) | None => "/",
            Some(idx) => &trimmed[..=idx],
        };
        Some(encode_path(parent))
    };

    let items = entries
        .into_iter()
        .map(|entry| DirectoryItem {
            href: child_href(&object.path, &entry.name, entry.is_dir),
            size_formatted: format_bytes(entry.size),
            is_dir: entry.is_dir,
            name: entry.name,
        })
        .collect();

    let template = DirectoryTemplate {
        host: object.host.clone(),
        path: object.path.clone(),
        parent_href,
        items,
    };
    Ok(template.into_response())
}

/// Create or overwrite the object from the request body.
pub async fn put(
    state: &ServiceState,
    object: ObjectRequest,
    request: Request,
) -> Result<Response, ObjectError> {
    let body = request.into_body().into_data_stream();
    let written = state.store().create(&object.resolved.path, body).await?;

    tracing::info!(
        bucket = %object.resolved.bucket,
        path = %object.path,
        bytes = written,
        "object written"
    );
    Ok(StatusCode::CREATED.into_response())
}

pub async fn delete(state: &ServiceState, object: ObjectRequest) -> Result<Response, ObjectError> {
    state.store().remove(&object.resolved.path).await?;

    tracing::info!(
        bucket = %object.resolved.bucket,
        path = %object.path,
        "object deleted"
    );
    Ok(StatusCode::NO_CONTENT.into_response())
}
