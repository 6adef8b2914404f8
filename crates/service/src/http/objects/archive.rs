use std::path::Path;
use std::time::SystemTime;

use askama_axum::IntoResponse;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use axum::Json;
use httpdate::HttpDate;

use common::archive::{extract_to_workspace, list_entries, ArchiveEntry, Locator};

use super::{wants_json, ObjectError, ObjectRequest};
use crate::http::html::{encode_path, format_bytes, ArchiveItem, ArchiveTemplate};
use crate::ServiceState;

/// List the entries of a stored archive.
pub async fn browse(
    state: &ServiceState,
    object: &ObjectRequest,
    headers: &HeaderMap,
) -> Result<Response, ObjectError> {
    let archive_path = object.resolved.path.clone();
    let limits = state.config().archive_limits;
    let entries =
        tokio::task::spawn_blocking(move || list_entries(&archive_path, &limits)).await??;

    let archive_dir = object
        .resolved
        .path
        .parent()
        .unwrap_or_else(|| Path::new(""));
    let zip_href = encode_path(&object.path);
    let items: Vec<ArchiveItem> = entries
        .into_iter()
        .map(|entry| archive_item(entry, archive_dir, &zip_href))
        .collect();

    if wants_json(headers) {
        return Ok(Json(items).into_response());
    }

    let filename = object
        .resolved
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let template = ArchiveTemplate {
        host: object.host.clone(),
        filename,
        zip_path: object.path.clone(),
        download_href: format!("{}?d=true", zip_href),
        items,
    };
    Ok(template.into_response())
}

fn archive_item(entry: ArchiveEntry, archive_dir: &Path, zip_href: &str) -> ArchiveItem {
    let directory = entry
        .directory
        .strip_prefix(archive_dir)
        .map(|d| d.to_string_lossy().into_owned())
        .unwrap_or_default();
    let href = if entry.is_dir {
        String::new()
    } else {
        format!("{}?p={}", zip_href, entry.locator)
    };

    ArchiveItem {
        locator: entry.locator.as_str().to_string(),
        href,
        directory,
        is_dir: entry.is_dir,
        size: entry.size,
        size_formatted: format_bytes(entry.size),
        filename: entry.filename,
        name: entry.name,
    }
}

/// Unpack the archive into a scratch workspace and answer with one entry.
///
/// The workspace is dropped inside the blocking task, so nothing is left
/// under the scratch root once the entry bytes are in hand.
pub async fn serve_entry(
    state: &ServiceState,
    object: &ObjectRequest,
    token: &str,
    headers: &HeaderMap,
) -> Result<Response, ObjectError> {
    let locator = Locator::from_token(token);
    // reject garbage before paying for extraction
    locator.decode()?;

    let archive_path = object.resolved.path.clone();
    let scratch_root = state.scratch_root().to_path_buf();
    let limits = state.config().archive_limits;
    let served = tokio::task::spawn_blocking(move || {
        let workspace = extract_to_workspace(&archive_path, &scratch_root, &limits)?;
        workspace.serve_entry(&locator)
    })
    .await??;

    if let Some(modified) = served.last_modified {
        if not_modified_since(headers, modified) {
            let mut response = StatusCode::NOT_MODIFIED.into_response();
            response
                .headers_mut()
                .insert(header::LAST_MODIFIED, http_date(modified));
            return Ok(response);
        }
    }

    let content_type = HeaderValue::from_str(&served.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(common::sniff::OCTET_STREAM));
    let disposition = HeaderValue::from_str(&served.content_disposition())
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    let mut response = (StatusCode::OK, served.bytes).into_response();
    let response_headers = response.headers_mut();
    response_headers.insert(header::CONTENT_TYPE, content_type);
    response_headers.insert(header::CONTENT_DISPOSITION, disposition);
    if let Some(modified) = served.last_modified {
        response_headers.insert(header::LAST_MODIFIED, http_date(modified));
    }
    Ok(response)
}

fn http_date(time: SystemTime) -> HeaderValue {
    HeaderValue::from_str(&HttpDate::from(time).to_string())
        .unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// True when the client's `If-Modified-Since` is at or after `modified`,
/// compared at the one second resolution of HTTP dates.
fn not_modified_since(headers: &HeaderMap, modified: SystemTime) -> bool {
    headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<HttpDate>().ok())
        .map(|since| HttpDate::from(modified) <= since)
        .unwrap_or(false)
}
