use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::Serialize;

use common::archive::ArchiveLimits;

use crate::version::{build_info, BuildInfo};
use crate::ServiceState;

/// Build metadata plus the limits a client has to stay within.
#[derive(Debug, Serialize)]
struct VersionReport {
    #[serde(flatten)]
    build: BuildInfo,
    max_upload_bytes: usize,
    archive_limits: ArchiveLimits,
}

#[tracing::instrument(skip_all)]
pub async fn handler(State(state): State<ServiceState>) -> Response {
    let config = state.config();
    let report = VersionReport {
        build: build_info(),
        max_upload_bytes: config.max_upload_bytes,
        archive_limits: config.archive_limits,
    };
    (StatusCode::OK, Json(report)).into_response()
}
