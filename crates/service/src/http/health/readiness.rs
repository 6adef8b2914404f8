use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::time::Duration;
use tokio::time::timeout;

use super::data_source::*;

const READINESS_TIMEOUT: Duration = Duration::from_secs(5);

/// 200 while both roots are usable, 503 naming the failed root otherwise.
#[tracing::instrument]
pub async fn handler(data_src: StateDataSource) -> Response {
    let failure = match timeout(READINESS_TIMEOUT, data_src.is_ready()).await {
        Ok(Ok(())) => {
            let msg = serde_json::json!({"status": "ok"});
            return (StatusCode::OK, Json(msg)).into_response();
        }
        Ok(Err(e)) => {
            tracing::warn!(root = e.role(), error = %e, "gateway not ready");
            serde_json::json!({
                "status": "failure",
                "root": e.role(),
                "message": e.to_string(),
            })
        }
        Err(_) => {
            tracing::warn!(timeout = ?READINESS_TIMEOUT, "readiness check timed out");
            serde_json::json!({
                "status": "failure",
                "message": "filesystem check timed out",
            })
        }
    };
    (StatusCode::SERVICE_UNAVAILABLE, Json(failure)).into_response()
}
