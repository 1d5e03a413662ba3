use axum::{Json, extract::State};
use serde_json::json;
use tokio::time::{Duration, timeout};

use crate::SharedState;
use crate::error::ApiError;

const READINESS_TIMEOUT: Duration = Duration::from_secs(1);

pub async fn livez() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn readyz(State(state): State<SharedState>) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.is_ready() {
        return Err(ApiError::NotReady("shutting_down".into()));
    }

    let candidates = timeout(
        READINESS_TIMEOUT,
        state.with_service(|service| Ok(service.store().count()?)),
    )
    .await
    .map_err(|_| ApiError::NotReady("store_timeout".into()))
    .and_then(|result| {
        result.map_err(|err| ApiError::NotReady(format!("store check failed: {err}")))
    })?;

    Ok(Json(json!({
        "status": "ok",
        "store": "ok",
        "candidates": candidates,
        "application": env!("CARGO_PKG_NAME"),
    })))
}
