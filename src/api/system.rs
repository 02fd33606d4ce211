use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, AppState, HealthStatus};

pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthStatus>, ApiError> {
    state.store().ping().await?;

    Ok(Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        database: "ok",
    }))
}
