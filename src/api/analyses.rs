use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::{AnalysisRecordDto, ApiError, AppState, RunAnalysisRequest};
use crate::api::validation::{validate_query, validate_record_id, validate_target};
use crate::services::AnalysisRequest;

/// Runs the full analysis pipeline. A body with an `id` regenerates that
/// record in place; without one a new record is inserted.
pub async fn run_analysis(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RunAnalysisRequest>,
) -> Result<Json<AnalysisRecordDto>, ApiError> {
    let query = validate_query(&request.query)?.to_string();
    let target = validate_target(&request.target_client)?.to_string();

    let request = match request.id {
        Some(id) => AnalysisRequest::Regenerate {
            id: validate_record_id(id)?,
            query,
            target,
        },
        None => AnalysisRequest::New { query, target },
    };

    let record = state.analysis().run(request).await?;

    Ok(Json(record.into()))
}

pub async fn list_analyses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AnalysisRecordDto>>, ApiError> {
    let records = state.store().list_analyses().await?;

    Ok(Json(records.into_iter().map(Into::into).collect()))
}

pub async fn get_analysis(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<AnalysisRecordDto>, ApiError> {
    let id = validate_record_id(id)?;

    let record = state
        .store()
        .find_analysis(id)
        .await?
        .ok_or_else(|| ApiError::analysis_not_found(id))?;

    Ok(Json(record.into()))
}
