// HTTP request handlers
use crate::application::loop_service::{LoopDraft, LoopUpdate};
use crate::domain::bump_test::{BumpTest, BumpTestId, Markers};
use crate::domain::error::TuningError;
use crate::domain::process_loop::{LoopId, ProcessLoop, ProcessType};
use crate::domain::trend::{ChartId, Sample, TrendChart};
use crate::domain::tuning::TuningMethod;
use crate::domain::tuning_record::TuningRecord;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

/// Maps engine errors onto HTTP status codes with a JSON body.
#[derive(Debug)]
pub struct ApiError(TuningError);

impl From<TuningError> for ApiError {
    fn from(error: TuningError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            TuningError::LoopNotFound(_)
            | TuningError::ChartNotFound(_)
            | TuningError::BumpTestNotFound(_)
            | TuningError::RecordNotFound(_) => StatusCode::NOT_FOUND,
            TuningError::InvalidRange { .. }
            | TuningError::InvalidWindow { .. }
            | TuningError::InvalidLambda(_) => StatusCode::BAD_REQUEST,
            TuningError::MalformedSeries(_) => StatusCode::UNPROCESSABLE_ENTITY,
            TuningError::Repository(_) => {
                tracing::error!("Repository failure: {:#}", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Deserialize)]
pub struct ProcessTypeRequest {
    pub process_type: ProcessType,
}

#[derive(Deserialize)]
pub struct ChartRequest {
    pub description: Option<String>,
    pub samples: Vec<Sample>,
}

#[derive(Deserialize)]
pub struct BumpWindowRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct LambdaRequest {
    pub lambda_value: f64,
}

#[derive(Deserialize)]
pub struct MethodRequest {
    pub method: TuningMethod,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_loops(State(state): State<Arc<AppState>>) -> ApiResult<Vec<ProcessLoop>> {
    Ok(Json(state.loop_service.list_loops().await?))
}

pub async fn create_loop(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<LoopDraft>,
) -> Result<(StatusCode, Json<ProcessLoop>), ApiError> {
    let process_loop = state.loop_service.create_loop(draft).await?;
    Ok((StatusCode::CREATED, Json(process_loop)))
}

pub async fn get_loop(
    Path(id): Path<LoopId>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<ProcessLoop> {
    Ok(Json(state.loop_service.get_loop(id).await?))
}

pub async fn update_loop(
    Path(id): Path<LoopId>,
    State(state): State<Arc<AppState>>,
    Json(update): Json<LoopUpdate>,
) -> ApiResult<ProcessLoop> {
    Ok(Json(state.loop_service.update_loop(id, update).await?))
}

pub async fn delete_loop(
    Path(id): Path<LoopId>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    state.loop_service.delete_loop(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_process_type(
    Path(id): Path<LoopId>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProcessTypeRequest>,
) -> ApiResult<ProcessLoop> {
    Ok(Json(
        state
            .loop_service
            .set_process_type(id, request.process_type)
            .await?,
    ))
}

pub async fn adopt_tuning(
    Path(id): Path<LoopId>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<ProcessLoop> {
    Ok(Json(state.loop_service.adopt_tuning(id).await?))
}

pub async fn list_charts(
    Path(loop_id): Path<LoopId>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<TrendChart>> {
    Ok(Json(state.trend_service.list_charts(loop_id).await?))
}

/// Store an already cleaned recording (UTC, sorted, gap-free)
pub async fn create_chart(
    Path(loop_id): Path<LoopId>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChartRequest>,
) -> Result<(StatusCode, Json<TrendChart>), ApiError> {
    let chart = state
        .trend_service
        .create_chart(loop_id, request.description, request.samples)
        .await?;
    Ok((StatusCode::CREATED, Json(chart)))
}

pub async fn delete_chart(
    Path(id): Path<ChartId>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    state.trend_service.delete_chart(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_bump_tests(
    Path(chart_id): Path<ChartId>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<BumpTest>> {
    Ok(Json(state.trend_service.list_bump_tests(chart_id).await?))
}

pub async fn create_bump_test(
    Path(chart_id): Path<ChartId>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<BumpWindowRequest>,
) -> Result<(StatusCode, Json<BumpTest>), ApiError> {
    let test = state
        .trend_service
        .create_bump_test(chart_id, request.start_time, request.end_time)
        .await?;
    Ok((StatusCode::CREATED, Json(test)))
}

pub async fn get_bump_test(
    Path(id): Path<BumpTestId>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<BumpTest> {
    Ok(Json(state.trend_service.get_bump_test(id).await?))
}

pub async fn delete_bump_test(
    Path(id): Path<BumpTestId>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    state.trend_service.delete_bump_test(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Set any subset of T1..T4 and TCV; omitted markers are unchanged
pub async fn set_markers(
    Path(id): Path<BumpTestId>,
    State(state): State<Arc<AppState>>,
    Json(markers): Json<Markers>,
) -> ApiResult<BumpTest> {
    Ok(Json(state.trend_service.set_markers(id, markers).await?))
}

pub async fn get_tuning(
    Path(loop_id): Path<LoopId>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<TuningRecord> {
    Ok(Json(state.tuning_service.get_record(loop_id).await?))
}

pub async fn set_lambda(
    Path(loop_id): Path<LoopId>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<LambdaRequest>,
) -> ApiResult<TuningRecord> {
    Ok(Json(
        state
            .tuning_service
            .set_lambda(loop_id, request.lambda_value)
            .await?,
    ))
}

pub async fn set_method(
    Path(loop_id): Path<LoopId>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<MethodRequest>,
) -> ApiResult<TuningRecord> {
    Ok(Json(
        state
            .tuning_service
            .set_method(loop_id, request.method)
            .await?,
    ))
}

pub async fn add_tuning_bump_test(
    Path((loop_id, test_id)): Path<(LoopId, BumpTestId)>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<TuningRecord> {
    Ok(Json(
        state
            .tuning_service
            .add_bump_test(loop_id, test_id)
            .await?,
    ))
}

pub async fn remove_tuning_bump_test(
    Path((loop_id, test_id)): Path<(LoopId, BumpTestId)>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<TuningRecord> {
    Ok(Json(
        state
            .tuning_service
            .remove_bump_test(loop_id, test_id)
            .await?,
    ))
}

pub async fn recompute(
    Path(loop_id): Path<LoopId>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<TuningRecord> {
    Ok(Json(state.tuning_service.recompute(loop_id).await?))
}
