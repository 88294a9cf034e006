use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::metadata::ScoreMetadata;
use crate::registry::ScoreId;
use crate::service::{CalculatorStatus, ScoreService, ServiceError};

/// Router exposing discovery, reload and calculation endpoints under `/api`.
///
/// Every built-in score also gets a dedicated `POST /api/{score_id}` route next to the generic
/// `POST /api/{score_id}/calculate`.
pub fn score_router(service: Arc<ScoreService>) -> Router {
    let mut router = Router::new()
        .route("/api/scores", get(list_handler))
        .route("/api/scores/:score_id", get(metadata_handler))
        .route("/api/scores/:score_id/validate", get(validate_handler))
        .route("/api/categories", get(categories_handler))
        .route("/api/reload", post(reload_handler))
        .route("/api/:score_id/calculate", post(calculate_handler));

    for score_id in ScoreId::ALL {
        router = router.route(
            &format!("/api/{}", score_id.as_str()),
            post(
                move |State(service): State<Arc<ScoreService>>,
                      payload: Result<Json<Value>, JsonRejection>| {
                    dedicated_handler(score_id, service, payload)
                },
            ),
        );
    }

    router.with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    category: Option<String>,
    search: Option<String>,
}

pub(crate) async fn list_handler(
    State(service): State<Arc<ScoreService>>,
    Query(query): Query<ListQuery>,
) -> Json<Value> {
    let category = query.category.as_deref().filter(|value| !value.trim().is_empty());
    let search = query.search.as_deref().filter(|value| !value.trim().is_empty());
    let scores = service.list(category, search);
    Json(json!({
        "total": scores.len(),
        "scores": scores,
    }))
}

pub(crate) async fn metadata_handler(
    State(service): State<Arc<ScoreService>>,
    Path(score_id): Path<String>,
) -> Result<Json<ScoreMetadata>, ServiceError> {
    service.metadata(&score_id).map(Json)
}

pub(crate) async fn validate_handler(
    State(service): State<Arc<ScoreService>>,
    Path(score_id): Path<String>,
) -> Result<Json<CalculatorStatus>, ServiceError> {
    service.validate_calculator(&score_id).map(Json)
}

pub(crate) async fn categories_handler(State(service): State<Arc<ScoreService>>) -> Json<Value> {
    let counts = service.categories();
    let categories: Vec<&String> = counts.keys().collect();
    Json(json!({
        "categories": categories,
        "total": categories.len(),
        "specialty_count": counts,
    }))
}

pub(crate) async fn reload_handler(
    State(service): State<Arc<ScoreService>>,
) -> Result<Json<Value>, ServiceError> {
    let report = service.reload()?;
    info!(
        scores = report.summary.scores.len(),
        skipped = report.summary.skipped_files.len(),
        calculators = report.calculators_registered,
        "reload requested over http"
    );
    Ok(Json(json!({
        "status": "success",
        "message": "Scores and calculators reloaded successfully",
        "scores_loaded": report.summary.scores.len(),
        "timestamp": Utc::now().to_rfc3339(),
        "details": report,
    })))
}

pub(crate) async fn calculate_handler(
    State(service): State<Arc<ScoreService>>,
    Path(score_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ServiceError> {
    let params = request_params(payload)?;
    service.calculate(&score_id, params).map(Json)
}

async fn dedicated_handler(
    score_id: ScoreId,
    service: Arc<ScoreService>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ServiceError> {
    let params = request_params(payload)?;
    service.calculate(score_id.as_str(), params).map(Json)
}

fn request_params(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ServiceError> {
    match payload {
        Ok(Json(value @ Value::Object(_))) => Ok(value),
        Ok(Json(other)) => Err(ServiceError::MalformedBody(format!(
            "expected a JSON object of parameters, found {}",
            json_kind(&other)
        ))),
        Err(rejection) => Err(ServiceError::MalformedBody(rejection.body_text())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
