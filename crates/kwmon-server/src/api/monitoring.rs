use axum::{
    extract::{Path, State},
    Extension, Json,
};
use kwmon_core::MonitoringDocument;
use kwmon_pipeline::{CollectionSummary, ReconcileOutcome};
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_pipeline_error, ApiError, ApiResponse, AppState, ResponseMeta};

const TRIGGER: &str = "api";

#[derive(Debug, Serialize)]
pub(super) struct CollectData {
    document: MonitoringDocument,
    summary: CollectionSummary,
}

#[derive(Debug, Serialize)]
pub(super) struct ReconcileData {
    document: MonitoringDocument,
    changed: bool,
    resolved: usize,
}

impl From<ReconcileOutcome> for ReconcileData {
    fn from(outcome: ReconcileOutcome) -> Self {
        Self {
            document: outcome.document,
            changed: outcome.changed,
            resolved: outcome.resolved,
        }
    }
}

pub(super) async fn get_document(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<MonitoringDocument>>, ApiError> {
    let document = state
        .service
        .document_for_user(user_id)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("no monitoring document for user {user_id}"),
            )
        })?;

    Ok(Json(ApiResponse {
        data: document,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn collect(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<CollectData>>, ApiError> {
    let report = state
        .service
        .collect_for_user(user_id, TRIGGER)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: CollectData {
            document: report.document,
            summary: report.summary,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn reconcile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReconcileData>>, ApiError> {
    let outcome = state
        .service
        .reconcile_for_user(user_id, TRIGGER)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: outcome.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
