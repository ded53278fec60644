//! Review workflow API.
//!
//! | Endpoint | Operation |
//! |----------|-----------|
//! | `POST /api/review/start` | multipart `title` + `file` → analyse and ingest |
//! | `POST /api/review/project/score` | `{projectId, humanScore, scoredBy?}` |
//! | `POST /api/reviews/{id}/submit` | complete a fully scored review |
//! | `GET /api/reviews` | all reviews, newest first |
//! | `GET /api/reviews/completed` | completed reviews with projects |
//! | `GET /api/reviews/{id}` | one review with projects |
//!
//! Errors are `{"error": "<message>"}` with the status from
//! [`ReviewError::status_code`]. Bodies and path ids that fail to parse are
//! answered the same way with 400, never with axum's plain-text rejection.
//!
//! Uploaded spreadsheets are kept only while the analysis runs.

use super::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::ReviewError;
use crate::review::ReviewSession;

fn api_error(e: ReviewError) -> Response {
    let status = e.status_code();
    if status.is_server_error() {
        error!(error = %e, "review request failed");
    } else {
        warn!(error = %e, "review request rejected");
    }
    (status, Json(serde_json::json!({"error": e.to_string()}))).into_response()
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"error": message})),
    )
        .into_response()
}

/// Keep only the final path component of a client-supplied file name.
fn upload_file_name(client_name: Option<&str>) -> String {
    client_name
        .and_then(|n| std::path::Path::new(n).file_name())
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("upload.xlsx")
        .to_string()
}

pub(super) async fn handler_api_review_start(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Response {
    let mut title: Option<String> = None;
    let mut upload: Option<(String, axum::body::Bytes)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return bad_request(&format!("Malformed upload: {}", e)),
        };
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("title") => match field.text().await {
                Ok(t) => title = Some(t),
                Err(e) => return bad_request(&format!("Malformed title: {}", e)),
            },
            Some("file") => {
                let file_name = upload_file_name(field.file_name());
                match field.bytes().await {
                    Ok(data) => upload = Some((file_name, data)),
                    Err(e) => return bad_request(&format!("Malformed file: {}", e)),
                }
            }
            _ => {}
        }
    }

    let (title, (file_name, data)) = match (title, upload) {
        (Some(t), Some(u)) if !t.trim().is_empty() => (t, u),
        _ => return bad_request("File and title are required"),
    };

    let artifact: PathBuf = state
        .upload_dir
        .join(format!("{}-{}", Uuid::new_v4(), file_name));
    if let Err(e) = tokio::fs::create_dir_all(&state.upload_dir).await {
        return api_error(ReviewError::Persistence(format!(
            "cannot create upload directory: {}",
            e
        )));
    }
    if let Err(e) = tokio::fs::write(&artifact, &data).await {
        return api_error(ReviewError::Persistence(format!(
            "cannot store upload: {}",
            e
        )));
    }
    info!(title = %title, artifact = %artifact.display(), bytes = data.len(), "upload stored");

    let mut session = ReviewSession::new();
    let result = state
        .controller
        .start_review(&mut session, &title, &artifact)
        .await;
    if let Err(e) = tokio::fs::remove_file(&artifact).await {
        warn!(artifact = %artifact.display(), error = %e, "failed to remove upload");
    }
    let review_created = match &result {
        Ok(_) => true,
        Err(e) => e.review_id().is_some(),
    };
    if review_created {
        state.prom_metrics.reviews_started.inc();
    }

    match result {
        Ok(review) => Json(serde_json::json!({
            "reviewId": review.review.id,
            "projects": review.projects,
        }))
        .into_response(),
        Err(e) => {
            match &e {
                ReviewError::AnalysisFailed { .. } => state.prom_metrics.record_failure("analysis"),
                ReviewError::IngestionFailed { .. } => {
                    state.prom_metrics.record_failure("ingestion")
                }
                _ => {}
            }
            api_error(e)
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ScorePayload {
    pub project_id: Option<Uuid>,
    pub human_score: Option<i32>,
    pub scored_by: Option<String>,
}

pub(super) async fn handler_api_project_score(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ScorePayload>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(p)) => p,
        Err(e) => {
            warn!(error = %e, "malformed score payload");
            return bad_request("Invalid project ID or score");
        }
    };
    let (project_id, human_score) = match (payload.project_id, payload.human_score) {
        (Some(id), Some(score)) => (id, score),
        _ => return bad_request("Invalid project ID or score"),
    };
    let scored_by = payload
        .scored_by
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match state
        .controller
        .score_project(project_id, human_score, scored_by)
        .await
    {
        Ok(project) => {
            state.prom_metrics.scores_recorded.inc();
            Json(serde_json::json!({ "project": project })).into_response()
        }
        Err(e) => api_error(e),
    }
}

fn review_id_from(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, Response> {
    path.map(|Path(id)| id)
        .map_err(|_| bad_request("Invalid review ID"))
}

pub(super) async fn handler_api_review_submit(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let id = match review_id_from(path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let mut session = ReviewSession::new();
    match state.controller.submit(&mut session, id).await {
        Ok(review) => {
            state.prom_metrics.reviews_completed.inc();
            Json(serde_json::json!({ "review": review })).into_response()
        }
        Err(e) => api_error(e),
    }
}

pub(super) async fn handler_api_reviews_list(State(state): State<Arc<AppState>>) -> Response {
    match state.controller.reviews().list_all().await {
        Ok(reviews) => Json(serde_json::json!({ "reviews": reviews })).into_response(),
        Err(e) => api_error(e),
    }
}

pub(super) async fn handler_api_reviews_completed(
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.controller.list_completed().await {
        Ok(reviews) => Json(serde_json::json!({ "reviews": reviews })).into_response(),
        Err(e) => api_error(e),
    }
}

pub(super) async fn handler_api_review_get(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Response {
    let id = match review_id_from(path) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.controller.reviews().get(id).await {
        Ok(review) => Json(serde_json::json!({ "review": review })).into_response(),
        Err(e) => api_error(e),
    }
}
