mod admin;
mod careers;
mod inbox;
mod institution;
mod public;
mod reviews;
mod student;
mod users;

use crate::infra::{ApiState, AppState};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use edumarket::error::ServiceError;
use edumarket::store::Store;
use serde::Serialize;
use serde_json::json;
use tower_http::services::ServeDir;

/// `{ success, message?, ...body }` wrapper shared by every API response.
#[derive(Debug, Serialize)]
pub(crate) struct Envelope<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(flatten)]
    body: T,
}

#[derive(Debug, Serialize)]
pub(crate) struct Data<T> {
    data: T,
}

#[derive(Debug, Serialize)]
pub(crate) struct Empty {}

pub(crate) type ApiResult<T> = Result<Json<Envelope<T>>, ServiceError>;

pub(crate) type Created<T> = Result<(StatusCode, Json<Envelope<Data<T>>>), ServiceError>;

/// `{ success: true, data }`
pub(crate) fn data<T: Serialize>(data: T) -> ApiResult<Data<T>> {
    Ok(Json(Envelope {
        success: true,
        message: None,
        body: Data { data },
    }))
}

/// `{ success: true, message, data }`
pub(crate) fn data_with<T: Serialize>(message: &str, data: T) -> ApiResult<Data<T>> {
    Ok(Json(Envelope {
        success: true,
        message: Some(message.to_string()),
        body: Data { data },
    }))
}

/// Body fields are merged next to `success`.
pub(crate) fn flat<T: Serialize>(body: T) -> ApiResult<T> {
    Ok(Json(Envelope {
        success: true,
        message: None,
        body,
    }))
}

/// 201 with `{ success: true, message, data }`.
pub(crate) fn created<T: Serialize>(message: &str, data: T) -> Created<T> {
    let Json(envelope) = data_with(message, data)?;
    Ok((StatusCode::CREATED, Json(envelope)))
}

pub(crate) fn done(message: &str) -> ApiResult<Empty> {
    Ok(Json(Envelope {
        success: true,
        message: Some(message.to_string()),
        body: Empty {},
    }))
}

/// Every API route plus static file trees. Operational endpoints read [`AppState`] from an
/// `Extension` layered on by the caller.
pub(crate) fn router<S: Store>(state: ApiState<S>) -> Router {
    let public_dir = ServeDir::new(&state.uploads.public_dir);
    let upload_dir = ServeDir::new(&state.uploads.upload_dir);

    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/health", get(api_health))
        .merge(public::routes())
        .merge(users::routes())
        .merge(reviews::routes())
        .merge(student::routes())
        .merge(institution::routes())
        .merge(admin::routes())
        .merge(careers::routes())
        .nest_service("/public", public_dir)
        .nest_service("/uploads", upload_dir)
        .with_state(state)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn api_health() -> Json<serde_json::Value> {
    Json(json!({ "success": true, "message": "API is running" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
