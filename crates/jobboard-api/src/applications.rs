use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use jobboard_core::applications;
use jobboard_types::api::{
    Claims, MessageResponse, SubmitApplicationRequest, UpdateApplicationRequest,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::actor;

/// The résumé must already be uploaded (see [`crate::files`]); the request
/// carries the opaque location the upload returned.
pub async fn submit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitApplicationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let who = actor(&claims);
    let db = state.clone();
    let application = tokio::task::spawn_blocking(move || {
        applications::submit(&db.db, db.notifier.as_ref(), &who, req)
    })
    .await
    .map_err(ApiError::internal)??;

    Ok((StatusCode::CREATED, Json(application)))
}

/// Candidates list their own submissions; employers list applications
/// across their jobs.
pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let who = actor(&claims);
    let db = state.clone();
    let views = tokio::task::spawn_blocking(move || applications::list_for_actor(&db.db, &who))
        .await
        .map_err(ApiError::internal)??;

    Ok(Json(views))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let who = actor(&claims);
    let db = state.clone();
    let view = tokio::task::spawn_blocking(move || applications::get(&db.db, &who, application_id))
        .await
        .map_err(ApiError::internal)??;

    Ok(Json(view))
}

pub async fn update(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateApplicationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let who = actor(&claims);
    let db = state.clone();
    let application = tokio::task::spawn_blocking(move || {
        applications::set_status(
            &db.db,
            db.notifier.as_ref(),
            &who,
            application_id,
            &req.status,
            req.notes,
        )
    })
    .await
    .map_err(ApiError::internal)??;

    Ok(Json(application))
}

pub async fn withdraw(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let who = actor(&claims);
    let db = state.clone();
    tokio::task::spawn_blocking(move || applications::withdraw(&db.db, &who, application_id))
        .await
        .map_err(ApiError::internal)??;

    Ok(Json(MessageResponse { message: "application withdrawn" }))
}
