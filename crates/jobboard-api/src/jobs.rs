use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use jobboard_core::jobs;
use jobboard_db::queries::JobFilter;
use jobboard_types::api::{Claims, CreateJobRequest, JobListResponse, MessageResponse, UpdateJobRequest};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::actor;

#[derive(Debug, Deserialize)]
pub struct JobQuery {
    pub search: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub job_type: Option<String>,
    pub experience: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

/// Row offset for a 1-based page. Widened to u64 so an extreme client-sent
/// page number can never overflow the multiplication.
fn page_offset(page: u32, limit: u32) -> u64 {
    u64::from(page.max(1) - 1) * u64::from(limit)
}

/// Public browse over active postings.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.clamp(1, 100);
    let page = query.page.max(1);
    let filter = JobFilter {
        search: query.search,
        location: query.location,
        category: query.category,
        job_type: query.job_type,
        experience: query.experience,
        limit,
        offset: page_offset(page, limit),
    };

    // Run blocking DB work off the async runtime
    let db = state.clone();
    let (data, total) = tokio::task::spawn_blocking(move || jobs::browse(&db.db, &filter))
        .await
        .map_err(ApiError::internal)??;

    Ok(Json(JobListResponse {
        count: data.len(),
        total,
        page,
        pages: total.div_ceil(limit as u64) as u32,
        data,
    }))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let job = tokio::task::spawn_blocking(move || jobs::get_job(&db.db, job_id))
        .await
        .map_err(ApiError::internal)??;
    Ok(Json(job))
}

pub async fn create_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let who = actor(&claims);
    let db = state.clone();
    let job = tokio::task::spawn_blocking(move || jobs::create_job(&db.db, &who, req))
        .await
        .map_err(ApiError::internal)??;
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn update_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let who = actor(&claims);
    let db = state.clone();
    let job = tokio::task::spawn_blocking(move || jobs::update_job(&db.db, &who, job_id, req))
        .await
        .map_err(ApiError::internal)??;
    Ok(Json(job))
}

pub async fn delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let who = actor(&claims);
    let db = state.clone();
    tokio::task::spawn_blocking(move || jobs::delete_job(&db.db, &who, job_id))
        .await
        .map_err(ApiError::internal)??;
    Ok(Json(MessageResponse { message: "job removed" }))
}
