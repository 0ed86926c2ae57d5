use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use jobboard_core::CoreError;
use jobboard_types::api::{Claims, ResumeUploadResponse};

use crate::auth::AppState;
use crate::error::ApiError;

/// 5 MB upload limit for résumés
const MAX_RESUME_SIZE: usize = 5 * 1024 * 1024;

const ALLOWED_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: String,
}

/// POST /resumes?filename=... — accepts raw document bytes, enforces the
/// pdf/doc/docx allowlist, saves under uploads/resumes/{id}.{ext}, and
/// returns the opaque location string a later submit will carry. This check
/// runs before the lifecycle manager ever sees the application.
pub async fn upload_resume(
    State(_state): State<AppState>,
    Query(query): Query<UploadQuery>,
    Extension(_claims): Extension<Claims>,
    bytes: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let extension = query
        .filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| CoreError::validation("only PDF and Word documents are allowed"))?;

    if bytes.is_empty() {
        return Err(CoreError::validation("please upload your resume").into());
    }
    if bytes.len() > MAX_RESUME_SIZE {
        return Err(CoreError::validation("resume must be 5MB or smaller").into());
    }

    tokio::fs::create_dir_all("./uploads/resumes")
        .await
        .map_err(ApiError::internal)?;

    let file_name = format!("{}.{}", Uuid::new_v4(), extension);
    let file_path = format!("./uploads/resumes/{}", file_name);
    let mut file = tokio::fs::File::create(&file_path)
        .await
        .map_err(ApiError::internal)?;
    file.write_all(&bytes).await.map_err(ApiError::internal)?;

    Ok((
        StatusCode::CREATED,
        Json(ResumeUploadResponse {
            resume_url: format!("/uploads/resumes/{}", file_name),
            size: bytes.len() as u64,
        }),
    ))
}
