use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use uuid::Uuid;

use jobboard_core::{CoreError, jobs::normalize_skills, saved_jobs};
use jobboard_types::api::{
    ChangePasswordRequest, Claims, EmployerListResponse, MessageResponse, SavedJobsResponse,
    UpdateProfileRequest,
};
use jobboard_types::models::Role;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::actor;

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_id(&claims.sub.to_string())
        .map_err(CoreError::Unavailable)?
        .ok_or(CoreError::NotFound("user"))?
        .into_user()
        .map_err(CoreError::Unavailable)?;

    Ok(Json(user))
}

/// Merge-update of profile fields. Password and role are deliberately not
/// reachable through this endpoint.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut user = state
        .db
        .get_user_by_id(&claims.sub.to_string())
        .map_err(CoreError::Unavailable)?
        .ok_or(CoreError::NotFound("user"))?
        .into_user()
        .map_err(CoreError::Unavailable)?;

    if let Some(name) = req.name {
        if name.trim().is_empty() {
            return Err(CoreError::validation("please add a name").into());
        }
        user.name = name.trim().to_string();
    }
    if let Some(company) = req.company {
        user.company = Some(company);
    }
    if let Some(phone) = req.phone {
        user.phone = Some(phone);
    }
    if let Some(location) = req.location {
        user.location = Some(location);
    }
    if let Some(bio) = req.bio {
        user.bio = Some(bio);
    }
    if let Some(skills) = req.skills {
        user.skills = normalize_skills(&skills);
    }

    // An employer profile can never drop its company.
    if user.role == Role::Employer
        && !user.company.as_deref().is_some_and(|c| !c.trim().is_empty())
    {
        return Err(CoreError::validation("company name is required for employers").into());
    }

    let skills_json = serde_json::to_string(&user.skills).map_err(ApiError::internal)?;
    state
        .db
        .update_user_profile(
            &user.id.to_string(),
            &user.name,
            user.company.as_deref(),
            user.phone.as_deref(),
            user.location.as_deref(),
            user.bio.as_deref(),
            &skills_json,
        )
        .map_err(CoreError::Unavailable)?;

    Ok(Json(user))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_id(&claims.sub.to_string())
        .map_err(CoreError::Unavailable)?
        .ok_or(CoreError::NotFound("user"))?;

    let parsed_hash = PasswordHash::new(&user.password).map_err(ApiError::internal)?;
    Argon2::default()
        .verify_password(req.current_password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::unauthenticated())?;

    if req.new_password.len() < 6 {
        return Err(CoreError::validation("password must be at least 6 characters").into());
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.new_password.as_bytes(), &salt)
        .map_err(ApiError::internal)?
        .to_string();

    state
        .db
        .update_user_password(&user.id, &password_hash)
        .map_err(CoreError::Unavailable)?;

    Ok(Json(MessageResponse { message: "password updated successfully" }))
}

/// Public profile lookup; the credential hash never leaves the db layer.
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_id(&user_id.to_string())
        .map_err(CoreError::Unavailable)?
        .ok_or(CoreError::NotFound("user"))?
        .into_user()
        .map_err(CoreError::Unavailable)?;

    Ok(Json(user))
}

/// Public employer directory.
pub async fn list_employers(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_employers().map_err(CoreError::Unavailable)?;
    let data = rows
        .into_iter()
        .map(|row| row.into_user())
        .collect::<anyhow::Result<Vec<_>>>()
        .map_err(CoreError::Unavailable)?;

    Ok(Json(EmployerListResponse { count: data.len(), data }))
}

// -- Saved jobs --

pub async fn save_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let who = actor(&claims);
    let db = state.clone();
    tokio::task::spawn_blocking(move || saved_jobs::save_job(&db.db, &who, job_id))
        .await
        .map_err(ApiError::internal)??;
    Ok(Json(MessageResponse { message: "job saved" }))
}

pub async fn unsave_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let who = actor(&claims);
    let db = state.clone();
    tokio::task::spawn_blocking(move || saved_jobs::unsave_job(&db.db, &who, job_id))
        .await
        .map_err(ApiError::internal)??;
    Ok(Json(MessageResponse { message: "job removed from saved jobs" }))
}

pub async fn list_saved_jobs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let who = actor(&claims);
    let db = state.clone();
    let data = tokio::task::spawn_blocking(move || saved_jobs::saved_jobs(&db.db, &who))
        .await
        .map_err(ApiError::internal)??;
    Ok(Json(SavedJobsResponse { count: data.len(), data }))
}
