use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Application, ExperienceLevel, JobType, Role, User};

// -- JWT Claims --

/// JWT claims shared between the REST middleware and the auth handlers.
/// Canonical definition lives here in jobboard-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub company: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub name: String,
    pub role: Role,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetPasswordRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

// -- Users --

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<SkillsInput>,
}

// -- Jobs --

/// Skills arrive either as a proper list or as one comma-separated string,
/// depending on which client form submitted them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SkillsInput {
    List(Vec<String>),
    Csv(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateJobRequest {
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub company: Option<String>,
    pub location: String,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub category: String,
    pub experience: ExperienceLevel,
    pub salary: Option<String>,
    pub skills: SkillsInput,
    pub application_deadline: Option<chrono::DateTime<chrono::Utc>>,
    pub featured: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub job_type: Option<JobType>,
    pub category: Option<String>,
    pub experience: Option<ExperienceLevel>,
    pub salary: Option<String>,
    pub skills: Option<SkillsInput>,
    pub application_deadline: Option<chrono::DateTime<chrono::Utc>>,
    pub active: Option<bool>,
    pub featured: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub count: usize,
    pub total: u64,
    pub page: u32,
    pub pages: u32,
    pub data: Vec<crate::models::Job>,
}

// -- Applications --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitApplicationRequest {
    pub job_id: Uuid,
    pub resume_url: String,
    pub cover_letter: Option<String>,
}

/// Status is a free string here on purpose: the lifecycle manager owns the
/// enum check and reports `InvalidStatus` for anything it does not know.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateApplicationRequest {
    pub status: String,
    pub notes: Option<String>,
}

/// An application joined with the job summary it targets and, for employer
/// views, the candidate's contact details.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    #[serde(flatten)]
    pub application: Application,
    pub job_title: String,
    pub job_company: String,
    pub job_location: String,
    pub job_type: JobType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_email: Option<String>,
}

// -- Files --

#[derive(Debug, Serialize)]
pub struct ResumeUploadResponse {
    pub resume_url: String,
    pub size: u64,
}

// -- Misc --

#[derive(Debug, Serialize)]
pub struct EmployerListResponse {
    pub count: usize,
    pub data: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct SavedJobsResponse {
    pub count: usize,
    pub data: Vec<crate::models::Job>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
