//! Database row types — these map directly to SQLite rows.
//! Distinct from the jobboard-types API models to keep the DB layer
//! independent; `into_*` converts a row into its domain model, which is
//! where stored uuid/enum/timestamp text gets re-validated.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use jobboard_types::models::{
    Application, ApplicationStatus, ExperienceLevel, Job, JobType, Role, User,
};
use uuid::Uuid;

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub skills: String,
    pub reset_token: Option<String>,
    pub reset_expires: Option<String>,
    pub created_at: String,
}

pub struct JobRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub company: String,
    pub location: String,
    pub job_type: String,
    pub category: String,
    pub experience: String,
    pub salary: Option<String>,
    pub skills: String,
    pub application_deadline: Option<String>,
    pub employer_id: String,
    pub active: bool,
    pub featured: bool,
    pub created_at: String,
}

pub struct ApplicationRow {
    pub id: String,
    pub job_id: String,
    pub candidate_id: String,
    pub resume_url: String,
    pub cover_letter: Option<String>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: String,
}

/// An application row joined with its job summary and, when the caller is
/// the employer, the candidate's name and email.
pub struct ApplicationJoinRow {
    pub application: ApplicationRow,
    pub job_title: String,
    pub job_company: String,
    pub job_location: String,
    pub job_type: String,
    pub candidate_name: Option<String>,
    pub candidate_email: Option<String>,
}

impl UserRow {
    pub fn into_user(self) -> Result<User> {
        Ok(User {
            id: parse_uuid(&self.id)?,
            role: Role::parse(&self.role)
                .ok_or_else(|| anyhow!("unknown role '{}' for user {}", self.role, self.id))?,
            skills: parse_skills(&self.skills)?,
            created_at: parse_timestamp(&self.created_at)?,
            name: self.name,
            email: self.email,
            company: self.company,
            phone: self.phone,
            location: self.location,
            bio: self.bio,
        })
    }
}

impl JobRow {
    pub fn from_job(job: &Job) -> Self {
        Self {
            id: job.id.to_string(),
            title: job.title.clone(),
            description: job.description.clone(),
            requirements: job.requirements.clone(),
            company: job.company.clone(),
            location: job.location.clone(),
            job_type: job.job_type.as_str().to_string(),
            category: job.category.clone(),
            experience: job.experience.as_str().to_string(),
            salary: job.salary.clone(),
            skills: serde_json::to_string(&job.skills).unwrap_or_else(|_| "[]".into()),
            application_deadline: job.application_deadline.map(|d| d.to_rfc3339()),
            employer_id: job.employer.to_string(),
            active: job.active,
            featured: job.featured,
            created_at: job.created_at.to_rfc3339(),
        }
    }

    pub fn into_job(self) -> Result<Job> {
        Ok(Job {
            id: parse_uuid(&self.id)?,
            employer: parse_uuid(&self.employer_id)?,
            job_type: JobType::parse(&self.job_type)
                .ok_or_else(|| anyhow!("unknown job type '{}' for job {}", self.job_type, self.id))?,
            experience: ExperienceLevel::parse(&self.experience).ok_or_else(|| {
                anyhow!("unknown experience level '{}' for job {}", self.experience, self.id)
            })?,
            skills: parse_skills(&self.skills)?,
            application_deadline: self
                .application_deadline
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            created_at: parse_timestamp(&self.created_at)?,
            title: self.title,
            description: self.description,
            requirements: self.requirements,
            company: self.company,
            location: self.location,
            category: self.category,
            salary: self.salary,
            active: self.active,
            featured: self.featured,
        })
    }
}

impl ApplicationRow {
    pub fn into_application(self) -> Result<Application> {
        Ok(Application {
            id: parse_uuid(&self.id)?,
            job: parse_uuid(&self.job_id)?,
            candidate: parse_uuid(&self.candidate_id)?,
            status: ApplicationStatus::parse(&self.status).ok_or_else(|| {
                anyhow!("unknown status '{}' on application {}", self.status, self.id)
            })?,
            created_at: parse_timestamp(&self.created_at)?,
            resume_url: self.resume_url,
            cover_letter: self.cover_letter,
            notes: self.notes,
        })
    }
}

impl ApplicationJoinRow {
    pub fn into_view(self) -> Result<jobboard_types::api::ApplicationView> {
        let job_type = JobType::parse(&self.job_type).ok_or_else(|| {
            anyhow!(
                "unknown job type '{}' on application {}",
                self.job_type,
                self.application.id
            )
        })?;
        Ok(jobboard_types::api::ApplicationView {
            application: self.application.into_application()?,
            job_title: self.job_title,
            job_company: self.job_company,
            job_location: self.job_location,
            job_type,
            candidate_name: self.candidate_name,
            candidate_email: self.candidate_email,
        })
    }
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    s.parse().with_context(|| format!("corrupt uuid '{}'", s))
}

fn parse_skills(json: &str) -> Result<Vec<String>> {
    serde_json::from_str(json).with_context(|| format!("corrupt skills column '{}'", json))
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Accept RFC 3339 first, then fall back to naive UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    s.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .with_context(|| format!("corrupt timestamp '{}'", s))
}
