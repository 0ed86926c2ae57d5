use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Closed role set. Admin accounts are provisioned out of band and can never
/// be self-assigned through registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Candidate,
    Employer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Candidate => "candidate",
            Role::Employer => "employer",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "candidate" => Some(Role::Candidate),
            "employer" => Some(Role::Employer),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    Contract,
    Internship,
    Remote,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::PartTime => "Part-time",
            JobType::Contract => "Contract",
            JobType::Internship => "Internship",
            JobType::Remote => "Remote",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Full-time" => Some(JobType::FullTime),
            "Part-time" => Some(JobType::PartTime),
            "Contract" => Some(JobType::Contract),
            "Internship" => Some(JobType::Internship),
            "Remote" => Some(JobType::Remote),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperienceLevel {
    #[serde(rename = "Entry-level")]
    EntryLevel,
    #[serde(rename = "Mid-level")]
    MidLevel,
    Senior,
    Executive,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::EntryLevel => "Entry-level",
            ExperienceLevel::MidLevel => "Mid-level",
            ExperienceLevel::Senior => "Senior",
            ExperienceLevel::Executive => "Executive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Entry-level" => Some(ExperienceLevel::EntryLevel),
            "Mid-level" => Some(ExperienceLevel::MidLevel),
            "Senior" => Some(ExperienceLevel::Senior),
            "Executive" => Some(ExperienceLevel::Executive),
            _ => None,
        }
    }
}

/// Hiring-pipeline status. Every state may transition to every other; the
/// pipeline deliberately imposes no ordering, so an application can move
/// from `rejected` back to `pending` if the employer reconsiders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Interviewed,
    Offered,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Interviewed => "interviewed",
            ApplicationStatus::Offered => "offered",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ApplicationStatus::Pending),
            "reviewed" => Some(ApplicationStatus::Reviewed),
            "interviewed" => Some(ApplicationStatus::Interviewed),
            "offered" => Some(ApplicationStatus::Offered),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }
}

/// A user account. The credential hash lives only in the db layer and is
/// never part of this model, so it cannot leak through serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub company: String,
    pub location: String,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub category: String,
    pub experience: ExperienceLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_deadline: Option<DateTime<Utc>>,
    pub employer: Uuid,
    pub active: bool,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub job: Uuid,
    pub candidate: Uuid,
    pub resume_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
