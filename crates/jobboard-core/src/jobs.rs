//! Job creation, browsing, and owner-gated mutation.

use chrono::Utc;
use jobboard_types::api::{CreateJobRequest, SkillsInput, UpdateJobRequest};
use jobboard_types::models::Job;
use jobboard_db::Database;
use jobboard_db::models::JobRow;
use jobboard_db::queries::JobFilter;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::policy::{Action, Actor, Resource, authorize};

/// Comma-separated string or list → trimmed ordered sequence, empty entries
/// dropped. Pure input adaptation, not a policy concern.
pub fn normalize_skills(input: &SkillsInput) -> Vec<String> {
    let trim = |s: &str| s.trim().to_string();
    match input {
        SkillsInput::List(list) => list.iter().map(|s| trim(s)).filter(|s| !s.is_empty()).collect(),
        SkillsInput::Csv(csv) => csv.split(',').map(trim).filter(|s| !s.is_empty()).collect(),
    }
}

pub fn create_job(db: &Database, actor: &Actor, req: CreateJobRequest) -> CoreResult<Job> {
    authorize(actor, Resource::Job { owner: None }, Action::Create)
        .map_err(CoreError::Forbidden)?;

    require_nonempty("title", &req.title)?;
    require_nonempty("description", &req.description)?;
    require_nonempty("requirements", &req.requirements)?;
    require_nonempty("location", &req.location)?;
    require_nonempty("category", &req.category)?;

    // Company falls back to the posting employer's own company.
    let company = match req.company.filter(|c| !c.trim().is_empty()) {
        Some(c) => c,
        None => fetch_actor_company(db, actor)?,
    };

    let skills = normalize_skills(&req.skills);
    if skills.is_empty() {
        return Err(CoreError::validation("please specify required skills"));
    }

    let job = Job {
        id: Uuid::new_v4(),
        title: req.title,
        description: req.description,
        requirements: req.requirements,
        company,
        location: req.location,
        job_type: req.job_type,
        category: req.category,
        experience: req.experience,
        salary: req.salary,
        skills,
        application_deadline: req.application_deadline,
        employer: actor.id,
        active: true,
        featured: req.featured.unwrap_or(false),
        created_at: Utc::now(),
    };

    db.insert_job(&JobRow::from_job(&job))
        .map_err(CoreError::Unavailable)?;

    // Read back the stored record so the caller sees authoritative data.
    fetch_job(db, job.id)
}

pub fn get_job(db: &Database, job_id: Uuid) -> CoreResult<Job> {
    fetch_job(db, job_id)
}

/// Public browse over active jobs; returns the page plus the total match
/// count for pagination.
pub fn browse(db: &Database, filter: &JobFilter) -> CoreResult<(Vec<Job>, u64)> {
    let (rows, total) = db.list_jobs(filter).map_err(CoreError::Unavailable)?;
    let jobs = rows
        .into_iter()
        .map(|row| row.into_job())
        .collect::<anyhow::Result<Vec<_>>>()
        .map_err(CoreError::Unavailable)?;
    Ok((jobs, total))
}

/// Owner-or-admin patch. The employer reference is immutable: no patch
/// field exists for it and the store never rewrites the column.
pub fn update_job(
    db: &Database,
    actor: &Actor,
    job_id: Uuid,
    patch: UpdateJobRequest,
) -> CoreResult<Job> {
    let mut job = fetch_job(db, job_id)?;

    authorize(actor, Resource::Job { owner: Some(job.employer) }, Action::Update)
        .map_err(CoreError::Forbidden)?;

    if let Some(title) = patch.title {
        require_nonempty("title", &title)?;
        job.title = title;
    }
    if let Some(description) = patch.description {
        job.description = description;
    }
    if let Some(requirements) = patch.requirements {
        job.requirements = requirements;
    }
    if let Some(company) = patch.company {
        require_nonempty("company", &company)?;
        job.company = company;
    }
    if let Some(location) = patch.location {
        job.location = location;
    }
    if let Some(job_type) = patch.job_type {
        job.job_type = job_type;
    }
    if let Some(category) = patch.category {
        job.category = category;
    }
    if let Some(experience) = patch.experience {
        job.experience = experience;
    }
    if let Some(salary) = patch.salary {
        job.salary = Some(salary);
    }
    if let Some(skills) = patch.skills {
        let skills = normalize_skills(&skills);
        if skills.is_empty() {
            return Err(CoreError::validation("please specify required skills"));
        }
        job.skills = skills;
    }
    if let Some(deadline) = patch.application_deadline {
        job.application_deadline = Some(deadline);
    }
    if let Some(active) = patch.active {
        job.active = active;
    }
    if let Some(featured) = patch.featured {
        job.featured = featured;
    }

    db.update_job(&JobRow::from_job(&job))
        .map_err(CoreError::Unavailable)?;

    Ok(job)
}

/// Owner-or-admin delete. Dependent applications and saved references are
/// removed by the store's cascade.
pub fn delete_job(db: &Database, actor: &Actor, job_id: Uuid) -> CoreResult<()> {
    let job = fetch_job(db, job_id)?;

    authorize(actor, Resource::Job { owner: Some(job.employer) }, Action::Delete)
        .map_err(CoreError::Forbidden)?;

    db.delete_job(&job_id.to_string())
        .map_err(CoreError::Unavailable)
}

pub(crate) fn fetch_job(db: &Database, job_id: Uuid) -> CoreResult<Job> {
    db.get_job(&job_id.to_string())
        .map_err(CoreError::Unavailable)?
        .ok_or(CoreError::NotFound("job"))?
        .into_job()
        .map_err(CoreError::Unavailable)
}

fn fetch_actor_company(db: &Database, actor: &Actor) -> CoreResult<String> {
    let user = db
        .get_user_by_id(&actor.id.to_string())
        .map_err(CoreError::Unavailable)?
        .ok_or(CoreError::NotFound("user"))?;
    user.company
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| CoreError::validation("please provide a company name"))
}

fn require_nonempty(name: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        Err(CoreError::validation(format!("please provide a job {name}")))
    } else {
        Ok(())
    }
}
