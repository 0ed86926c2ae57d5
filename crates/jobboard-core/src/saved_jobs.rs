//! Candidate bookmarking. Saving is deliberately not idempotent: a second
//! save of the same pair is an error, as is unsaving a job that was never
//! saved. The saved_jobs primary key is the guard, not a read-then-write
//! check.

use jobboard_types::models::Job;
use jobboard_db::Database;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::jobs::fetch_job;
use crate::policy::Actor;

pub fn save_job(db: &Database, actor: &Actor, job_id: Uuid) -> CoreResult<()> {
    // The job must exist before it can be bookmarked.
    fetch_job(db, job_id)?;

    let saved = db
        .save_job(&actor.id.to_string(), &job_id.to_string())
        .map_err(CoreError::Unavailable)?;
    if saved { Ok(()) } else { Err(CoreError::AlreadySaved) }
}

pub fn unsave_job(db: &Database, actor: &Actor, job_id: Uuid) -> CoreResult<()> {
    let removed = db
        .unsave_job(&actor.id.to_string(), &job_id.to_string())
        .map_err(CoreError::Unavailable)?;
    if removed { Ok(()) } else { Err(CoreError::NotSaved) }
}

pub fn saved_jobs(db: &Database, actor: &Actor) -> CoreResult<Vec<Job>> {
    let rows = db
        .list_saved_jobs(&actor.id.to_string())
        .map_err(CoreError::Unavailable)?;
    rows.into_iter()
        .map(|row| row.into_job())
        .collect::<anyhow::Result<Vec<_>>>()
        .map_err(CoreError::Unavailable)
}
