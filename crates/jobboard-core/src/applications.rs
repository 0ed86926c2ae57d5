//! The application lifecycle manager: submit, status transitions, and
//! withdrawal, with the duplicate-prevention and ownership invariants that
//! span the Job / Application / User relationship.

use jobboard_types::api::{ApplicationView, SubmitApplicationRequest};
use jobboard_types::models::{Application, ApplicationStatus, Job, Role};
use jobboard_db::Database;
use tracing::warn;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::jobs::fetch_job;
use crate::notify::{Notice, Notifier};
use crate::policy::{Action, Actor, Resource, authorize};

/// Submit an application for a job. At most one application may exist per
/// (job, candidate) pair: the early lookup catches the common case, and the
/// store's unique index is the authoritative guard under concurrency.
pub fn submit(
    db: &Database,
    notifier: &dyn Notifier,
    actor: &Actor,
    req: SubmitApplicationRequest,
) -> CoreResult<Application> {
    let job = fetch_job(db, req.job_id)?;

    let existing = db
        .find_application_by_pair(&req.job_id.to_string(), &actor.id.to_string())
        .map_err(CoreError::Unavailable)?;
    if existing.is_some() {
        return Err(CoreError::DuplicateApplication);
    }

    authorize(
        actor,
        Resource::Application { candidate: actor.id, job_owner: job.employer },
        Action::Create,
    )
    .map_err(CoreError::Forbidden)?;

    if req.resume_url.trim().is_empty() {
        return Err(CoreError::validation("please upload your resume"));
    }

    let id = Uuid::new_v4();
    let inserted = db
        .insert_application(
            &id.to_string(),
            &req.job_id.to_string(),
            &actor.id.to_string(),
            &req.resume_url,
            req.cover_letter.as_deref(),
        )
        .map_err(CoreError::Unavailable)?;
    if !inserted {
        // A concurrent submit won the race; same outcome as the early check.
        return Err(CoreError::DuplicateApplication);
    }

    let application = fetch_application(db, id)?;

    notify_submission(db, notifier, actor.id, &job);

    Ok(application)
}

/// Best-effort notices to both sides of a submission; failures are logged,
/// never propagated. The two sends are independent: a failed candidate
/// lookup must not cost the employer their notice.
fn notify_submission(db: &Database, notifier: &dyn Notifier, candidate_id: Uuid, job: &Job) {
    let candidate = lookup_contact(db, candidate_id);

    if let Some((_, candidate_email)) = &candidate {
        notifier.send(
            candidate_email,
            Notice::ApplicationReceived {
                job_title: job.title.clone(),
                company: job.company.clone(),
            },
        );
    }

    if let Some((_, employer_email)) = lookup_contact(db, job.employer) {
        let candidate_name = candidate
            .map(|(name, _)| name)
            .unwrap_or_else(|| "A candidate".to_string());
        notifier.send(
            &employer_email,
            Notice::NewApplication { job_title: job.title.clone(), candidate_name },
        );
    }
}

/// Move an application to a new pipeline status. Only the job's employer or
/// an admin may do this; any status can move to any other.
pub fn set_status(
    db: &Database,
    notifier: &dyn Notifier,
    actor: &Actor,
    application_id: Uuid,
    status: &str,
    notes: Option<String>,
) -> CoreResult<Application> {
    let application = fetch_application(db, application_id)?;
    let job = fetch_job(db, application.job)?;

    authorize(
        actor,
        Resource::Application { candidate: application.candidate, job_owner: job.employer },
        Action::Update,
    )
    .map_err(CoreError::Forbidden)?;

    let new_status = ApplicationStatus::parse(status)
        .ok_or_else(|| CoreError::InvalidStatus(status.to_string()))?;

    db.update_application_status(
        &application_id.to_string(),
        new_status.as_str(),
        notes.as_deref().or(application.notes.as_deref()),
    )
    .map_err(CoreError::Unavailable)?;

    let updated = fetch_application(db, application_id)?;

    if let Some((_, candidate_email)) = lookup_contact(db, updated.candidate) {
        notifier.send(
            &candidate_email,
            Notice::ApplicationStatusChanged { job_title: job.title, status: new_status },
        );
    }

    Ok(updated)
}

/// Withdraw (delete) an application. Allowed only for the submitting
/// candidate, at any status — including after `offered` or `rejected`.
pub fn withdraw(db: &Database, actor: &Actor, application_id: Uuid) -> CoreResult<()> {
    let application = fetch_application(db, application_id)?;
    let job = fetch_job(db, application.job)?;

    authorize(
        actor,
        Resource::Application { candidate: application.candidate, job_owner: job.employer },
        Action::Delete,
    )
    .map_err(CoreError::Forbidden)?;

    db.delete_application(&application_id.to_string())
        .map_err(CoreError::Unavailable)
}

/// Fetch one application with its job summary. Readable by the candidate,
/// the job's employer, and admins.
pub fn get(db: &Database, actor: &Actor, application_id: Uuid) -> CoreResult<ApplicationView> {
    let application = fetch_application(db, application_id)?;
    let job = fetch_job(db, application.job)?;

    authorize(
        actor,
        Resource::Application { candidate: application.candidate, job_owner: job.employer },
        Action::Read,
    )
    .map_err(CoreError::Forbidden)?;

    let (candidate_name, candidate_email) = lookup_contact(db, application.candidate)
        .map(|(n, e)| (Some(n), Some(e)))
        .unwrap_or((None, None));

    Ok(ApplicationView {
        application,
        job_title: job.title,
        job_company: job.company,
        job_location: job.location,
        job_type: job.job_type,
        candidate_name,
        candidate_email,
    })
}

/// A candidate sees their own submissions; employers (and admins) see every
/// application across the jobs they own.
pub fn list_for_actor(db: &Database, actor: &Actor) -> CoreResult<Vec<ApplicationView>> {
    let id = actor.id.to_string();
    let rows = match actor.role {
        Role::Candidate => db.list_applications_by_candidate(&id),
        Role::Employer | Role::Admin => db.list_applications_for_employer(&id),
    }
    .map_err(CoreError::Unavailable)?;

    rows.into_iter()
        .map(|row| row.into_view())
        .collect::<anyhow::Result<Vec<_>>>()
        .map_err(CoreError::Unavailable)
}

fn fetch_application(db: &Database, id: Uuid) -> CoreResult<Application> {
    db.get_application(&id.to_string())
        .map_err(CoreError::Unavailable)?
        .ok_or(CoreError::NotFound("application"))?
        .into_application()
        .map_err(CoreError::Unavailable)
}

/// Name and email for notification delivery. A store failure here only
/// costs us the notice, so it degrades to None with a warning.
fn lookup_contact(db: &Database, user_id: Uuid) -> Option<(String, String)> {
    match db.get_user_by_id(&user_id.to_string()) {
        Ok(Some(user)) => Some((user.name, user.email)),
        Ok(None) => None,
        Err(e) => {
            warn!("contact lookup failed for {}: {}", user_id, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier(Mutex<Vec<(String, &'static str)>>);

    impl Notifier for RecordingNotifier {
        fn send(&self, to: &str, notice: Notice) {
            self.0.lock().unwrap().push((to.to_string(), notice.template()));
        }
    }

    #[test]
    fn employer_notice_survives_a_missing_candidate_record() {
        let db = Database::open_in_memory().unwrap();
        let employer_id = Uuid::new_v4();
        db.create_user(
            &employer_id.to_string(),
            "Acme HR",
            "hr@acme.test",
            "hash",
            "employer",
            Some("Acme"),
        )
        .unwrap();

        let job = Job {
            id: Uuid::new_v4(),
            title: "Backend Engineer".into(),
            description: "Build services".into(),
            requirements: "Rust".into(),
            company: "Acme".into(),
            location: "Remote".into(),
            job_type: jobboard_types::models::JobType::Remote,
            category: "Engineering".into(),
            experience: jobboard_types::models::ExperienceLevel::MidLevel,
            salary: None,
            skills: vec!["rust".into()],
            application_deadline: None,
            employer: employer_id,
            active: true,
            featured: false,
            created_at: Utc::now(),
        };

        // The candidate id resolves to nothing; only the employer hears.
        let notifier = RecordingNotifier::default();
        notify_submission(&db, &notifier, Uuid::new_v4(), &job);

        let sent = notifier.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], ("hr@acme.test".to_string(), "new-application"));
    }
}
