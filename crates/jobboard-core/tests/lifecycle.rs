//! End-to-end lifecycle checks against an in-memory database: duplicate
//! prevention, ownership rules, status transitions, and bookmarking.

use std::sync::Mutex;

use jobboard_core::notify::{Notice, Notifier, NullNotifier};
use jobboard_core::policy::Actor;
use jobboard_core::{CoreError, applications, jobs, saved_jobs};
use jobboard_db::Database;
use jobboard_types::api::{CreateJobRequest, SkillsInput, SubmitApplicationRequest};
use jobboard_types::models::{ApplicationStatus, ExperienceLevel, Job, JobType, Role};
use uuid::Uuid;

#[derive(Default)]
struct RecordingNotifier(Mutex<Vec<(String, &'static str)>>);

impl Notifier for RecordingNotifier {
    fn send(&self, to: &str, notice: Notice) {
        self.0.lock().unwrap().push((to.to_string(), notice.template()));
    }
}

fn add_user(db: &Database, role: Role) -> Actor {
    let id = Uuid::new_v4();
    let email = format!("{}@example.test", id);
    let company = match role {
        Role::Employer => Some("Acme"),
        _ => None,
    };
    db.create_user(&id.to_string(), "Test User", &email, "hash", role.as_str(), company)
        .unwrap();
    Actor { id, role }
}

fn post_job(db: &Database, employer: &Actor) -> Job {
    jobs::create_job(
        db,
        employer,
        CreateJobRequest {
            title: "Backend Engineer".into(),
            description: "Build and run the backend".into(),
            requirements: "Rust, SQL".into(),
            company: Some("Acme".into()),
            location: "Remote".into(),
            job_type: JobType::Remote,
            category: "Engineering".into(),
            experience: ExperienceLevel::MidLevel,
            salary: None,
            skills: SkillsInput::Csv("rust, sql".into()),
            application_deadline: None,
            featured: None,
        },
    )
    .unwrap()
}

fn submit_req(job_id: Uuid) -> SubmitApplicationRequest {
    SubmitApplicationRequest {
        job_id,
        resume_url: "/uploads/resumes/r.pdf".into(),
        cover_letter: None,
    }
}

#[test]
fn second_submit_for_same_pair_is_rejected() {
    let db = Database::open_in_memory().unwrap();
    let employer = add_user(&db, Role::Employer);
    let candidate = add_user(&db, Role::Candidate);
    let job = post_job(&db, &employer);

    let first = applications::submit(&db, &NullNotifier, &candidate, submit_req(job.id)).unwrap();
    assert_eq!(first.status, ApplicationStatus::Pending);

    let second = applications::submit(&db, &NullNotifier, &candidate, submit_req(job.id));
    assert!(matches!(second, Err(CoreError::DuplicateApplication)));
}

#[test]
fn submit_requires_an_existing_job() {
    let db = Database::open_in_memory().unwrap();
    let candidate = add_user(&db, Role::Candidate);

    let result = applications::submit(&db, &NullNotifier, &candidate, submit_req(Uuid::new_v4()));
    assert!(matches!(result, Err(CoreError::NotFound("job"))));
}

#[test]
fn submit_requires_candidate_role() {
    let db = Database::open_in_memory().unwrap();
    let employer = add_user(&db, Role::Employer);
    let other_employer = add_user(&db, Role::Employer);
    let job = post_job(&db, &employer);

    let result = applications::submit(&db, &NullNotifier, &other_employer, submit_req(job.id));
    assert!(matches!(result, Err(CoreError::Forbidden(_))));
}

#[test]
fn submit_requires_a_resume() {
    let db = Database::open_in_memory().unwrap();
    let employer = add_user(&db, Role::Employer);
    let candidate = add_user(&db, Role::Candidate);
    let job = post_job(&db, &employer);

    let mut req = submit_req(job.id);
    req.resume_url = "   ".into();
    let result = applications::submit(&db, &NullNotifier, &candidate, req);
    assert!(matches!(result, Err(CoreError::ValidationFailed(_))));
}

#[test]
fn status_update_by_stranger_leaves_status_unchanged() {
    let db = Database::open_in_memory().unwrap();
    let employer = add_user(&db, Role::Employer);
    let candidate = add_user(&db, Role::Candidate);
    let stranger = add_user(&db, Role::Employer);
    let job = post_job(&db, &employer);
    let app = applications::submit(&db, &NullNotifier, &candidate, submit_req(job.id)).unwrap();

    let result =
        applications::set_status(&db, &NullNotifier, &stranger, app.id, "rejected", None);
    assert!(matches!(result, Err(CoreError::Forbidden(_))));

    let unchanged = applications::get(&db, &employer, app.id).unwrap();
    assert_eq!(unchanged.application.status, ApplicationStatus::Pending);
}

#[test]
fn unknown_status_is_rejected() {
    let db = Database::open_in_memory().unwrap();
    let employer = add_user(&db, Role::Employer);
    let candidate = add_user(&db, Role::Candidate);
    let job = post_job(&db, &employer);
    let app = applications::submit(&db, &NullNotifier, &candidate, submit_req(job.id)).unwrap();

    let result = applications::set_status(&db, &NullNotifier, &employer, app.id, "hired", None);
    assert!(matches!(result, Err(CoreError::InvalidStatus(s)) if s == "hired"));
}

#[test]
fn any_status_may_move_to_any_other() {
    let db = Database::open_in_memory().unwrap();
    let employer = add_user(&db, Role::Employer);
    let candidate = add_user(&db, Role::Candidate);
    let job = post_job(&db, &employer);
    let app = applications::submit(&db, &NullNotifier, &candidate, submit_req(job.id)).unwrap();

    // No ordering is imposed, including rejected -> pending.
    for status in ["rejected", "pending", "offered", "reviewed"] {
        let updated =
            applications::set_status(&db, &NullNotifier, &employer, app.id, status, None).unwrap();
        assert_eq!(updated.status.as_str(), status);
    }
}

#[test]
fn withdraw_is_candidate_only_at_any_status() {
    let db = Database::open_in_memory().unwrap();
    let employer = add_user(&db, Role::Employer);
    let admin = add_user(&db, Role::Admin);
    let candidate = add_user(&db, Role::Candidate);
    let job = post_job(&db, &employer);
    let app = applications::submit(&db, &NullNotifier, &candidate, submit_req(job.id)).unwrap();

    applications::set_status(&db, &NullNotifier, &employer, app.id, "offered", None).unwrap();

    // Neither the employer nor an admin may withdraw on the candidate's behalf.
    assert!(matches!(
        applications::withdraw(&db, &employer, app.id),
        Err(CoreError::Forbidden(_))
    ));
    assert!(matches!(
        applications::withdraw(&db, &admin, app.id),
        Err(CoreError::Forbidden(_))
    ));

    applications::withdraw(&db, &candidate, app.id).unwrap();
    assert!(matches!(
        applications::get(&db, &candidate, app.id),
        Err(CoreError::NotFound("application"))
    ));
}

#[test]
fn full_lifecycle_scenario() {
    let db = Database::open_in_memory().unwrap();
    let employer = add_user(&db, Role::Employer);
    let candidate_c = add_user(&db, Role::Candidate);
    let candidate_d = add_user(&db, Role::Candidate);
    let job = post_job(&db, &employer);

    // C applies; a second attempt is a duplicate.
    let a1 = applications::submit(&db, &NullNotifier, &candidate_c, submit_req(job.id)).unwrap();
    assert_eq!(a1.status, ApplicationStatus::Pending);
    assert!(matches!(
        applications::submit(&db, &NullNotifier, &candidate_c, submit_req(job.id)),
        Err(CoreError::DuplicateApplication)
    ));

    // The employer advances the pipeline.
    let a1 = applications::set_status(&db, &NullNotifier, &employer, a1.id, "interviewed", None)
        .unwrap();
    assert_eq!(a1.status, ApplicationStatus::Interviewed);

    // D is a different candidate with no claim on A1.
    assert!(matches!(
        applications::set_status(&db, &NullNotifier, &candidate_d, a1.id, "rejected", None),
        Err(CoreError::Forbidden(_))
    ));
    let check = applications::get(&db, &employer, a1.id).unwrap();
    assert_eq!(check.application.status, ApplicationStatus::Interviewed);

    // Withdrawal frees the pair for a fresh submission.
    applications::withdraw(&db, &candidate_c, a1.id).unwrap();
    let a2 = applications::submit(&db, &NullNotifier, &candidate_c, submit_req(job.id)).unwrap();
    assert_ne!(a2.id, a1.id);
    assert_eq!(a2.status, ApplicationStatus::Pending);
}

#[test]
fn foreign_employer_cannot_touch_a_job() {
    let db = Database::open_in_memory().unwrap();
    let owner = add_user(&db, Role::Employer);
    let other = add_user(&db, Role::Employer);
    let job = post_job(&db, &owner);

    assert!(matches!(
        jobs::delete_job(&db, &other, job.id),
        Err(CoreError::Forbidden(_))
    ));
    assert!(matches!(
        jobs::update_job(&db, &other, job.id, Default::default()),
        Err(CoreError::Forbidden(_))
    ));

    // The job is untouched; an admin may still delete it.
    assert_eq!(jobs::get_job(&db, job.id).unwrap().id, job.id);
    let admin = add_user(&db, Role::Admin);
    jobs::delete_job(&db, &admin, job.id).unwrap();
    assert!(matches!(jobs::get_job(&db, job.id), Err(CoreError::NotFound("job"))));
}

#[test]
fn save_and_unsave_are_hard_errors_on_repeat() {
    let db = Database::open_in_memory().unwrap();
    let employer = add_user(&db, Role::Employer);
    let candidate = add_user(&db, Role::Candidate);
    let job = post_job(&db, &employer);

    saved_jobs::save_job(&db, &candidate, job.id).unwrap();
    assert!(matches!(
        saved_jobs::save_job(&db, &candidate, job.id),
        Err(CoreError::AlreadySaved)
    ));

    let saved = saved_jobs::saved_jobs(&db, &candidate).unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].id, job.id);

    saved_jobs::unsave_job(&db, &candidate, job.id).unwrap();
    assert!(matches!(
        saved_jobs::unsave_job(&db, &candidate, job.id),
        Err(CoreError::NotSaved)
    ));

    assert!(matches!(
        saved_jobs::save_job(&db, &candidate, Uuid::new_v4()),
        Err(CoreError::NotFound("job"))
    ));
}

#[test]
fn submit_and_status_change_notify_the_right_people() {
    let db = Database::open_in_memory().unwrap();
    let employer = add_user(&db, Role::Employer);
    let candidate = add_user(&db, Role::Candidate);
    let job = post_job(&db, &employer);

    let notifier = RecordingNotifier::default();
    let app = applications::submit(&db, &notifier, &candidate, submit_req(job.id)).unwrap();

    {
        let sent = notifier.0.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].1, "application-received");
        assert!(sent[0].0.starts_with(&candidate.id.to_string()));
        assert_eq!(sent[1].1, "new-application");
        assert!(sent[1].0.starts_with(&employer.id.to_string()));
    }

    applications::set_status(&db, &notifier, &employer, app.id, "reviewed", None).unwrap();
    let sent = notifier.0.lock().unwrap();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[2].1, "application-status");
    assert!(sent[2].0.starts_with(&candidate.id.to_string()));
}

#[test]
fn employer_and_candidate_see_their_own_application_lists() {
    let db = Database::open_in_memory().unwrap();
    let employer = add_user(&db, Role::Employer);
    let other_employer = add_user(&db, Role::Employer);
    let candidate = add_user(&db, Role::Candidate);
    let job = post_job(&db, &employer);

    applications::submit(&db, &NullNotifier, &candidate, submit_req(job.id)).unwrap();

    let mine = applications::list_for_actor(&db, &candidate).unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].job_title, "Backend Engineer");
    // Candidate listings carry no third-party contact details.
    assert!(mine[0].candidate_name.is_none());

    let theirs = applications::list_for_actor(&db, &employer).unwrap();
    assert_eq!(theirs.len(), 1);
    assert_eq!(theirs[0].candidate_name.as_deref(), Some("Test User"));

    assert!(applications::list_for_actor(&db, &other_employer).unwrap().is_empty());
}
