//! The authorization decision table. Every access rule in the system lives
//! in [`authorize`]; handlers and the lifecycle manager never re-derive
//! ownership checks on their own.

use jobboard_types::models::Role;
use uuid::Uuid;

/// The authenticated identity performing an operation, threaded explicitly
/// through every core call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

/// A resource reduced to the attributes the decision table consults.
#[derive(Debug, Clone, Copy)]
pub enum Resource {
    /// `owner` is None for create, where no instance exists yet.
    Job { owner: Option<Uuid> },
    /// An application is jointly referenced by its candidate and its job's
    /// owner but owned by neither: deletion rights belong to the candidate,
    /// status-mutation rights to the employer.
    Application { candidate: Uuid, job_owner: Uuid },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    EmployersOnly,
    CandidatesOnly,
    NotJobOwner,
    NotParticipant,
    NotApplicationOwner,
    NotApplicant,
}

impl DenyReason {
    pub fn message(&self) -> &'static str {
        match self {
            DenyReason::EmployersOnly => "only employers can post jobs",
            DenyReason::CandidatesOnly => "only candidates can apply for jobs",
            DenyReason::NotJobOwner => "not authorized to modify this job",
            DenyReason::NotParticipant => "not authorized to access this application",
            DenyReason::NotApplicationOwner => "not authorized to update this application",
            DenyReason::NotApplicant => "not authorized to withdraw this application",
        }
    }
}

/// Ordered decision table; first match wins. Pure — no store access, no
/// side effects.
pub fn authorize(actor: &Actor, resource: Resource, action: Action) -> Result<(), DenyReason> {
    let is_admin = actor.role == Role::Admin;

    match (resource, action) {
        (Resource::Job { .. }, Action::Create) => {
            if matches!(actor.role, Role::Employer | Role::Admin) {
                Ok(())
            } else {
                Err(DenyReason::EmployersOnly)
            }
        }
        (Resource::Job { owner }, Action::Update | Action::Delete) => {
            if owner == Some(actor.id) || is_admin {
                Ok(())
            } else {
                Err(DenyReason::NotJobOwner)
            }
        }
        // Job postings are public.
        (Resource::Job { .. }, Action::Read) => Ok(()),
        (Resource::Application { .. }, Action::Create) => {
            if actor.role == Role::Candidate {
                Ok(())
            } else {
                Err(DenyReason::CandidatesOnly)
            }
        }
        (Resource::Application { candidate, job_owner }, Action::Read) => {
            if actor.id == candidate || actor.id == job_owner || is_admin {
                Ok(())
            } else {
                Err(DenyReason::NotParticipant)
            }
        }
        (Resource::Application { job_owner, .. }, Action::Update) => {
            if actor.id == job_owner || is_admin {
                Ok(())
            } else {
                Err(DenyReason::NotApplicationOwner)
            }
        }
        // Withdrawal belongs to the submitting candidate alone — admins
        // included in the deny set.
        (Resource::Application { candidate, .. }, Action::Delete) => {
            if actor.id == candidate {
                Ok(())
            } else {
                Err(DenyReason::NotApplicant)
            }
        }
    }
}
