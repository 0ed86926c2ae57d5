//! The job-board domain core: the authorization decision table, the
//! application lifecycle manager, job ownership mutation, and candidate
//! bookmarking. Everything here is request-scoped and holds no state of its
//! own; persistence goes through jobboard-db and notifications through the
//! [`notify::Notifier`] collaborator.

pub mod applications;
pub mod error;
pub mod jobs;
pub mod notify;
pub mod policy;
pub mod saved_jobs;

pub use error::{CoreError, CoreResult};
pub use policy::Actor;
