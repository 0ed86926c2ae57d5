pub mod applications;
pub mod auth;
pub mod error;
pub mod files;
pub mod jobs;
pub mod middleware;
pub mod notify;
pub mod users;
