use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use jobboard_api::auth::{self, AppState, AppStateInner};
use jobboard_api::middleware::require_auth;
use jobboard_api::notify::Mailer;
use jobboard_api::{applications, files, jobs, users};
use jobboard_core::notify::{Notifier, NullNotifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobboard=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("JOBBOARD_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("JOBBOARD_DB_PATH").unwrap_or_else(|_| "jobboard.db".into());
    let host = std::env::var("JOBBOARD_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("JOBBOARD_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let public_url = std::env::var("JOBBOARD_PUBLIC_URL")
        .unwrap_or_else(|_| format!("http://localhost:{}", port));

    // Init database
    let db = jobboard_db::Database::open(&PathBuf::from(&db_path))?;

    // Outbound mail goes through an HTTP relay when one is configured;
    // otherwise notices are dropped (they are best-effort by contract).
    let notifier: Arc<dyn Notifier> = match std::env::var("JOBBOARD_MAIL_URL") {
        Ok(mail_url) => {
            let from = std::env::var("JOBBOARD_MAIL_FROM")
                .unwrap_or_else(|_| "Job Board <no-reply@jobboard.local>".into());
            info!("Mail relay configured at {}", mail_url);
            Arc::new(Mailer::spawn(mail_url, from))
        }
        Err(_) => Arc::new(NullNotifier),
    };

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        public_url,
        notifier,
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password/{token}", put(auth::reset_password))
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/{job_id}", get(jobs::get_job))
        .route("/users/employers", get(users::list_employers))
        .route("/users/{user_id}", get(users::get_user))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/jobs", post(jobs::create_job))
        .route("/jobs/{job_id}", put(jobs::update_job))
        .route("/jobs/{job_id}", delete(jobs::delete_job))
        .route("/applications", post(applications::submit))
        .route("/applications", get(applications::list))
        .route("/applications/{application_id}", get(applications::get_one))
        .route("/applications/{application_id}", put(applications::update))
        .route("/applications/{application_id}", delete(applications::withdraw))
        .route("/users/profile", get(users::get_profile))
        .route("/users/profile", put(users::update_profile))
        .route("/users/password", put(users::change_password))
        .route("/users/saved-jobs", get(users::list_saved_jobs))
        .route("/users/saved-jobs/{job_id}", post(users::save_job))
        .route("/users/saved-jobs/{job_id}", delete(users::unsave_job))
        .route("/resumes", post(files::upload_resume))
        .layer(middleware::from_fn(require_auth))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service("/uploads", ServeDir::new("uploads"))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Job board server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
