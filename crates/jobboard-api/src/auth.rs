use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::{Path, State}, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use jobboard_core::CoreError;
use jobboard_core::notify::{Notice, Notifier};
use jobboard_db::Database;
use jobboard_types::api::{
    Claims, ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
    RegisterResponse, ResetPasswordRequest,
};
use jobboard_types::models::Role;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    /// Base URL used when building password-reset links.
    pub public_url: String,
    pub notifier: Arc<dyn Notifier>,
}

/// Reset tokens live for ten minutes.
const RESET_TOKEN_TTL_MINUTES: i64 = 10;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.trim().is_empty() {
        return Err(CoreError::validation("please add a name").into());
    }
    if !req.email.contains('@') {
        return Err(CoreError::validation("please add a valid email").into());
    }
    if req.password.len() < 6 {
        return Err(CoreError::validation("password must be at least 6 characters").into());
    }
    // Admin accounts are provisioned out of band, never self-registered.
    if req.role == Role::Admin {
        return Err(CoreError::validation("invalid role selected").into());
    }
    let company = match req.role {
        Role::Employer => match req.company.filter(|c| !c.trim().is_empty()) {
            Some(c) => Some(c),
            None => {
                return Err(
                    CoreError::validation("company name is required for employers").into()
                );
            }
        },
        _ => None,
    };

    let email = req.email.trim().to_lowercase();

    if state
        .db
        .get_user_by_email(&email)
        .map_err(CoreError::Unavailable)?
        .is_some()
    {
        return Err(CoreError::validation("user already exists").into());
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(ApiError::internal)?
        .to_string();

    let user_id = Uuid::new_v4();
    let created = state
        .db
        .create_user(
            &user_id.to_string(),
            req.name.trim(),
            &email,
            &password_hash,
            req.role.as_str(),
            company.as_deref(),
        )
        .map_err(CoreError::Unavailable)?;
    if !created {
        // A concurrent registration won the race past the lookup above.
        return Err(CoreError::validation("user already exists").into());
    }

    let token =
        create_token(&state.jwt_secret, user_id, req.role).map_err(ApiError::internal)?;

    state.notifier.send(&email, Notice::Welcome { name: req.name.trim().to_string() });

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id, token })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_email(req.email.trim())
        .map_err(CoreError::Unavailable)?
        .ok_or_else(ApiError::unauthenticated)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password).map_err(ApiError::internal)?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::unauthenticated())?;

    let user = user.into_user().map_err(CoreError::Unavailable)?;
    let token = create_token(&state.jwt_secret, user.id, user.role).map_err(ApiError::internal)?;

    Ok(Json(LoginResponse {
        user_id: user.id,
        name: user.name,
        role: user.role,
        token,
    }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_id(&claims.sub.to_string())
        .map_err(CoreError::Unavailable)?
        .ok_or(CoreError::NotFound("user"))?
        .into_user()
        .map_err(CoreError::Unavailable)?;

    Ok(Json(user))
}

/// Issue a reset token: 20 random bytes handed to the user, its SHA-256
/// digest stored. Requires a registered address.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .db
        .get_user_by_email(req.email.trim())
        .map_err(CoreError::Unavailable)?
        .ok_or(CoreError::NotFound("user"))?;

    let token = hex::encode(rand::random::<[u8; 20]>());
    let digest = hex::encode(Sha256::digest(token.as_bytes()));
    let expires = (chrono::Utc::now() + chrono::Duration::minutes(RESET_TOKEN_TTL_MINUTES))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();

    state
        .db
        .set_reset_token(&user.id, &digest, &expires)
        .map_err(CoreError::Unavailable)?;

    let reset_url = format!("{}/resetpassword/{}", state.public_url, token);
    state.notifier.send(&user.email, Notice::PasswordReset { reset_url });

    Ok(Json(MessageResponse { message: "email sent" }))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.password.len() < 6 {
        return Err(CoreError::validation("password must be at least 6 characters").into());
    }

    let digest = hex::encode(Sha256::digest(token.as_bytes()));
    let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

    let user = state
        .db
        .get_user_by_reset_token(&digest, &now)
        .map_err(CoreError::Unavailable)?
        .ok_or_else(|| CoreError::validation("invalid or expired token"))?;

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(ApiError::internal)?
        .to_string();

    // Also clears the reset pair.
    state
        .db
        .update_user_password(&user.id, &password_hash)
        .map_err(CoreError::Unavailable)?;

    Ok(Json(MessageResponse { message: "password reset successful" }))
}

pub fn create_token(secret: &str, user_id: Uuid, role: Role) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        role,
        exp: (chrono::Utc::now() + chrono::Duration::hours(24)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CapturingNotifier(Mutex<Vec<(String, Notice)>>);

    impl Notifier for CapturingNotifier {
        fn send(&self, to: &str, notice: Notice) {
            self.0.lock().unwrap().push((to.to_string(), notice));
        }
    }

    fn test_state(notifier: Arc<dyn Notifier>) -> AppState {
        Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: "test-secret".into(),
            public_url: "http://localhost:3000".into(),
            notifier,
        })
    }

    async fn register_candidate(state: &AppState, email: &str, password: &str) {
        register(
            State(state.clone()),
            Json(RegisterRequest {
                name: "Ada".into(),
                email: email.into(),
                password: password.into(),
                role: Role::Candidate,
                company: None,
            }),
        )
        .await
        .unwrap();
    }

    /// Request a reset and pull the raw token back out of the emailed link.
    async fn request_reset_token(state: &AppState, notifier: &CapturingNotifier, email: &str) -> String {
        forgot_password(
            State(state.clone()),
            Json(ForgotPasswordRequest { email: email.into() }),
        )
        .await
        .unwrap();

        let sent = notifier.0.lock().unwrap();
        let (_, notice) = sent.last().unwrap();
        match notice {
            Notice::PasswordReset { reset_url } => {
                reset_url.rsplit('/').next().unwrap().to_string()
            }
            other => panic!("expected a password-reset notice, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn reset_token_is_single_use_and_rotates_the_password() {
        let notifier = Arc::new(CapturingNotifier::default());
        let state = test_state(notifier.clone());
        register_candidate(&state, "ada@test.test", "original-pw").await;

        let token = request_reset_token(&state, &notifier, "ada@test.test").await;

        reset_password(
            State(state.clone()),
            Path(token.clone()),
            Json(ResetPasswordRequest { password: "brand-new-pw".into() }),
        )
        .await
        .unwrap();

        // The new password works, the old one is dead.
        login(
            State(state.clone()),
            Json(LoginRequest { email: "ada@test.test".into(), password: "brand-new-pw".into() }),
        )
        .await
        .unwrap();
        assert!(matches!(
            login(
                State(state.clone()),
                Json(LoginRequest {
                    email: "ada@test.test".into(),
                    password: "original-pw".into()
                }),
            )
            .await,
            Err(ApiError(CoreError::Unauthenticated))
        ));

        // The stored pair was cleared, so the token cannot be replayed.
        let replay = reset_password(
            State(state),
            Path(token),
            Json(ResetPasswordRequest { password: "yet-another-pw".into() }),
        )
        .await;
        assert!(matches!(replay, Err(ApiError(CoreError::ValidationFailed(_)))));
    }

    #[tokio::test]
    async fn expired_reset_token_is_rejected() {
        let notifier = Arc::new(CapturingNotifier::default());
        let state = test_state(notifier.clone());
        register_candidate(&state, "ada@test.test", "original-pw").await;

        let token = request_reset_token(&state, &notifier, "ada@test.test").await;

        // Age the stored pair past its window.
        let user = state.db.get_user_by_email("ada@test.test").unwrap().unwrap();
        let digest = hex::encode(Sha256::digest(token.as_bytes()));
        state
            .db
            .set_reset_token(&user.id, &digest, "2000-01-01 00:00:00")
            .unwrap();

        let result = reset_password(
            State(state.clone()),
            Path(token),
            Json(ResetPasswordRequest { password: "brand-new-pw".into() }),
        )
        .await;
        assert!(matches!(result, Err(ApiError(CoreError::ValidationFailed(_)))));

        // The original password is untouched.
        login(
            State(state),
            Json(LoginRequest { email: "ada@test.test".into(), password: "original-pw".into() }),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn register_rejects_an_existing_email() {
        let state = test_state(Arc::new(jobboard_core::notify::NullNotifier));
        register_candidate(&state, "ada@test.test", "original-pw").await;

        let second = register(
            State(state),
            Json(RegisterRequest {
                name: "Ada Again".into(),
                email: "Ada@Test.Test".into(),
                password: "another-pw".into(),
                role: Role::Candidate,
                company: None,
            }),
        )
        .await;
        assert!(matches!(second, Err(ApiError(CoreError::ValidationFailed(_)))));
    }

    #[test]
    fn token_round_trip_preserves_identity_and_role() {
        let user_id = Uuid::new_v4();
        let token = create_token("test-secret", user_id, Role::Employer).unwrap();

        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::default(),
        )
        .unwrap();

        assert_eq!(decoded.claims.sub, user_id);
        assert_eq!(decoded.claims.role, Role::Employer);
    }

    #[test]
    fn token_rejects_wrong_secret() {
        let token = create_token("test-secret", Uuid::new_v4(), Role::Candidate).unwrap();
        let result = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"other-secret"),
            &Validation::default(),
        );
        assert!(result.is_err());
    }
}
