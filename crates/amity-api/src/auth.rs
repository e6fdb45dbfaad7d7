use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use amity_core::{Error, Lifecycle, identity};
use amity_db::Database;
use amity_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub lifecycle: Lifecycle,
    pub jwt_secret: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Password is checked before hashing; username/email are validated
    // inside create_user before any store mutation.
    identity::validate_password(&req.password)?;

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| ApiError::internal(format!("password hashing failed: {e}")))?
        .to_string();

    let db = state.db.clone();
    let user = tokio::task::spawn_blocking(move || {
        identity::create_user(&db, &req.username, &req.email, &password_hash)
    })
    .await
    .map_err(|e| ApiError::internal(format!("spawn_blocking join error: {e}")))??;

    let token = create_token(&state.jwt_secret, user.id, &user.username)
        .map_err(|e| ApiError::internal(format!("token signing failed: {e}")))?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id,
            username: user.username,
            email: user.email,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let email = req.email.clone();
    let found = tokio::task::spawn_blocking(move || identity::credential_by_email(&db, &email))
        .await
        .map_err(|e| ApiError::internal(format!("spawn_blocking join error: {e}")))??;

    // Unknown email and wrong password are indistinguishable to the caller.
    let (user, stored_hash) = found.ok_or(Error::Unauthenticated)?;

    let parsed_hash = PasswordHash::new(&stored_hash)
        .map_err(|e| ApiError::internal(format!("stored credential unreadable: {e}")))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| Error::Unauthenticated)?;

    let token = create_token(&state.jwt_secret, user.id, &user.username)
        .map_err(|e| ApiError::internal(format!("token signing failed: {e}")))?;

    Ok(Json(LoginResponse {
        user_id: user.id,
        username: user.username,
        token,
    }))
}

fn create_token(secret: &str, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
