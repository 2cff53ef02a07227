use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{info, warn};

use herald_types::api::{Claims, LoginRequest, LoginResponse};

use crate::error::ApiError;
use crate::state::AppState;

pub const OPERATOR_SUBJECT: &str = "admin";

/// Hash the operator password with Argon2id for in-memory comparison.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let parsed_hash = PasswordHash::new(&state.auth.password_hash)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        warn!("Rejected operator login");
        return Err(ApiError::Unauthorized);
    }

    let token = create_token(&state.auth.jwt_secret, state.auth.token_ttl)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!("Operator logged in");
    state.record_action("operator login");

    Ok(Json(LoginResponse { token }))
}

fn create_token(secret: &str, ttl: chrono::Duration) -> anyhow::Result<String> {
    let claims = Claims {
        sub: OPERATOR_SUBJECT.to_string(),
        exp: (chrono::Utc::now() + ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

#[cfg(test)]
pub(crate) fn create_test_token(secret: &str, ttl: chrono::Duration) -> String {
    create_token(secret, ttl).unwrap()
}
