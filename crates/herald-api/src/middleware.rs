use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use herald_types::api::Claims;

use crate::auth::OPERATOR_SUBJECT;
use crate::error::ApiError;
use crate::state::AppState;

/// Extract and validate the operator JWT from the Authorization header.
pub async fn require_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.auth.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized)?;

    if token_data.claims.sub != OPERATOR_SUBJECT {
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(req).await)
}
