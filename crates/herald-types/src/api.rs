use serde::{Deserialize, Serialize};

// -- Auth --

/// Token claims for the operator session. There is a single operator
/// account, so `sub` is always `"admin"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

// -- Broadcasts --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BroadcastRequest {
    pub message: String,
}

// -- Recipients --

#[derive(Debug, Serialize, Deserialize)]
pub struct BlockResponse {
    pub id: i64,
    pub blocked: bool,
}

// -- Misc --

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
