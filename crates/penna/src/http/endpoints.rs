//! Endpoint paths and request/response types.

use serde::{Deserialize, Serialize};

// ============================================================================
// Endpoint Paths
// ============================================================================

/// Account creation.
pub const REGISTER: &str = "users/register/";

/// Token pair issuance.
pub const LOGIN: &str = "users/login/";

/// Access token refresh.
pub const REFRESH: &str = "users/login/refresh/";

/// The signed-in user's profile (GET to read, PUT to update).
pub const PROFILE: &str = "users/profile/";

// ============================================================================
// Request/Response Types
// ============================================================================

// Types carrying tokens or passwords have no Debug impl.

/// Request body for login.
#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Response from login.
#[derive(Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
}

/// Request body for refresh.
#[derive(Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Response from refresh. `refresh` is present only when the API rotates
/// refresh tokens.
#[derive(Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}
