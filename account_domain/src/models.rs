use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account as exposed to callers. Carries no credential material.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub id: String,
    pub external_user_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub phonetic_name: Option<String>,
    pub label: Option<String>,
    pub company_id: i64,
    pub group_id: i64,
    pub role: String,
    pub is_active: bool,
    pub qr_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Fields accepted by registration
///
/// The classification integers are optional here so that a missing value is
/// reported as a field error rather than a decoding failure.
#[derive(Debug, Clone, Default)]
pub struct RegistrationData {
    pub email: String,
    pub password: String,
    pub external_user_id: String,
    pub display_name: Option<String>,
    pub phonetic_name: Option<String>,
    pub label: Option<String>,
    pub company_id: Option<i64>,
    pub group_id: Option<i64>,
    pub role: String,
}

/// Fields accepted by a profile update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdateData {
    pub external_user_id: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub phonetic_name: Option<String>,
    pub label: Option<String>,
    pub company_id: Option<i64>,
    pub group_id: Option<i64>,
    pub role: Option<String>,
    pub password: Option<String>,
}

/// Login credentials
#[derive(Debug, Clone)]
pub struct LoginData {
    pub email: String,
    pub password: String,
}

/// Kind of a signed token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims carried by access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,           // Account ID
    pub iat: i64,              // Issued at
    pub exp: i64,              // Expiration
    pub iss: String,           // Issuer
    pub aud: String,           // Audience
    pub jti: String,           // Unique token identifier
    pub token_type: TokenKind,
}

/// Access and refresh token pair returned by login
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub issued_at: DateTime<Utc>,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}
