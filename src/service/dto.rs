//! Request and response bodies of the HTTP API

use account_domain::Account;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Missing string fields decode as empty so they surface as field errors.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
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

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateAccountRequest {
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

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResetPasswordRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub message: String,
    pub account: Account,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Token pair plus lifetimes in seconds and absolute expiry instants
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires: i64,
    pub refresh_expires: i64,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}
