use crate::service::dto::{LoginRequest, LoginResponse, RegisterRequest, UpdateAccountRequest};
use account_domain::{
    AccountError, FieldErrors, LoginData, ProfileUpdateData, RegistrationData, TokenPair,
};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::fmt;
use tracing::error;

impl From<RegisterRequest> for RegistrationData {
    fn from(request: RegisterRequest) -> Self {
        RegistrationData {
            email: request.email,
            password: request.password,
            external_user_id: request.external_user_id,
            display_name: request.display_name,
            phonetic_name: request.phonetic_name,
            label: request.label,
            company_id: request.company_id,
            group_id: request.group_id,
            role: request.role,
        }
    }
}

impl From<UpdateAccountRequest> for ProfileUpdateData {
    fn from(request: UpdateAccountRequest) -> Self {
        ProfileUpdateData {
            external_user_id: request.external_user_id,
            email: request.email,
            display_name: request.display_name,
            phonetic_name: request.phonetic_name,
            label: request.label,
            company_id: request.company_id,
            group_id: request.group_id,
            role: request.role,
            password: request.password,
        }
    }
}

impl From<LoginRequest> for LoginData {
    fn from(request: LoginRequest) -> Self {
        LoginData {
            email: request.email,
            password: request.password,
        }
    }
}

impl From<TokenPair> for LoginResponse {
    fn from(tokens: TokenPair) -> Self {
        LoginResponse {
            access_expires: (tokens.access_expires_at - tokens.issued_at).num_seconds(),
            refresh_expires: (tokens.refresh_expires_at - tokens.issued_at).num_seconds(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            access_expires_at: tokens.access_expires_at,
            refresh_expires_at: tokens.refresh_expires_at,
        }
    }
}

/// Error returned by every HTTP handler
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub errors: Option<FieldErrors>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error_message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a FieldErrors>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    fn validation(errors: FieldErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Validation failed".to_string(),
            errors: Some(errors),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error_message: &self.message,
            errors: self.errors.as_ref(),
        });

        (self.status, body).into_response()
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            // 400 Bad Request
            AccountError::ValidationFailed(errors) => ApiError::validation(errors),
            AccountError::DuplicateEmail => ApiError::bad_request("Email already taken"),
            AccountError::DuplicateUserId => ApiError::bad_request("User id already taken"),
            AccountError::InvalidInput(message) => ApiError::bad_request(message),

            // 401 Unauthorized
            AccountError::InvalidCredentials => ApiError::unauthorized("Invalid credentials"),
            AccountError::TokenInvalid => ApiError::unauthorized("Token is invalid"),
            AccountError::TokenExpired => ApiError::unauthorized("Token has expired"),

            // 404 Not Found
            AccountError::NotFound => ApiError::not_found("Account not found"),

            // 500 Internal Server Error, details stay in the log
            err @ (AccountError::TokenCreationError
            | AccountError::DataError(_)
            | AccountError::InternalError(_)) => {
                error!(error = %err, "request failed");
                ApiError::internal()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use account_data::AccountDataError;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AccountError::ValidationFailed(FieldErrors::new()), StatusCode::BAD_REQUEST),
            (AccountError::DuplicateEmail, StatusCode::BAD_REQUEST),
            (AccountError::DuplicateUserId, StatusCode::BAD_REQUEST),
            (AccountError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AccountError::TokenExpired, StatusCode::UNAUTHORIZED),
            (AccountError::TokenInvalid, StatusCode::UNAUTHORIZED),
            (AccountError::NotFound, StatusCode::NOT_FOUND),
            (
                AccountError::DataError(AccountDataError::MongoError("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = ApiError::from(AccountError::InternalError("pool exhausted".into()));
        assert_eq!(err.message, "Internal server error");
        assert!(err.errors.is_none());
    }

    #[test]
    fn test_login_response_lifetimes() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let response = LoginResponse::from(TokenPair {
            access_token: "a".into(),
            refresh_token: "r".into(),
            issued_at: now,
            access_expires_at: now + Duration::minutes(5),
            refresh_expires_at: now + Duration::days(1),
        });

        assert_eq!(response.access_expires, 300);
        assert_eq!(response.refresh_expires, 86_400);
    }
}
