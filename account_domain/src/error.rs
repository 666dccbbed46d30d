use account_data::AccountDataError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Domain-specific account errors
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Validation failed: {0}")]
    ValidationFailed(FieldErrors),

    #[error("Email already taken")]
    DuplicateEmail,

    #[error("User id already taken")]
    DuplicateUserId,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account not found")]
    NotFound,

    #[error("Token is invalid")]
    TokenInvalid,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Token creation error")]
    TokenCreationError,

    #[error("Data error: {0}")]
    DataError(AccountDataError),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<AccountDataError> for AccountError {
    fn from(err: AccountDataError) -> Self {
        match err {
            AccountDataError::DuplicateEmail => AccountError::DuplicateEmail,
            AccountDataError::DuplicateUserId => AccountError::DuplicateUserId,
            AccountDataError::NotFound => AccountError::NotFound,
            other => AccountError::DataError(other),
        }
    }
}

/// Per-field validation messages, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Turn the collected messages into a result
    pub fn into_result(self) -> AuthResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AccountError::ValidationFailed(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, messages.join(", "))?;
            first = false;
        }
        Ok(())
    }
}

/// Result type for account operations
pub type AuthResult<T> = Result<T, AccountError>;
