use thiserror::Error;

pub type DataResult<T> = Result<T, AccountDataError>;

#[derive(Debug, Error)]
pub enum AccountDataError {
    #[error("Email already taken")]
    DuplicateEmail,

    #[error("User id already taken")]
    DuplicateUserId,

    #[error("Account not found")]
    NotFound,

    #[error("MongoDB error: {0}")]
    MongoError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<mongodb::error::Error> for AccountDataError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::MongoError(err.to_string())
    }
}
