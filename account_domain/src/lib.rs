//! Account domain: validation, credential hashing, token issuance and the
//! account service built on top of the data layer.

pub mod error;
pub mod hashing_service;
pub mod models;
pub mod service;
pub mod token_service;
mod mappers;
mod utils;

pub use error::{AccountError, AuthResult, FieldErrors};
pub use hashing_service::{CredentialHasher, Pbkdf2HashingService, DEFAULT_ITERATIONS};
pub use models::{Account, LoginData, ProfileUpdateData, RegistrationData, TokenPair};
pub use service::{AccountService, AccountServiceImpl};
pub use token_service::{JwtTokenService, TokenConfig, TokenService, MAX_TOKEN_TTL_SECS};
