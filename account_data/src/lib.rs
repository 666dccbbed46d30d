//! Data layer for accounts
//!
//! This module contains the data access layer for the account service,
//! including database entities, repositories, and data-specific errors.

pub mod entities;
pub mod repositories;
pub mod memory;
pub mod error;

pub use entities::*;
pub use repositories::*;
pub use memory::InMemoryAccountRepository;
pub use error::*;
