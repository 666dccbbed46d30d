use account_domain::{TokenConfig, DEFAULT_ITERATIONS, MAX_TOKEN_TTL_SECS};
use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::num::NonZeroU32;

/// Where account rows live
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

/// Process settings, read from flags with environment fallbacks
#[derive(Parser, Debug, Clone)]
#[command(name = "account-service")]
#[command(about = "Account registration, login and profile management over HTTP")]
pub struct Settings {
    #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "SERVER_PORT", default_value_t = 8080)]
    pub port: u16,

    #[arg(long, env = "STORAGE_BACKEND", value_enum, default_value_t = StorageBackend::Mongo)]
    pub storage_backend: StorageBackend,

    #[arg(long, env = "MONGO_DB_URI", default_value = "mongodb://localhost:27017")]
    pub mongo_uri: String,

    #[arg(long, env = "MONGO_DB_NAME", default_value = "account_service")]
    pub mongo_db_name: String,

    #[arg(long, env = "ACCOUNTS_COLLECTION", default_value = "accounts")]
    pub accounts_collection: String,

    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    #[arg(long, env = "JWT_ISSUER", default_value = "account-service")]
    pub jwt_issuer: String,

    #[arg(long, env = "JWT_AUDIENCE", default_value = "account-service")]
    pub jwt_audience: String,

    /// Access token lifetime in seconds
    #[arg(long, env = "ACCESS_TOKEN_TTL_SECS", default_value_t = 300)]
    pub access_token_ttl_secs: i64,

    /// Refresh token lifetime in seconds
    #[arg(long, env = "REFRESH_TOKEN_TTL_SECS", default_value_t = 86_400)]
    pub refresh_token_ttl_secs: i64,

    #[arg(long, env = "PBKDF2_ITERATIONS", default_value_t = DEFAULT_ITERATIONS)]
    pub pbkdf2_iterations: u32,
}

impl Settings {
    /// Reject settings the service cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jwt_secret.is_empty() {
            bail!("JWT_SECRET must not be empty");
        }
        if self.access_token_ttl_secs <= 0 {
            bail!("ACCESS_TOKEN_TTL_SECS must be positive");
        }
        if self.access_token_ttl_secs >= self.refresh_token_ttl_secs {
            bail!(
                "ACCESS_TOKEN_TTL_SECS ({}) must be less than REFRESH_TOKEN_TTL_SECS ({})",
                self.access_token_ttl_secs,
                self.refresh_token_ttl_secs
            );
        }
        if self.refresh_token_ttl_secs > MAX_TOKEN_TTL_SECS {
            bail!(
                "REFRESH_TOKEN_TTL_SECS ({}) must not exceed {}",
                self.refresh_token_ttl_secs,
                MAX_TOKEN_TTL_SECS
            );
        }
        self.iterations()?;
        Ok(())
    }

    pub fn iterations(&self) -> anyhow::Result<NonZeroU32> {
        NonZeroU32::new(self.pbkdf2_iterations).context("PBKDF2_ITERATIONS must be at least 1")
    }

    pub fn token_config(&self) -> anyhow::Result<TokenConfig> {
        let access_ttl = chrono::Duration::try_seconds(self.access_token_ttl_secs)
            .context("ACCESS_TOKEN_TTL_SECS is out of range")?;
        let refresh_ttl = chrono::Duration::try_seconds(self.refresh_token_ttl_secs)
            .context("REFRESH_TOKEN_TTL_SECS is out of range")?;

        Ok(TokenConfig::new(
            self.jwt_secret.clone(),
            self.jwt_audience.clone(),
            self.jwt_issuer.clone(),
            access_ttl,
            refresh_ttl,
        ))
    }

    pub fn bind_address(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
