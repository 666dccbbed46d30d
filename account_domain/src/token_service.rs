use crate::error::{AccountError, AuthResult};
use crate::models::{TokenClaims, TokenKind, TokenPair};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

/// Longest lifetime accepted for either token kind, ten years
pub const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Process-wide token settings, built once at startup
#[derive(Clone, Debug)]
pub struct TokenConfig {
    pub secret: String,
    pub audience: String,
    pub issuer: String,
    pub algorithm: Algorithm,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    pub fn new(
        secret: String,
        audience: String,
        issuer: String,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            secret,
            audience,
            issuer,
            algorithm: Algorithm::HS256,
            access_ttl,
            refresh_ttl,
        }
    }
}

/// Token service for issuing and verifying stateless access/refresh tokens.
///
/// There is no revocation list: a token stays valid until it expires.
pub trait TokenService: Send + Sync {
    /// Mint an access and a refresh token bound to `account_id`
    fn issue(&self, account_id: &str, now: DateTime<Utc>) -> AuthResult<TokenPair>;

    /// Check an access token's signature, then its expiry against `now`,
    /// and return the account id it was issued for
    fn verify(&self, token: &str, now: DateTime<Utc>) -> AuthResult<String>;
}

pub struct JwtTokenService {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtTokenService {
    pub fn new(config: TokenConfig) -> AuthResult<Self> {
        if config.secret.is_empty() {
            return Err(AccountError::InvalidInput(
                "token secret must not be empty".to_string(),
            ));
        }
        if !matches!(
            config.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(AccountError::InvalidInput(format!(
                "unsupported token algorithm {:?}",
                config.algorithm
            )));
        }
        if config.access_ttl <= Duration::zero() || config.access_ttl >= config.refresh_ttl {
            return Err(AccountError::InvalidInput(
                "access token lifetime must be positive and shorter than the refresh lifetime"
                    .to_string(),
            ));
        }
        if config.refresh_ttl > Duration::seconds(MAX_TOKEN_TTL_SECS) {
            return Err(AccountError::InvalidInput(format!(
                "token lifetime must not exceed {} seconds",
                MAX_TOKEN_TTL_SECS
            )));
        }

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
        })
    }

    fn encode(&self, claims: &TokenClaims) -> AuthResult<String> {
        encode(&Header::new(self.config.algorithm), claims, &self.encoding_key)
            .map_err(|_| AccountError::TokenCreationError)
    }

    fn decode(&self, token: &str) -> AuthResult<TokenClaims> {
        let mut validation = Validation::new(self.config.algorithm);
        // Expiry is checked against the caller's clock, not the system clock
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);

        jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(|_| AccountError::TokenInvalid)
    }

    fn claims(
        &self,
        account_id: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> TokenClaims {
        TokenClaims {
            sub: account_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: kind,
        }
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, account_id: &str, now: DateTime<Utc>) -> AuthResult<TokenPair> {
        let access_expires_at = now
            .checked_add_signed(self.config.access_ttl)
            .ok_or(AccountError::TokenCreationError)?;
        let refresh_expires_at = now
            .checked_add_signed(self.config.refresh_ttl)
            .ok_or(AccountError::TokenCreationError)?;

        let access_token =
            self.encode(&self.claims(account_id, TokenKind::Access, now, access_expires_at))?;
        let refresh_token =
            self.encode(&self.claims(account_id, TokenKind::Refresh, now, refresh_expires_at))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            issued_at: now,
            access_expires_at,
            refresh_expires_at,
        })
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> AuthResult<String> {
        let claims = self.decode(token)?;

        if claims.token_type != TokenKind::Access {
            return Err(AccountError::TokenInvalid);
        }
        if now.timestamp() >= claims.exp {
            return Err(AccountError::TokenExpired);
        }

        Ok(claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config(secret: &str) -> TokenConfig {
        TokenConfig::new(
            secret.to_string(),
            "audience".to_string(),
            "issuer".to_string(),
            Duration::minutes(5),
            Duration::days(1),
        )
    }

    fn service() -> JwtTokenService {
        JwtTokenService::new(config("secret")).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_issue_then_verify_before_expiry() {
        let service = service();
        let pair = service.issue("account-1", now()).unwrap();

        assert_eq!(pair.access_expires_at, now() + Duration::minutes(5));
        assert_eq!(pair.refresh_expires_at, now() + Duration::days(1));
        assert!(pair.access_expires_at < pair.refresh_expires_at);
        assert_ne!(pair.access_token, pair.refresh_token);

        let just_before = pair.access_expires_at - Duration::seconds(1);
        assert_eq!(service.verify(&pair.access_token, now()).unwrap(), "account-1");
        assert_eq!(service.verify(&pair.access_token, just_before).unwrap(), "account-1");
    }

    #[test]
    fn test_verify_after_expiry() {
        let service = service();
        let pair = service.issue("account-1", now()).unwrap();

        let result = service.verify(&pair.access_token, pair.access_expires_at);
        assert!(matches!(result, Err(AccountError::TokenExpired)));

        let result = service.verify(&pair.access_token, now() + Duration::hours(1));
        assert!(matches!(result, Err(AccountError::TokenExpired)));
    }

    #[test]
    fn test_signature_is_checked_before_expiry() {
        let pair = service().issue("account-1", now()).unwrap();
        let other = JwtTokenService::new(config("another-secret")).unwrap();

        let result = other.verify(&pair.access_token, now() + Duration::days(7));
        assert!(matches!(result, Err(AccountError::TokenInvalid)));
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        let result = service().verify("not.a.token", now());
        assert!(matches!(result, Err(AccountError::TokenInvalid)));
    }

    #[test]
    fn test_refresh_token_is_not_an_access_credential() {
        let service = service();
        let pair = service.issue("account-1", now()).unwrap();

        let result = service.verify(&pair.refresh_token, now());
        assert!(matches!(result, Err(AccountError::TokenInvalid)));
    }

    #[test]
    fn test_config_rejects_bad_lifetimes_and_secret() {
        let mut inverted = config("secret");
        inverted.access_ttl = Duration::days(2);
        assert!(matches!(
            JwtTokenService::new(inverted),
            Err(AccountError::InvalidInput(_))
        ));

        assert!(matches!(
            JwtTokenService::new(config("")),
            Err(AccountError::InvalidInput(_))
        ));

        let mut asymmetric = config("secret");
        asymmetric.algorithm = Algorithm::RS256;
        assert!(matches!(
            JwtTokenService::new(asymmetric),
            Err(AccountError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_config_rejects_oversized_lifetime() {
        let mut oversized = config("secret");
        oversized.refresh_ttl = Duration::seconds(MAX_TOKEN_TTL_SECS + 1);
        assert!(matches!(
            JwtTokenService::new(oversized),
            Err(AccountError::InvalidInput(_))
        ));

        let mut longest = config("secret");
        longest.refresh_ttl = Duration::seconds(MAX_TOKEN_TTL_SECS);
        assert!(JwtTokenService::new(longest).is_ok());
    }

    #[test]
    fn test_issue_near_end_of_time_fails_without_panicking() {
        let service = service();
        let result = service.issue("account-1", DateTime::<Utc>::MAX_UTC - Duration::hours(1));
        assert!(matches!(result, Err(AccountError::TokenCreationError)));
    }
}
