use crate::error::{AccountError, AuthResult};
use rand::{thread_rng, RngCore};
use ring::pbkdf2;
use std::num::NonZeroU32;

const ALGORITHM_TAG: &str = "pbkdf2_sha256";
const SALT_LENGTH: usize = 16;
const HASH_LENGTH: usize = 32;

/// Default PBKDF2 work factor for production hashing
pub const DEFAULT_ITERATIONS: u32 = 600_000;

/// One-way password hashing with constant-time verification
pub trait CredentialHasher: Send + Sync {
    /// Hash a plaintext password into an opaque, self-describing string
    fn hash(&self, plaintext: &str) -> AuthResult<String>;

    /// Check a plaintext password against an opaque hash.
    /// Malformed hashes never match.
    fn verify(&self, plaintext: &str, opaque_hash: &str) -> bool;
}

/// PBKDF2-HMAC-SHA256 hasher producing `pbkdf2_sha256$<iterations>$<salt>$<hash>`
#[derive(Clone, Debug)]
pub struct Pbkdf2HashingService {
    iterations: NonZeroU32,
}

impl Pbkdf2HashingService {
    pub fn new(iterations: NonZeroU32) -> Self {
        Pbkdf2HashingService { iterations }
    }
}

struct ParsedHash {
    iterations: NonZeroU32,
    salt: Vec<u8>,
    hash: Vec<u8>,
}

fn parse(opaque_hash: &str) -> Option<ParsedHash> {
    let mut parts = opaque_hash.split('$');
    if parts.next()? != ALGORITHM_TAG {
        return None;
    }
    let iterations = parts.next()?.parse::<u32>().ok().and_then(NonZeroU32::new)?;
    let salt = hex::decode(parts.next()?).ok()?;
    let hash = hex::decode(parts.next()?).ok()?;
    if parts.next().is_some() || salt.is_empty() || hash.len() != HASH_LENGTH {
        return None;
    }

    Some(ParsedHash {
        iterations,
        salt,
        hash,
    })
}

impl CredentialHasher for Pbkdf2HashingService {
    fn hash(&self, plaintext: &str) -> AuthResult<String> {
        if plaintext.is_empty() {
            return Err(AccountError::InvalidInput(
                "password must not be empty".to_string(),
            ));
        }

        let mut salt = [0u8; SALT_LENGTH];
        thread_rng().fill_bytes(&mut salt);

        let mut hash = [0u8; HASH_LENGTH];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            self.iterations,
            &salt,
            plaintext.as_bytes(),
            &mut hash,
        );

        Ok(format!(
            "{}${}${}${}",
            ALGORITHM_TAG,
            self.iterations,
            hex::encode(salt),
            hex::encode(hash)
        ))
    }

    fn verify(&self, plaintext: &str, opaque_hash: &str) -> bool {
        let Some(parsed) = parse(opaque_hash) else {
            return false;
        };

        // Iterations come from the stored hash so a changed work factor
        // does not invalidate existing credentials.
        pbkdf2::verify(
            pbkdf2::PBKDF2_HMAC_SHA256,
            parsed.iterations,
            &parsed.salt,
            plaintext.as_bytes(),
            &parsed.hash,
        )
        .is_ok()
    }
}
