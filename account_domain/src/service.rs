use crate::error::{AccountError, AuthResult, FieldErrors};
use crate::hashing_service::CredentialHasher;
use crate::mappers::account_entity_to_account;
use crate::models::{Account, LoginData, ProfileUpdateData, RegistrationData, TokenPair};
use crate::token_service::TokenService;
use crate::utils::{
    check_email, check_optional_text, check_password, check_required_text, normalize_email,
    REQUIRED,
};
use account_data::entities::{AccountCreationData, AccountPatch};
use account_data::repositories::AccountRepository;
use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

/// Verified against when the login email is unknown, so both failure paths
/// cost one hash verification.
const DUMMY_PASSWORD: &str = "dummy-password-for-timing";

/// Account service trait defining account operations
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Register a new account
    async fn register(&self, data: RegistrationData) -> AuthResult<Account>;

    /// Log in with email and password, returning a fresh token pair
    async fn login(&self, login_data: LoginData) -> AuthResult<TokenPair>;

    /// Get an account by id
    async fn get_account(&self, account_id: &str) -> AuthResult<Account>;

    /// Update account fields, re-hashing any new password
    async fn update_account(&self, account_id: &str, data: ProfileUpdateData)
        -> AuthResult<Account>;

    /// Hard delete an account
    async fn delete_account(&self, account_id: &str) -> AuthResult<()>;

    /// Replace an account's password
    async fn reset_password(&self, account_id: &str, new_password: &str) -> AuthResult<()>;
}

/// Implementation of AccountService
pub struct AccountServiceImpl {
    account_repository: Arc<dyn AccountRepository>,
    token_service: Arc<dyn TokenService>,
    hashing_service: Arc<dyn CredentialHasher>,
    dummy_hash: OnceCell<String>,
}

impl AccountServiceImpl {
    /// Create a new account service instance
    pub fn new(
        account_repository: Arc<dyn AccountRepository>,
        token_service: Arc<dyn TokenService>,
        hashing_service: Arc<dyn CredentialHasher>,
    ) -> Self {
        Self {
            account_repository,
            token_service,
            hashing_service,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Hash on the blocking pool; hashing is deliberately slow.
    async fn hash_password(&self, password: &str) -> AuthResult<String> {
        let hasher = self.hashing_service.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AccountError::InternalError(format!("Hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, password: &str, opaque_hash: &str) -> AuthResult<bool> {
        let hasher = self.hashing_service.clone();
        let password = password.to_owned();
        let opaque_hash = opaque_hash.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &opaque_hash))
            .await
            .map_err(|e| AccountError::InternalError(format!("Verification task failed: {}", e)))
    }

    async fn dummy_hash(&self) -> AuthResult<&str> {
        self.dummy_hash
            .get_or_try_init(|| self.hash_password(DUMMY_PASSWORD))
            .await
            .map(String::as_str)
    }

    /// Fetch an account row, treating a malformed id as a missing account
    async fn find_existing(&self, account_id: &str) -> AuthResult<ObjectId> {
        let id = parse_account_id(account_id)?;
        self.account_repository
            .find_by_id(&id)
            .await
            .map_err(|e| {
                error!("Failed to find account: {}", e);
                AccountError::from(e)
            })?
            .ok_or(AccountError::NotFound)?;
        Ok(id)
    }
}

fn parse_account_id(account_id: &str) -> AuthResult<ObjectId> {
    ObjectId::parse_str(account_id).map_err(|_| AccountError::NotFound)
}

fn validate_registration(data: &RegistrationData, email: &str) -> AuthResult<()> {
    let mut errors = FieldErrors::new();

    check_email(&mut errors, "email", email);
    check_password(&mut errors, "password", &data.password);
    check_required_text(&mut errors, "external_user_id", &data.external_user_id);
    check_required_text(&mut errors, "role", &data.role);
    check_optional_text(&mut errors, "display_name", data.display_name.as_deref());
    check_optional_text(&mut errors, "phonetic_name", data.phonetic_name.as_deref());
    check_optional_text(&mut errors, "label", data.label.as_deref());
    if data.company_id.is_none() {
        errors.add("company_id", REQUIRED);
    }
    if data.group_id.is_none() {
        errors.add("group_id", REQUIRED);
    }

    errors.into_result()
}

fn validate_update(data: &ProfileUpdateData, email: Option<&str>) -> AuthResult<()> {
    let mut errors = FieldErrors::new();

    if let Some(email) = email {
        check_email(&mut errors, "email", email);
    }
    if let Some(password) = &data.password {
        check_password(&mut errors, "password", password);
    }
    if let Some(external_user_id) = &data.external_user_id {
        check_required_text(&mut errors, "external_user_id", external_user_id);
    }
    if let Some(role) = &data.role {
        check_required_text(&mut errors, "role", role);
    }
    check_optional_text(&mut errors, "display_name", data.display_name.as_deref());
    check_optional_text(&mut errors, "phonetic_name", data.phonetic_name.as_deref());
    check_optional_text(&mut errors, "label", data.label.as_deref());

    errors.into_result()
}

#[async_trait]
impl AccountService for AccountServiceImpl {
    async fn register(&self, data: RegistrationData) -> AuthResult<Account> {
        let email = normalize_email(&data.email);
        validate_registration(&data, &email)?;

        let password_hash = self.hash_password(&data.password).await?;

        let account = self
            .account_repository
            .insert(AccountCreationData {
                external_user_id: data.external_user_id,
                email,
                display_name: data.display_name,
                phonetic_name: data.phonetic_name,
                label: data.label,
                company_id: data.company_id.unwrap_or_default(),
                group_id: data.group_id.unwrap_or_default(),
                role: data.role,
                password_hash,
            })
            .await
            .map_err(|e| {
                let e = AccountError::from(e);
                if matches!(e, AccountError::DataError(_)) {
                    error!("Failed to insert account: {}", e);
                }
                e
            })?;

        info!("Registered account {}", account.id);
        Ok(account_entity_to_account(account))
    }

    async fn login(&self, login_data: LoginData) -> AuthResult<TokenPair> {
        let email = normalize_email(&login_data.email);
        let mut errors = FieldErrors::new();
        check_email(&mut errors, "email", &email);
        check_password(&mut errors, "password", &login_data.password);
        errors.into_result()?;

        let account = self
            .account_repository
            .find_by_email(&email)
            .await
            .map_err(|e| {
                error!("Failed to find account by email: {}", e);
                AccountError::from(e)
            })?;

        let account = match account {
            Some(account) => {
                let matches = self
                    .verify_password(&login_data.password, &account.password_hash)
                    .await?;
                if !matches || !account.is_active {
                    warn!("Rejected login attempt");
                    return Err(AccountError::InvalidCredentials);
                }
                account
            }
            None => {
                let dummy_hash = self.dummy_hash().await?;
                self.verify_password(&login_data.password, dummy_hash).await?;
                warn!("Rejected login attempt");
                return Err(AccountError::InvalidCredentials);
            }
        };

        let now = Utc::now();
        let tokens = self
            .token_service
            .issue(&account.id.to_hex(), now)
            .map_err(|e| {
                error!("Failed to issue tokens: {}", e);
                e
            })?;

        if let Err(e) = self
            .account_repository
            .update(&account.id, AccountPatch::last_login(now.into()))
            .await
        {
            warn!("Failed to record last login for {}: {}", account.id, e);
        }

        info!("Account {} logged in", account.id);
        Ok(tokens)
    }

    async fn get_account(&self, account_id: &str) -> AuthResult<Account> {
        let id = parse_account_id(account_id)?;
        let account = self
            .account_repository
            .find_by_id(&id)
            .await
            .map_err(|e| {
                error!("Failed to find account: {}", e);
                AccountError::from(e)
            })?
            .ok_or(AccountError::NotFound)?;

        Ok(account_entity_to_account(account))
    }

    async fn update_account(
        &self,
        account_id: &str,
        data: ProfileUpdateData,
    ) -> AuthResult<Account> {
        let id = self.find_existing(account_id).await?;

        let email = data.email.as_deref().map(normalize_email);
        validate_update(&data, email.as_deref())?;

        let password_hash = match &data.password {
            Some(password) => Some(self.hash_password(password).await?),
            None => None,
        };
        let password_changed = password_hash.is_some();

        let patch = AccountPatch {
            external_user_id: data.external_user_id,
            email,
            display_name: data.display_name,
            phonetic_name: data.phonetic_name,
            label: data.label,
            company_id: data.company_id,
            group_id: data.group_id,
            role: data.role,
            password_hash,
            ..Default::default()
        };

        let account = self
            .account_repository
            .update(&id, patch)
            .await
            .map_err(|e| {
                let e = AccountError::from(e);
                if matches!(e, AccountError::DataError(_)) {
                    error!("Failed to update account: {}", e);
                }
                e
            })?;

        if password_changed {
            info!("Password changed for account {}", account.id);
        }
        info!("Updated account {}", account.id);
        Ok(account_entity_to_account(account))
    }

    async fn delete_account(&self, account_id: &str) -> AuthResult<()> {
        let id = parse_account_id(account_id)?;
        self.account_repository.delete(&id).await.map_err(|e| {
            let e = AccountError::from(e);
            if matches!(e, AccountError::DataError(_)) {
                error!("Failed to delete account: {}", e);
            }
            e
        })?;

        info!("Deleted account {}", id);
        Ok(())
    }

    async fn reset_password(&self, account_id: &str, new_password: &str) -> AuthResult<()> {
        let id = self.find_existing(account_id).await?;

        let mut errors = FieldErrors::new();
        check_password(&mut errors, "password", new_password);
        errors.into_result()?;

        let password_hash = self.hash_password(new_password).await?;
        self.account_repository
            .update(&id, AccountPatch::password(password_hash))
            .await
            .map_err(|e| {
                let e = AccountError::from(e);
                if matches!(e, AccountError::DataError(_)) {
                    error!("Failed to reset password: {}", e);
                }
                e
            })?;

        info!("Password reset for account {}", id);
        Ok(())
    }
}
