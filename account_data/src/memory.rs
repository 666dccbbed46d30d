//! In-memory account repository
//!
//! Used for local development and for tests that should not need a running
//! MongoDB. A single lock guards the rows together with both uniqueness
//! indexes, so every write is one critical section.

use crate::entities::{AccountCreationData, AccountEntity, AccountPatch};
use crate::error::AccountDataError;
use crate::repositories::AccountRepository;
use async_trait::async_trait;
use bson::oid::ObjectId;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    accounts: HashMap<ObjectId, AccountEntity>,
    by_email: HashMap<String, ObjectId>,
    by_user_id: HashMap<String, ObjectId>,
}

impl Tables {
    fn check_unique(
        &self,
        id: Option<&ObjectId>,
        email: &str,
        external_user_id: &str,
    ) -> Result<(), AccountDataError> {
        let taken_by_other = |owner: Option<&ObjectId>| match (owner, id) {
            (Some(owner), Some(id)) => owner != id,
            (Some(_), None) => true,
            (None, _) => false,
        };

        if taken_by_other(self.by_email.get(email)) {
            return Err(AccountDataError::DuplicateEmail);
        }
        if taken_by_other(self.by_user_id.get(external_user_id)) {
            return Err(AccountDataError::DuplicateUserId);
        }
        Ok(())
    }
}

/// In-memory implementation of AccountRepository
#[derive(Default)]
pub struct InMemoryAccountRepository {
    tables: RwLock<Tables>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts
    pub async fn len(&self) -> usize {
        self.tables.read().await.accounts.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<AccountEntity>, AccountDataError> {
        Ok(self.tables.read().await.accounts.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<AccountEntity>, AccountDataError> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_email
            .get(email)
            .and_then(|id| tables.accounts.get(id))
            .cloned())
    }

    async fn insert(&self, data: AccountCreationData) -> Result<AccountEntity, AccountDataError> {
        let mut tables = self.tables.write().await;
        tables.check_unique(None, &data.email, &data.external_user_id)?;

        let account = AccountEntity::new(data, bson::DateTime::now());
        tables.by_email.insert(account.email.clone(), account.id);
        tables
            .by_user_id
            .insert(account.external_user_id.clone(), account.id);
        tables.accounts.insert(account.id, account.clone());

        tracing::info!("Inserted account with id: {}", account.id);
        Ok(account)
    }

    async fn update(
        &self,
        id: &ObjectId,
        patch: AccountPatch,
    ) -> Result<AccountEntity, AccountDataError> {
        let mut tables = self.tables.write().await;
        let current = tables
            .accounts
            .get(id)
            .cloned()
            .ok_or(AccountDataError::NotFound)?;

        let mut updated = current.clone();
        patch.apply_to(&mut updated, bson::DateTime::now());
        tables.check_unique(Some(id), &updated.email, &updated.external_user_id)?;

        if updated.email != current.email {
            tables.by_email.remove(&current.email);
            tables.by_email.insert(updated.email.clone(), *id);
        }
        if updated.external_user_id != current.external_user_id {
            tables.by_user_id.remove(&current.external_user_id);
            tables
                .by_user_id
                .insert(updated.external_user_id.clone(), *id);
        }
        tables.accounts.insert(*id, updated.clone());

        Ok(updated)
    }

    async fn delete(&self, id: &ObjectId) -> Result<(), AccountDataError> {
        let mut tables = self.tables.write().await;
        let removed = tables
            .accounts
            .remove(id)
            .ok_or(AccountDataError::NotFound)?;

        tables.by_email.remove(&removed.email);
        tables.by_user_id.remove(&removed.external_user_id);

        tracing::info!("Deleted account with id: {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn creation_data(email: &str, user_id: &str) -> AccountCreationData {
        AccountCreationData {
            external_user_id: user_id.to_string(),
            email: email.to_string(),
            display_name: None,
            phonetic_name: None,
            label: None,
            company_id: 1,
            group_id: 1,
            role: "staff".to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = InMemoryAccountRepository::new();
        let created = repo.insert(creation_data("a@x.com", "u1")).await.unwrap();

        let by_id = repo.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.external_user_id, "u1");

        let by_email = repo.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        assert!(repo.find_by_email("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicates() {
        let repo = InMemoryAccountRepository::new();
        repo.insert(creation_data("a@x.com", "u1")).await.unwrap();

        let same_email = repo.insert(creation_data("a@x.com", "u2")).await;
        assert!(matches!(same_email, Err(AccountDataError::DuplicateEmail)));

        let same_user_id = repo.insert(creation_data("b@x.com", "u1")).await;
        assert!(matches!(same_user_id, Err(AccountDataError::DuplicateUserId)));

        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_with_same_email() {
        let repo = Arc::new(InMemoryAccountRepository::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.insert(creation_data("race@x.com", &format!("u{}", i)))
                        .await
                })
            })
            .collect();

        let mut succeeded = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(AccountDataError::DuplicateEmail) => duplicates += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        assert_eq!(succeeded, 1);
        assert_eq!(duplicates, 15);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_moves_unique_keys() {
        let repo = InMemoryAccountRepository::new();
        let first = repo.insert(creation_data("a@x.com", "u1")).await.unwrap();
        let second = repo.insert(creation_data("b@x.com", "u2")).await.unwrap();

        let taken = AccountPatch {
            email: Some("a@x.com".to_string()),
            ..Default::default()
        };
        let result = repo.update(&second.id, taken).await;
        assert!(matches!(result, Err(AccountDataError::DuplicateEmail)));

        // Rejected update leaves the row untouched
        let unchanged = repo.find_by_id(&second.id).await.unwrap().unwrap();
        assert_eq!(unchanged.email, "b@x.com");

        let moved = AccountPatch {
            email: Some("c@x.com".to_string()),
            ..Default::default()
        };
        repo.update(&first.id, moved).await.unwrap();
        assert!(repo.find_by_email("a@x.com").await.unwrap().is_none());
        assert_eq!(
            repo.find_by_email("c@x.com").await.unwrap().unwrap().id,
            first.id
        );

        // Keeping your own email is not a conflict
        let same = AccountPatch {
            email: Some("c@x.com".to_string()),
            ..Default::default()
        };
        assert!(repo.update(&first.id, same).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_missing_account() {
        let repo = InMemoryAccountRepository::new();
        let result = repo.update(&ObjectId::new(), AccountPatch::default()).await;
        assert!(matches!(result, Err(AccountDataError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_frees_unique_keys() {
        let repo = InMemoryAccountRepository::new();
        let created = repo.insert(creation_data("a@x.com", "u1")).await.unwrap();

        repo.delete(&created.id).await.unwrap();
        assert!(repo.is_empty().await);

        let again = repo.delete(&created.id).await;
        assert!(matches!(again, Err(AccountDataError::NotFound)));

        let recreated = repo.insert(creation_data("a@x.com", "u1")).await.unwrap();
        assert_ne!(recreated.id, created.id);
    }
}
