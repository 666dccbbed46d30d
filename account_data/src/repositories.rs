//! Repository implementations for account data access

use crate::entities::{AccountCreationData, AccountEntity, AccountPatch};
use crate::error::AccountDataError;
use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Name of the unique index on `email`
pub const EMAIL_INDEX: &str = "email_unique";

/// Name of the unique index on `external_user_id`
pub const USER_ID_INDEX: &str = "external_user_id_unique";

const DUPLICATE_KEY_CODE: i32 = 11000;

/// Account repository trait
///
/// Implementations enforce uniqueness of `email` and `external_user_id` at the
/// storage level: `insert` and `update` report a conflict instead of the caller
/// checking first.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Find an account by ID
    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<AccountEntity>, AccountDataError>;

    /// Find an account by its normalized email
    async fn find_by_email(&self, email: &str) -> Result<Option<AccountEntity>, AccountDataError>;

    /// Insert a new account, failing on a duplicate email or user id
    async fn insert(&self, data: AccountCreationData) -> Result<AccountEntity, AccountDataError>;

    /// Atomically apply a patch and return the updated account
    async fn update(
        &self,
        id: &ObjectId,
        patch: AccountPatch,
    ) -> Result<AccountEntity, AccountDataError>;

    /// Hard delete an account
    async fn delete(&self, id: &ObjectId) -> Result<(), AccountDataError>;
}

/// MongoDB implementation of AccountRepository
pub struct MongoAccountRepository {
    db: Arc<RwLock<Database>>,
    collection_name: String,
}

impl MongoAccountRepository {
    /// Create a new MongoDB account repository
    pub fn new(db: Arc<RwLock<Database>>, collection_name: String) -> Self {
        Self {
            db,
            collection_name,
        }
    }

    /// Get the accounts collection
    async fn collection(&self) -> Collection<AccountEntity> {
        self.db.read().await.collection(&self.collection_name)
    }

    /// Create the unique indexes backing the uniqueness invariants.
    ///
    /// Must run before the repository serves writes.
    pub async fn ensure_indexes(&self) -> Result<(), AccountDataError> {
        let collection = self.collection().await;

        let indexes = [("email", EMAIL_INDEX), ("external_user_id", USER_ID_INDEX)]
            .into_iter()
            .map(|(field, name)| {
                let mut keys = Document::new();
                keys.insert(field, 1);
                IndexModel::builder()
                    .keys(keys)
                    .options(
                        IndexOptions::builder()
                            .unique(true)
                            .name(name.to_string())
                            .build(),
                    )
                    .build()
            });

        collection.create_indexes(indexes).await?;
        tracing::info!("Ensured unique indexes on {}", self.collection_name);
        Ok(())
    }
}

/// Translate a duplicate key error into the matching conflict
fn map_write_error(err: mongodb::error::Error) -> AccountDataError {
    let duplicate = match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE =>
        {
            Some(write_error.message.clone())
        }
        ErrorKind::Command(command_error) if command_error.code == DUPLICATE_KEY_CODE => {
            Some(command_error.message.clone())
        }
        _ => None,
    };

    let Some(message) = duplicate else {
        return err.into();
    };

    if message.contains(EMAIL_INDEX) {
        AccountDataError::DuplicateEmail
    } else if message.contains(USER_ID_INDEX) {
        AccountDataError::DuplicateUserId
    } else {
        AccountDataError::InternalError(format!("Unexpected duplicate key: {}", message))
    }
}

#[async_trait]
impl AccountRepository for MongoAccountRepository {
    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<AccountEntity>, AccountDataError> {
        let filter = doc! { "_id": id };
        let coll = self.collection().await;
        let result = coll.find_one(filter).await?;
        Ok(result)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<AccountEntity>, AccountDataError> {
        let filter = doc! { "email": email };
        let coll = self.collection().await;
        let result = coll.find_one(filter).await?;
        Ok(result)
    }

    async fn insert(&self, data: AccountCreationData) -> Result<AccountEntity, AccountDataError> {
        let account = AccountEntity::new(data, bson::DateTime::now());

        let collection = self.collection().await;
        collection
            .insert_one(&account)
            .await
            .map_err(map_write_error)?;

        tracing::info!("Inserted account with id: {}", account.id);
        Ok(account)
    }

    async fn update(
        &self,
        id: &ObjectId,
        patch: AccountPatch,
    ) -> Result<AccountEntity, AccountDataError> {
        let collection = self.collection().await;
        let filter = doc! { "_id": id };
        let update = patch.to_update_document(bson::DateTime::now());

        collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await
            .map_err(map_write_error)?
            .ok_or(AccountDataError::NotFound)
    }

    async fn delete(&self, id: &ObjectId) -> Result<(), AccountDataError> {
        let collection = self.collection().await;
        let filter = doc! { "_id": id };

        let result = collection.delete_one(filter).await?;
        if result.deleted_count == 0 {
            return Err(AccountDataError::NotFound);
        }

        tracing::info!("Deleted account with id: {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::{options::ClientOptions, Client};

    async fn setup_test_repo() -> MongoAccountRepository {
        let mongo_uri = std::env::var("MONGO_DB_URI").expect("MONGO_DB_URI must be set");
        let client_options = ClientOptions::parse(&mongo_uri).await.unwrap();
        let client = Client::with_options(client_options).unwrap();
        let db = client.database("test_account_db");

        // Clean up test data
        db.collection::<Document>("test_accounts")
            .delete_many(doc! {})
            .await
            .unwrap();

        let repo =
            MongoAccountRepository::new(Arc::new(RwLock::new(db)), "test_accounts".to_string());
        repo.ensure_indexes().await.unwrap();
        repo
    }

    fn creation_data(email: &str, user_id: &str) -> AccountCreationData {
        AccountCreationData {
            external_user_id: user_id.to_string(),
            email: email.to_string(),
            display_name: Some("Test User".to_string()),
            phonetic_name: None,
            label: None,
            company_id: 1,
            group_id: 1,
            role: "staff".to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    #[ignore = "requires MONGO_DB_URI"]
    async fn test_insert_and_find_account() {
        let repo = setup_test_repo().await;

        let created = repo.insert(creation_data("a@x.com", "u1")).await.unwrap();

        let by_id = repo.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@x.com");

        let by_email = repo.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
    }

    #[tokio::test]
    #[ignore = "requires MONGO_DB_URI"]
    async fn test_unique_indexes_reject_duplicates() {
        let repo = setup_test_repo().await;
        repo.insert(creation_data("a@x.com", "u1")).await.unwrap();

        let same_email = repo.insert(creation_data("a@x.com", "u2")).await;
        assert!(matches!(same_email, Err(AccountDataError::DuplicateEmail)));

        let same_user_id = repo.insert(creation_data("b@x.com", "u1")).await;
        assert!(matches!(same_user_id, Err(AccountDataError::DuplicateUserId)));
    }

    #[tokio::test]
    #[ignore = "requires MONGO_DB_URI"]
    async fn test_update_returns_post_image() {
        let repo = setup_test_repo().await;
        let created = repo.insert(creation_data("a@x.com", "u1")).await.unwrap();

        let patch = AccountPatch {
            role: Some("manager".to_string()),
            ..Default::default()
        };
        let updated = repo.update(&created.id, patch).await.unwrap();
        assert_eq!(updated.role, "manager");

        let missing = repo.update(&ObjectId::new(), AccountPatch::default()).await;
        assert!(matches!(missing, Err(AccountDataError::NotFound)));
    }

    #[tokio::test]
    #[ignore = "requires MONGO_DB_URI"]
    async fn test_update_to_taken_email_conflicts() {
        let repo = setup_test_repo().await;
        repo.insert(creation_data("a@x.com", "u1")).await.unwrap();
        let second = repo.insert(creation_data("b@x.com", "u2")).await.unwrap();

        let patch = AccountPatch {
            email: Some("a@x.com".to_string()),
            ..Default::default()
        };
        let result = repo.update(&second.id, patch).await;
        assert!(matches!(result, Err(AccountDataError::DuplicateEmail)));
    }

    #[tokio::test]
    #[ignore = "requires MONGO_DB_URI"]
    async fn test_delete_account() {
        let repo = setup_test_repo().await;
        let created = repo.insert(creation_data("a@x.com", "u1")).await.unwrap();

        repo.delete(&created.id).await.unwrap();
        assert!(repo.find_by_id(&created.id).await.unwrap().is_none());

        let again = repo.delete(&created.id).await;
        assert!(matches!(again, Err(AccountDataError::NotFound)));
    }
}
