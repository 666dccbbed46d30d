//! Database entities for accounts

use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use serde::{Deserialize, Serialize};

/// Account entity as persisted in the accounts collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountEntity {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub external_user_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub phonetic_name: Option<String>,
    pub label: Option<String>,
    pub company_id: i64,
    pub group_id: i64,
    pub role: String,
    pub password_hash: String,
    pub is_active: bool,
    pub qr_code: Option<String>,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
    pub last_login: Option<bson::DateTime>,
}

impl AccountEntity {
    /// Build a fresh entity with a newly allocated id
    pub fn new(data: AccountCreationData, now: bson::DateTime) -> Self {
        Self {
            id: ObjectId::new(),
            external_user_id: data.external_user_id,
            email: data.email,
            display_name: data.display_name,
            phonetic_name: data.phonetic_name,
            label: data.label,
            company_id: data.company_id,
            group_id: data.group_id,
            role: data.role,
            password_hash: data.password_hash,
            is_active: true,
            qr_code: None,
            created_at: now,
            updated_at: now,
            last_login: None,
        }
    }
}

/// Account creation data for repository
///
/// The password is already hashed by the time it reaches the repository.
#[derive(Debug, Clone)]
pub struct AccountCreationData {
    pub external_user_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub phonetic_name: Option<String>,
    pub label: Option<String>,
    pub company_id: i64,
    pub group_id: i64,
    pub role: String,
    pub password_hash: String,
}

/// Partial update of an account row. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub external_user_id: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub phonetic_name: Option<String>,
    pub label: Option<String>,
    pub company_id: Option<i64>,
    pub group_id: Option<i64>,
    pub role: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
    pub last_login: Option<bson::DateTime>,
}

impl AccountPatch {
    pub fn password(password_hash: String) -> Self {
        Self {
            password_hash: Some(password_hash),
            ..Default::default()
        }
    }

    pub fn last_login(at: bson::DateTime) -> Self {
        Self {
            last_login: Some(at),
            ..Default::default()
        }
    }

    /// Apply the patch to an in-memory entity
    pub fn apply_to(self, entity: &mut AccountEntity, now: bson::DateTime) {
        if let Some(value) = self.external_user_id {
            entity.external_user_id = value;
        }
        if let Some(value) = self.email {
            entity.email = value;
        }
        if let Some(value) = self.display_name {
            entity.display_name = Some(value);
        }
        if let Some(value) = self.phonetic_name {
            entity.phonetic_name = Some(value);
        }
        if let Some(value) = self.label {
            entity.label = Some(value);
        }
        if let Some(value) = self.company_id {
            entity.company_id = value;
        }
        if let Some(value) = self.group_id {
            entity.group_id = value;
        }
        if let Some(value) = self.role {
            entity.role = value;
        }
        if let Some(value) = self.password_hash {
            entity.password_hash = value;
        }
        if let Some(value) = self.is_active {
            entity.is_active = value;
        }
        if let Some(value) = self.last_login {
            entity.last_login = Some(value);
        }
        entity.updated_at = now;
    }

    /// Build the `$set` update document for the patch
    pub fn to_update_document(self, now: bson::DateTime) -> Document {
        let mut set = Document::new();

        let strings = [
            ("external_user_id", self.external_user_id),
            ("email", self.email),
            ("display_name", self.display_name),
            ("phonetic_name", self.phonetic_name),
            ("label", self.label),
            ("role", self.role),
            ("password_hash", self.password_hash),
        ];
        for (field, value) in strings {
            if let Some(value) = value {
                set.insert(field, value);
            }
        }

        if let Some(value) = self.company_id {
            set.insert("company_id", value);
        }
        if let Some(value) = self.group_id {
            set.insert("group_id", value);
        }
        if let Some(value) = self.is_active {
            set.insert("is_active", value);
        }
        if let Some(value) = self.last_login {
            set.insert("last_login", Bson::DateTime(value));
        }
        set.insert("updated_at", Bson::DateTime(now));

        doc! { "$set": set }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creation_data() -> AccountCreationData {
        AccountCreationData {
            external_user_id: "u1".to_string(),
            email: "a@x.com".to_string(),
            display_name: Some("Alice".to_string()),
            phonetic_name: None,
            label: None,
            company_id: 1,
            group_id: 1,
            role: "staff".to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[test]
    fn test_new_entity_defaults() {
        let now = bson::DateTime::now();
        let entity = AccountEntity::new(creation_data(), now);

        assert!(entity.is_active);
        assert!(entity.qr_code.is_none());
        assert!(entity.last_login.is_none());
        assert_eq!(entity.created_at, entity.updated_at);
    }

    #[test]
    fn test_patch_only_touches_given_fields() {
        let created = bson::DateTime::from_millis(1_000);
        let mut entity = AccountEntity::new(creation_data(), created);

        let patch = AccountPatch {
            role: Some("manager".to_string()),
            ..Default::default()
        };
        let later = bson::DateTime::from_millis(2_000);
        patch.apply_to(&mut entity, later);

        assert_eq!(entity.role, "manager");
        assert_eq!(entity.email, "a@x.com");
        assert_eq!(entity.display_name.as_deref(), Some("Alice"));
        assert_eq!(entity.updated_at, later);
        assert_eq!(entity.created_at, created);
    }

    #[test]
    fn test_update_document_sets_only_present_fields() {
        let now = bson::DateTime::from_millis(5_000);
        let update = AccountPatch::password("new-hash".to_string()).to_update_document(now);

        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("password_hash").unwrap(), "new-hash");
        assert_eq!(set.get_datetime("updated_at").unwrap(), &now);
        assert!(!set.contains_key("email"));
        assert!(!set.contains_key("company_id"));
    }
}
