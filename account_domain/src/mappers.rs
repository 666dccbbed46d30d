use crate::models::Account;
use account_data::entities::AccountEntity;

pub fn account_entity_to_account(account: AccountEntity) -> Account {
    Account {
        id: account.id.to_hex(),
        external_user_id: account.external_user_id,
        email: account.email,
        display_name: account.display_name,
        phonetic_name: account.phonetic_name,
        label: account.label,
        company_id: account.company_id,
        group_id: account.group_id,
        role: account.role,
        is_active: account.is_active,
        qr_code: account.qr_code,
        created_at: account.created_at.to_chrono(),
        updated_at: account.updated_at.to_chrono(),
        last_login: account.last_login.map(|at| at.to_chrono()),
    }
}
