use crate::error::FieldErrors;
use regex::Regex;
use std::sync::OnceLock;

/// Maximum length of any free-text account field
pub const MAX_FIELD_LENGTH: usize = 255;

pub const BLANK: &str = "This field may not be blank.";
pub const REQUIRED: &str = "This field is required.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$")
            .expect("Failed to compile email regex")
    })
}

/// Validates an email address using regex and additional checks
pub fn is_valid_email(email: &str) -> bool {
    // Check length constraints
    if email.len() > MAX_FIELD_LENGTH {
        return false;
    }

    if !email_regex().is_match(email) {
        return false;
    }

    // Check for consecutive dots
    if email.contains("..") {
        return false;
    }

    let Some((_, domain)) = email.split_once('@') else {
        return false;
    };

    // Last part (TLD) should be at least 2 characters
    let domain_parts: Vec<&str> = domain.split('.').collect();
    if domain_parts.len() < 2 {
        return false;
    }
    domain_parts.last().map(|tld| tld.len() >= 2).unwrap_or(false)
}

/// Canonical form used for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn too_long() -> String {
    format!(
        "Ensure this field has no more than {} characters.",
        MAX_FIELD_LENGTH
    )
}

/// Validate a required text field
pub fn check_required_text(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, BLANK);
    } else if value.chars().count() > MAX_FIELD_LENGTH {
        errors.add(field, too_long());
    }
}

/// Validate an optional text field
pub fn check_optional_text(errors: &mut FieldErrors, field: &str, value: Option<&str>) {
    if let Some(value) = value {
        if value.chars().count() > MAX_FIELD_LENGTH {
            errors.add(field, too_long());
        }
    }
}

/// Validate an already-normalized email
pub fn check_email(errors: &mut FieldErrors, field: &str, email: &str) {
    if email.is_empty() {
        errors.add(field, BLANK);
    } else if !is_valid_email(email) {
        errors.add(field, INVALID_EMAIL);
    }
}

/// Validate a plaintext password before hashing
pub fn check_password(errors: &mut FieldErrors, field: &str, password: &str) {
    if password.is_empty() {
        errors.add(field, BLANK);
    }
}
