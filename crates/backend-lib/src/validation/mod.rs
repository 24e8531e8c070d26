// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Login and registration payload validation.
//!
//! Checks run in a fixed order and the first failure wins; callers rely on
//! getting that single error back.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

// Common validation constants
const MIN_IDENTIFIER_LENGTH: usize = 3;
const MAX_IDENTIFIER_LENGTH: usize = 50;
const MIN_PASSWORD_LENGTH: usize = 8;

// local-part@domain.tld, narrower than RFC 5322
static IDENTIFIER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._-]+@[A-Za-z0-9._-]+\.[A-Za-z0-9_-]+$").expect("static regex")
});
// Unicode punctuation or symbol
static SPECIAL_CHAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{P}\p{S}]").expect("static regex"));

/// Which request field an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Identifier,
    Password,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Identifier => f.write_str("email"),
            Field::Password => f.write_str("password"),
        }
    }
}

/// Possible validation errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(Field),

    #[error("email must be at least {} characters long", MIN_IDENTIFIER_LENGTH)]
    TooShort,

    #[error("email must be shorter than {} characters", MAX_IDENTIFIER_LENGTH)]
    TooLong,

    #[error("email address format is invalid")]
    MalformedIdentifier,

    #[error("password must be at least {} characters long", MIN_PASSWORD_LENGTH)]
    PasswordTooShort,

    #[error("password must contain at least one uppercase letter")]
    PasswordMissingUpper,

    #[error("password must contain at least one lowercase letter")]
    PasswordMissingLower,

    #[error("password must contain at least one number")]
    PasswordMissingNumber,

    #[error("password must contain at least one special character")]
    PasswordMissingSpecial,

    #[error("password must not be the same as the email")]
    PasswordEqualsIdentifier,
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Validate a login attempt
pub fn validate_login(identifier: &str, password: &str) -> ValidationResult<()> {
    if is_blank(identifier) {
        return Err(ValidationError::EmptyField(Field::Identifier));
    }
    if is_blank(password) {
        return Err(ValidationError::EmptyField(Field::Password));
    }

    let len = identifier.chars().count();
    if len < MIN_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooShort);
    }
    if len >= MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong);
    }

    if !IDENTIFIER_REGEX.is_match(identifier) {
        return Err(ValidationError::MalformedIdentifier);
    }

    Ok(())
}

/// Validate a registration: everything `validate_login` checks, then the password policy
pub fn validate_registration(identifier: &str, password: &str) -> ValidationResult<()> {
    validate_login(identifier, password)?;

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }

    if !password.chars().any(char::is_uppercase) {
        return Err(ValidationError::PasswordMissingUpper);
    }
    if !password.chars().any(char::is_lowercase) {
        return Err(ValidationError::PasswordMissingLower);
    }
    if !password.chars().any(char::is_numeric) {
        return Err(ValidationError::PasswordMissingNumber);
    }
    if !SPECIAL_CHAR_REGEX.is_match(password) {
        return Err(ValidationError::PasswordMissingSpecial);
    }

    if password.to_lowercase() == identifier.to_lowercase() {
        return Err(ValidationError::PasswordEqualsIdentifier);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_login() {
        assert!(validate_login("user@example.com", "x").is_ok());
        assert!(validate_login("first.last-1@mail_host.co-uk", "x").is_ok());

        assert_eq!(validate_login("ab", "x"), Err(ValidationError::TooShort));
        assert_eq!(
            validate_login(&format!("{}@example.com", "a".repeat(40)), "x"),
            Err(ValidationError::TooLong)
        );
    }

    #[test]
    fn test_empty_fields() {
        assert_eq!(
            validate_login("", "secret"),
            Err(ValidationError::EmptyField(Field::Identifier))
        );
        assert_eq!(
            validate_login("   ", "secret"),
            Err(ValidationError::EmptyField(Field::Identifier))
        );
        assert_eq!(
            validate_login("user@example.com", " \t"),
            Err(ValidationError::EmptyField(Field::Password))
        );
        // identifier is reported before password
        assert_eq!(
            validate_login("", ""),
            Err(ValidationError::EmptyField(Field::Identifier))
        );
    }

    #[test]
    fn test_identifier_length_bounds() {
        // 49 characters is the longest accepted
        let at_limit = format!("{}@b.co", "a".repeat(44));
        assert_eq!(at_limit.len(), 49);
        assert!(validate_login(&at_limit, "x").is_ok());

        let over = format!("{}@b.co", "a".repeat(45));
        assert_eq!(over.len(), 50);
        assert_eq!(validate_login(&over, "x"), Err(ValidationError::TooLong));

        // length is checked before format
        assert_eq!(validate_login("abc", "x"), Err(ValidationError::MalformedIdentifier));
    }

    #[test]
    fn test_identifier_format() {
        for bad in [
            "test.example.com",
            "test@",
            "test@example",
            "@example.com",
            "user+tag@example.com",
            "user@exa mple.com",
            "user@example.c.",
            "us€r@example.com",
            "user@@example.com",
        ] {
            assert_eq!(
                validate_login(bad, "x"),
                Err(ValidationError::MalformedIdentifier),
                "{bad:?}"
            );
        }

        // the tld segment may hold digits, underscores and hyphens
        assert!(validate_login("user@example.c_1", "x").is_ok());
        assert!(validate_login("user@sub.example.com", "x").is_ok());
    }

    #[test]
    fn test_validate_registration() {
        assert!(validate_registration("user@example.com", "Abc123!@").is_ok());

        assert_eq!(
            validate_registration("user@example.com", "abcdefgh"),
            Err(ValidationError::PasswordMissingUpper)
        );
        assert_eq!(
            validate_registration("user@example.com", "Abc12!"),
            Err(ValidationError::PasswordTooShort)
        );
        assert_eq!(
            validate_registration("user@example.com", "ABCDEFG1!"),
            Err(ValidationError::PasswordMissingLower)
        );
        assert_eq!(
            validate_registration("user@example.com", "Abcdefgh!"),
            Err(ValidationError::PasswordMissingNumber)
        );
        assert_eq!(
            validate_registration("user@example.com", "Abcdefg1"),
            Err(ValidationError::PasswordMissingSpecial)
        );
    }

    #[test]
    fn test_registration_runs_login_checks_first() {
        assert_eq!(
            validate_registration("ab", "weak"),
            Err(ValidationError::TooShort)
        );
        assert_eq!(
            validate_registration("not-an-email", "weak"),
            Err(ValidationError::MalformedIdentifier)
        );
    }

    #[test]
    fn test_password_equal_to_identifier() {
        assert_eq!(
            validate_registration("User1@example.com", "user1@EXAMPLE.com"),
            Err(ValidationError::PasswordEqualsIdentifier)
        );
        assert!(validate_registration("User1@example.com", "User1@example.co").is_ok());
    }

    #[test]
    fn test_unicode_character_classes() {
        // non-ASCII upper/lower letters, digits and symbols count
        assert!(validate_registration("user@example.com", "ÄbcdefgΩ٣€").is_ok());
        assert!(validate_registration("user@example.com", "Abcdefg1¿").is_ok());
        assert_eq!(
            validate_registration("user@example.com", "Abcdefg1 "),
            Err(ValidationError::PasswordMissingSpecial)
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ValidationError::EmptyField(Field::Password).to_string(),
            "password must not be empty"
        );
        assert_eq!(
            ValidationError::PasswordTooShort.to_string(),
            "password must be at least 8 characters long"
        );
    }
}
