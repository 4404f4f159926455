//! Format rules for registration credentials.

use validator::ValidateEmail;

use crate::error::CoreError;

/// Minimum accepted password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum accepted password length in characters.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Canonical form used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate an email address after normalization.
pub fn validate_email(email: &str) -> Result<(), CoreError> {
    if normalize_email(email).validate_email() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "'{}' is not a valid email address",
            email.trim()
        )))
    }
}

/// Validate password length bounds.
pub fn validate_password(password: &str) -> Result<(), CoreError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(CoreError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(CoreError::Validation(format!(
            "Password must be at most {MAX_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  A@Example.COM "), "a@example.com");
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("a@example.com").is_ok());
        assert_matches!(validate_email("not-an-email"), Err(CoreError::Validation(_)));
        assert_matches!(validate_email(""), Err(CoreError::Validation(_)));
    }

    #[test]
    fn password_bounds() {
        assert!(validate_password("pw123456").is_ok());
        assert_matches!(
            validate_password("short"),
            Err(CoreError::Validation(msg)) if msg.contains("at least 8")
        );
        assert_matches!(
            validate_password(&"x".repeat(MAX_PASSWORD_LENGTH + 1)),
            Err(CoreError::Validation(_))
        );
    }
}
