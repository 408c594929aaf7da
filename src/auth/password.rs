/// Password Hashing and Verification
///
/// Passwords are stored only as bcrypt hashes. The strength policy runs
/// before hashing so a weak credential never reaches the store.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::{AppError, AuthError};

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

/// Hash a password with bcrypt after enforcing the strength policy.
///
/// # Errors
/// - `WeakCredential` if the password fails the policy
/// - Internal error if bcrypt itself fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    validate_password_strength(password)?;

    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

/// Strength policy:
/// - 8 to 128 characters (bcrypt input limit and DoS prevention)
/// - at least one digit, one lowercase letter, one uppercase letter
fn validate_password_strength(password: &str) -> Result<(), AppError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Auth(AuthError::WeakCredential(format!(
            "minimum {} characters",
            MIN_PASSWORD_LENGTH
        ))));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AppError::Auth(AuthError::WeakCredential(format!(
            "maximum {} characters",
            MAX_PASSWORD_LENGTH
        ))));
    }

    let has_digit = password.chars().any(|c| c.is_numeric());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());

    if !has_digit || !has_lowercase || !has_uppercase {
        return Err(AppError::Auth(AuthError::WeakCredential(
            "must contain at least one digit, one lowercase letter, and one uppercase letter"
                .to_string(),
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_weak(result: Result<String, AppError>) -> bool {
        matches!(result, Err(AppError::Auth(AuthError::WeakCredential(_))))
    }

    #[test]
    fn hash_is_not_the_password() {
        let password = "Secur3Pass!";
        let hash = hash_password(password).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
    }

    #[test]
    fn round_trip_verification() {
        let password = "Secur3Pass!";
        let hash = hash_password(password).expect("Failed to hash password");

        assert!(verify_password(password, &hash).expect("Failed to verify"));
    }

    #[test]
    fn wrong_password_does_not_verify() {
        let hash = hash_password("Secur3Pass!").expect("Failed to hash password");

        assert!(!verify_password("Wr0ngPass!", &hash).expect("Failed to verify"));
    }

    #[test]
    fn short_password_is_weak() {
        assert!(is_weak(hash_password("Short1")));
    }

    #[test]
    fn overlong_password_is_weak() {
        let long_password = "a".repeat(MAX_PASSWORD_LENGTH + 1) + "A1";
        assert!(is_weak(hash_password(&long_password)));
    }

    #[test]
    fn missing_charset_classes_are_weak() {
        assert!(is_weak(hash_password("NoDigitsPassword")));
        assert!(is_weak(hash_password("NOLOWERCASE1")));
        assert!(is_weak(hash_password("nouppercase1")));
    }

    #[test]
    fn policy_accepts_a_strong_password() {
        assert!(hash_password("ValidPassword123").is_ok());
    }
}
