/// Credential Store
///
/// Owns the user identity records: unique email, bcrypt password hash, and
/// role. Emails are normalized to lowercase before storage and lookup so
/// uniqueness is case-insensitive. The password hash never leaves this
/// module.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::claims::Role;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AuthError};

/// A verified user identity, safe to expose outward.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Normalize an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create a new credential record.
///
/// # Errors
/// - `WeakCredential` if the password fails the strength policy
/// - `DuplicateEmail` if the email already has an account
pub async fn create_user(
    pool: &PgPool,
    email: &str,
    raw_password: &str,
    role: Role,
) -> Result<Identity, AppError> {
    let email = normalize_email(email);
    let password_hash = hash_password(raw_password)?;
    let user_id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO users (id, email, password_hash, role, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(user_id)
    .bind(&email)
    .bind(&password_hash)
    .bind(role.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Identity {
        id: user_id,
        email,
        role,
    })
}

/// Verify an email/password pair against the store.
///
/// Unknown email and wrong password both yield `InvalidCredentials`; the
/// caller cannot tell whether the account exists.
pub async fn verify_credentials(
    pool: &PgPool,
    email: &str,
    raw_password: &str,
) -> Result<Identity, AppError> {
    let email = normalize_email(email);

    let row = sqlx::query_as::<_, (Uuid, String, String, String)>(
        "SELECT id, email, password_hash, role FROM users WHERE email = $1",
    )
    .bind(&email)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::Auth(AuthError::InvalidCredentials))?;

    let (user_id, stored_email, password_hash, role) = row;

    if !verify_password(raw_password, &password_hash)? {
        return Err(AppError::Auth(AuthError::InvalidCredentials));
    }

    Ok(Identity {
        id: user_id,
        email: stored_email,
        role: role.parse()?,
    })
}

/// Fetch an identity by id, for protected endpoints resolving their caller.
pub async fn find_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<(Identity, chrono::DateTime<Utc>), AppError> {
    let row = sqlx::query_as::<_, (Uuid, String, String, chrono::DateTime<Utc>)>(
        "SELECT id, email, role, created_at FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    let (id, email, role, created_at) = row;
    Ok((
        Identity {
            id,
            email,
            role: role.parse()?,
        },
        created_at,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_normalization_is_case_insensitive() {
        assert_eq!(normalize_email("User@Example.COM"), "user@example.com");
        assert_eq!(normalize_email("  a@b.com  "), "a@b.com");
    }

    #[test]
    fn role_round_trips_through_text() {
        let role: Role = Role::Admin.as_str().parse().unwrap();
        assert_eq!(role, Role::Admin);
        assert!("superuser".parse::<Role>().is_err());
    }
}
