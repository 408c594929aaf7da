/// Refresh Token Revocation Store
///
/// Every issued refresh token's `jti` is persisted here so it can be
/// revoked before its natural expiry. Rotation consumes the old row with a
/// conditional update, so concurrent refreshes with the same token resolve
/// to exactly one winner; the losers see `RevokedToken`.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AuthError};

/// Record a freshly issued refresh token.
pub async fn store_refresh_token(
    pool: &PgPool,
    jti: Uuid,
    user_id: Uuid,
    expiry_seconds: i64,
) -> Result<(), AppError> {
    let expires_at = Utc::now() + Duration::seconds(expiry_seconds);

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (jti, user_id, expires_at, created_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(jti)
    .bind(user_id)
    .bind(expires_at)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

/// Atomically consume a refresh token for rotation.
///
/// This is also the revocation check: a `jti` with no live row, whether
/// revoked, rotated away, or gone with a deleted account, yields
/// `RevokedToken`. The conditional update serializes concurrent refreshes
/// through the storage layer: only the request that flips `revoked_at`
/// proceeds.
pub async fn consume_refresh_token(pool: &PgPool, jti: Uuid) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked_at = $1
        WHERE jti = $2 AND revoked_at IS NULL
        "#,
    )
    .bind(Utc::now())
    .bind(jti)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        tracing::warn!(jti = %jti, "Refresh token already consumed or unknown");
        return Err(AppError::Auth(AuthError::RevokedToken));
    }

    Ok(())
}

/// Revoke a refresh token at logout. Idempotent.
pub async fn revoke_refresh_token(pool: &PgPool, jti: Uuid) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked_at = $1
        WHERE jti = $2 AND revoked_at IS NULL
        "#,
    )
    .bind(Utc::now())
    .bind(jti)
    .execute(pool)
    .await?;

    Ok(())
}

/// Revoke every live refresh token for a user (logout-all-devices).
pub async fn revoke_all_user_tokens(pool: &PgPool, user_id: Uuid) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked_at = $1
        WHERE user_id = $2 AND revoked_at IS NULL
        "#,
    )
    .bind(Utc::now())
    .bind(user_id)
    .execute(pool)
    .await?;

    tracing::info!(user_id = %user_id, "All refresh tokens revoked for user");
    Ok(())
}
