/// JWT Token Issuance and Verification
///
/// Both access and refresh tokens are HS256-signed JWTs sharing the
/// `Claims` payload. Access tokens are verified statelessly (signature,
/// issuer, expiry); refresh tokens additionally go through the revocation
/// store before being honored.

use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, Role, TokenKind};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// Issue a short-lived access token for a user.
pub fn issue_access_token(
    user_id: &Uuid,
    role: Role,
    config: &JwtSettings,
) -> Result<String, AppError> {
    let claims = Claims::new(
        *user_id,
        role,
        TokenKind::Access,
        config.access_token_expiry,
        config.issuer.clone(),
    );
    sign(&claims, config)
}

/// Issue a longer-lived refresh token for a user.
///
/// Returns the signed token together with its claims so the caller can
/// persist the `jti` for revocation tracking.
pub fn issue_refresh_token(
    user_id: &Uuid,
    role: Role,
    config: &JwtSettings,
) -> Result<(String, Claims), AppError> {
    let claims = Claims::new(
        *user_id,
        role,
        TokenKind::Refresh,
        config.refresh_token_expiry,
        config.issuer.clone(),
    );
    let token = sign(&claims, config)?;
    Ok((token, claims))
}

fn sign(claims: &Claims, config: &JwtSettings) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
}

/// Decode a token and check signature, issuer, and expiry.
///
/// # Errors
/// - `ExpiredToken` when the signature is valid but `exp` is in the past
/// - `MalformedToken` on any structural, signature, or issuer failure
pub fn decode_token(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::Auth(AuthError::ExpiredToken),
        _ => {
            tracing::warn!("JWT validation error: {}", e);
            AppError::Auth(AuthError::MalformedToken)
        }
    })
}

/// Verify an access token presented as a bearer credential.
///
/// A refresh token used here is rejected as malformed; the two flavors are
/// not interchangeable.
pub fn verify_access_token(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    let claims = decode_token(token, config)?;
    if claims.kind != TokenKind::Access {
        tracing::warn!(sub = %claims.sub, "Refresh token presented as an access token");
        return Err(AppError::Auth(AuthError::MalformedToken));
    }
    Ok(claims)
}

/// Decode a refresh token, checking flavor but not revocation.
///
/// Revocation is a storage concern; see `auth::revocation`.
pub fn decode_refresh_token(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    let claims = decode_token(token, config)?;
    if claims.kind != TokenKind::Refresh {
        tracing::warn!(sub = %claims.sub, "Access token presented as a refresh token");
        return Err(AppError::Auth(AuthError::MalformedToken));
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_config() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
            issuer: "test".to_string(),
        }
    }

    #[test]
    fn issue_and_verify_access_token() {
        let config = get_test_config();
        let user_id = Uuid::new_v4();

        let token = issue_access_token(&user_id, Role::User, &config)
            .expect("Failed to issue token");
        let claims = verify_access_token(&token, &config).expect("Failed to verify token");

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.iss, "test");
    }

    #[test]
    fn refresh_token_carries_persistable_jti() {
        let config = get_test_config();
        let user_id = Uuid::new_v4();

        let (token, claims) = issue_refresh_token(&user_id, Role::Admin, &config)
            .expect("Failed to issue token");
        let decoded = decode_refresh_token(&token, &config).expect("Failed to decode");

        assert_eq!(decoded.jti, claims.jti);
        assert_eq!(decoded.kind, TokenKind::Refresh);
        assert!(decoded.token_id().is_ok());
    }

    #[test]
    fn access_expiry_is_strictly_shorter_than_refresh_expiry() {
        let config = get_test_config();
        let user_id = Uuid::new_v4();

        let access = issue_access_token(&user_id, Role::User, &config).unwrap();
        let (refresh, _) = issue_refresh_token(&user_id, Role::User, &config).unwrap();

        let access_claims = decode_token(&access, &config).unwrap();
        let refresh_claims = decode_token(&refresh, &config).unwrap();

        assert!(access_claims.exp < refresh_claims.exp);
    }

    #[test]
    fn garbage_token_is_malformed() {
        let config = get_test_config();
        let result = verify_access_token("not.a.token", &config);

        match result {
            Err(AppError::Auth(AuthError::MalformedToken)) => (),
            other => panic!("Expected MalformedToken, got {:?}", other.err()),
        }
    }

    #[test]
    fn tampered_token_is_malformed() {
        let config = get_test_config();
        let user_id = Uuid::new_v4();

        let token = issue_access_token(&user_id, Role::User, &config).unwrap();
        let tampered = format!("{}X", token);

        match verify_access_token(&tampered, &config) {
            Err(AppError::Auth(AuthError::MalformedToken)) => (),
            other => panic!("Expected MalformedToken, got {:?}", other.err()),
        }
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let mut config = get_test_config();
        config.access_token_expiry = -60;
        // Bypass the settings invariant deliberately to mint a stale token
        let user_id = Uuid::new_v4();
        let token = issue_access_token(&user_id, Role::User, &config).unwrap();

        match verify_access_token(&token, &get_test_config()) {
            Err(AppError::Auth(AuthError::ExpiredToken)) => (),
            other => panic!("Expected ExpiredToken, got {:?}", other.err()),
        }
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let config = get_test_config();
        let user_id = Uuid::new_v4();
        let token = issue_access_token(&user_id, Role::User, &config).unwrap();

        let mut other = get_test_config();
        other.issuer = "someone-else".to_string();

        assert!(verify_access_token(&token, &other).is_err());
    }

    #[test]
    fn token_kinds_are_not_interchangeable() {
        let config = get_test_config();
        let user_id = Uuid::new_v4();

        let (refresh, _) = issue_refresh_token(&user_id, Role::User, &config).unwrap();
        let access = issue_access_token(&user_id, Role::User, &config).unwrap();

        assert!(verify_access_token(&refresh, &config).is_err());
        assert!(decode_refresh_token(&access, &config).is_err());
    }
}
