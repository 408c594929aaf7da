/// Session Routes
///
/// The session lifecycle: signup, login, refresh, logout. A session moves
/// Anonymous -> Authenticated -> Expired (access lapsed, refresh valid) ->
/// Revoked/LoggedOut; the last state is terminal and the client must log
/// in again.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{
    consume_refresh_token, create_user, decode_refresh_token, find_user, issue_access_token,
    issue_refresh_token, revoke_all_user_tokens, revoke_refresh_token, store_refresh_token,
    verify_credentials, Claims, Role,
};
use crate::configuration::JwtSettings;
use crate::error::AppError;
use crate::validators::is_valid_email;

/// Signup request
#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Refresh and logout request
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Authentication response with access and refresh tokens
#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// User information response
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub role: String,
    pub created_at: String,
}

/// Issue an access/refresh pair and persist the refresh token's jti.
async fn issue_token_pair(
    pool: &PgPool,
    jwt_config: &JwtSettings,
    user_id: Uuid,
    role: Role,
) -> Result<AuthResponse, AppError> {
    let access_token = issue_access_token(&user_id, role, jwt_config)?;
    let (refresh_token, refresh_claims) = issue_refresh_token(&user_id, role, jwt_config)?;

    store_refresh_token(
        pool,
        refresh_claims.token_id()?,
        user_id,
        jwt_config.refresh_token_expiry,
    )
    .await?;

    Ok(AuthResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: jwt_config.access_token_expiry,
    })
}

/// POST /auth/signup
///
/// Create an account and start a session.
///
/// # Errors
/// - 400: invalid email format or weak password
/// - 409: email already registered
pub async fn signup(
    form: web::Json<SignupRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;

    let identity = create_user(pool.get_ref(), &email, &form.password, Role::User).await?;

    let response =
        issue_token_pair(pool.get_ref(), jwt_config.get_ref(), identity.id, identity.role).await?;

    tracing::info!(user_id = %identity.id, "User signed up");

    Ok(HttpResponse::Created().json(response))
}

/// POST /auth/login
///
/// Authenticate with email and password.
///
/// # Errors
/// - 401: unknown email or wrong password, indistinguishable by design
pub async fn login(
    form: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let identity = verify_credentials(pool.get_ref(), &form.email, &form.password).await?;

    let response =
        issue_token_pair(pool.get_ref(), jwt_config.get_ref(), identity.id, identity.role).await?;

    tracing::info!(user_id = %identity.id, "User logged in");

    Ok(HttpResponse::Ok().json(response))
}

/// POST /auth/refresh
///
/// Exchange a valid refresh token for a new access token. The refresh
/// token is rotated: the presented token is consumed atomically and a
/// replacement is returned, so a stolen token that has already been
/// rotated is useless.
///
/// # Errors
/// - 401 EXPIRED_TOKEN: refresh token past its expiry
/// - 401 REVOKED_TOKEN: token was logged out, rotated, or never recorded
/// - 401 MALFORMED_TOKEN: structural or signature failure
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let claims = decode_refresh_token(&form.refresh_token, jwt_config.get_ref())?;
    let user_id = claims.user_id()?;

    consume_refresh_token(pool.get_ref(), claims.token_id()?).await?;

    let response =
        issue_token_pair(pool.get_ref(), jwt_config.get_ref(), user_id, claims.role).await?;

    tracing::info!(user_id = %user_id, "Session refreshed");

    Ok(HttpResponse::Ok().json(response))
}

/// POST /auth/logout
///
/// Revoke a refresh token. Idempotent: logging out an already revoked
/// token still returns 204.
///
/// # Errors
/// - 401: malformed or expired refresh token
pub async fn logout(
    form: web::Json<RefreshRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let claims = decode_refresh_token(&form.refresh_token, jwt_config.get_ref())?;

    revoke_refresh_token(pool.get_ref(), claims.token_id()?).await?;

    tracing::info!(user_id = %claims.sub, "User logged out");

    Ok(HttpResponse::NoContent().finish())
}

/// POST /auth/logout_all
///
/// Revoke every live refresh token for the authenticated user.
/// Requires a valid access token.
pub async fn logout_all(
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;

    revoke_all_user_tokens(pool.get_ref(), user_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// GET /auth/me
///
/// Return the authenticated user's profile. Claims are injected by the
/// bearer middleware.
pub async fn get_current_user(
    claims: web::ReqData<Claims>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;

    let (identity, created_at) = find_user(pool.get_ref(), user_id).await?;

    Ok(HttpResponse::Ok().json(UserResponse {
        id: identity.id.to_string(),
        email: identity.email,
        role: identity.role.as_str().to_string(),
        created_at: created_at.to_rfc3339(),
    }))
}
