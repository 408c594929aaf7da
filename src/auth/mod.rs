/// Authentication module
///
/// Credential storage, JWT issuance/verification, password hashing, and
/// refresh token revocation tracking.

mod claims;
mod credentials;
mod jwt;
mod password;
mod revocation;

pub use claims::{Claims, Role, TokenKind};
pub use credentials::{create_user, find_user, normalize_email, verify_credentials, Identity};
pub use jwt::{decode_refresh_token, issue_access_token, issue_refresh_token, verify_access_token};
pub use password::{hash_password, verify_password};
pub use revocation::{
    consume_refresh_token, revoke_all_user_tokens, revoke_refresh_token, store_refresh_token,
};
