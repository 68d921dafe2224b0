/// Token codec and issuer.
///
/// Encoding and decoding are pure functions over the input token and the
/// process-wide signing settings; validity is determined solely by
/// signature and expiry, with no server-side session state.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;

use crate::accounts::Account;
use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// Access tokens ride along on every authenticated request.
pub const ACCESS_TOKEN_TTL_SECONDS: i64 = 15 * 60;
/// Refresh tokens exist only to mint new access tokens.
pub const REFRESH_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// The pair handed out at login: a short-lived access token and a
/// long-lived refresh token carrying identical claims. Nothing in the
/// claims distinguishes the two; a leaked refresh token is as powerful
/// as a leaked access token.
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Sign `claims` into a compact token string.
pub fn encode_token(claims: &Claims, config: &JwtSettings) -> Result<String, AppError> {
    encode(
        &Header::new(config.algorithm),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token encoding failed: {}", e)))
}

/// Verify signature and expiry, returning the embedded claims.
///
/// Library errors are classified into the taxonomy here and never
/// surfaced raw: an expired signature is `ExpiredToken`, everything else
/// (bad signature, malformed token, missing subject) is `InvalidToken`.
pub fn decode_token(token: &str, config: &JwtSettings) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(config.algorithm);
    // No expiry leeway: a token whose exp is in the past is expired,
    // full stop. The library default of 60s would let stale tokens
    // through every gate.
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        _ => {
            tracing::debug!(error = %e, "token rejected");
            AuthError::InvalidToken
        }
    })
}

/// Issue the access/refresh pair for an authenticated account.
///
/// Both tokens carry `{sub: email, role, id}`; only the expiry differs.
/// Flipping the account's active-status flag is the caller's concern,
/// exercised at login and logout, never here.
pub fn issue_token_pair(account: &Account, config: &JwtSettings) -> Result<TokenPair, AppError> {
    let access_claims = Claims::new(
        &account.email,
        account.role,
        &account.id,
        ACCESS_TOKEN_TTL_SECONDS,
    );
    let refresh_claims = Claims::new(
        &account.email,
        account.role,
        &account.id,
        REFRESH_TOKEN_TTL_SECONDS,
    );

    Ok(TokenPair {
        access_token: encode_token(&access_claims, config)?,
        refresh_token: encode_token(&refresh_claims, config)?,
    })
}
