/// Authentication routes: signup, login, token refresh, logout, and the
/// current-caller probe.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::accounts::{self, Account, AccountStatus};
use crate::auth::{
    authenticate, encode_token, hash_password, issue_token_pair, verify_password, Claims,
    Identity, Role, ACCESS_TOKEN_TTL_SECONDS,
};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, ValidationError};
use crate::validators::{is_valid_email, is_valid_name};

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub name: String,
    pub role: Role,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LogoutRequest {
    pub id: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
    pub role: Role,
}

#[derive(Serialize)]
pub struct IdentityResponse {
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// POST /auth/signup
///
/// Creates an account in the Inactive state; the status flips to Active
/// on first login.
pub async fn signup(
    form: web::Json<SignupRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    let name = is_valid_name(&form.name)?;

    if form.password != form.confirm_password {
        return Err(ValidationError::PasswordMismatch.into());
    }

    if accounts::find_by_email(pool.get_ref(), &email).await?.is_some() {
        return Err(ValidationError::DuplicateAccount.into());
    }

    let account = Account {
        id: Uuid::new_v4().to_string(),
        email,
        name,
        password_hash: hash_password(&form.password)?,
        role: form.role,
        status: AccountStatus::Inactive,
    };
    accounts::insert(pool.get_ref(), &account).await?;

    tracing::info!(account_id = %account.id, role = %account.role, "account created");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Sign up successful" })))
}

/// POST /auth/login
///
/// 404 when the email is unknown, 401 when the password does not match.
/// On success the account flips to Active and an access/refresh pair is
/// issued.
pub async fn login(
    form: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;

    let account = accounts::find_by_email(pool.get_ref(), &email)
        .await?
        .ok_or(AuthError::AccountNotFound)?;

    if !verify_password(&form.password, &account.password_hash)? {
        return Err(AuthError::CredentialMismatch.into());
    }

    accounts::set_status(pool.get_ref(), &account.id, AccountStatus::Active).await?;

    let tokens = issue_token_pair(&account, jwt_config.get_ref())?;

    tracing::info!(account_id = %account.id, "login succeeded");

    Ok(HttpResponse::Ok().json(LoginResponse {
        message: "Login successful".to_string(),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        role: account.role,
    }))
}

/// POST /auth/refresh
///
/// Mints a fresh access token from a bearer refresh token. The path is
/// on the middleware allow-list so this handler sees the raw header and
/// can produce the refresh-specific rejection messages.
pub async fn refresh(
    req: HttpRequest,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let identity = match authenticate(header, jwt_config.get_ref()) {
        Ok(identity) => identity,
        Err(reason) => {
            let message = match reason {
                AuthError::MissingCredential => "Missing refresh token",
                AuthError::ExpiredToken => "Refresh token expired",
                _ => "Invalid refresh token",
            };
            tracing::warn!(error = %reason, "refresh rejected");
            return Ok(
                HttpResponse::Unauthorized().json(serde_json::json!({ "message": message }))
            );
        }
    };

    let claims = Claims::new(
        &identity.email,
        identity.role,
        identity.id.as_deref().unwrap_or_default(),
        ACCESS_TOKEN_TTL_SECONDS,
    );
    let access_token = encode_token(&claims, jwt_config.get_ref())?;

    tracing::info!(email = %identity.email, "access token refreshed");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "access_token": access_token })))
}

/// POST /auth/logout
///
/// Flips the target account to Inactive. Already-issued tokens are not
/// revoked and remain valid until natural expiry; validation is
/// stateless and never consults the status flag.
pub async fn logout(
    form: web::Json<LogoutRequest>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let account = accounts::find_by_id(pool.get_ref(), &form.id)
        .await?
        .ok_or(AuthError::AccountNotFound)?;

    accounts::set_status(pool.get_ref(), &account.id, AccountStatus::Inactive).await?;

    tracing::info!(
        account_id = %account.id,
        requested_by = %identity.email,
        "account logged out"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Log out successful",
        "user_id": form.id,
    })))
}

/// GET /auth/me
pub async fn me(identity: web::ReqData<Identity>) -> HttpResponse {
    let identity = identity.into_inner();
    HttpResponse::Ok().json(IdentityResponse {
        email: identity.email,
        role: identity.role,
        id: identity.id,
    })
}
