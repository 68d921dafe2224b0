/// Unified error handling.
///
/// Domain-specific error enums are unified under `AppError`, which maps
/// every failure to a status code and a structured JSON body. Handler
/// failures render as `{"detail": <message>}`; the global auth middleware
/// produces its own `{"message": <message>}` rejections (see
/// `middleware::auth`). Internal library errors are classified into the
/// taxonomy below and never passed through raw.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// Authentication and authorization failures.
///
/// The 401/403 split is load-bearing: an unrecognized caller is
/// `Unauthorized`, a recognized caller with an insufficient role is
/// `Forbidden`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization` header, or no recognizable bearer prefix.
    MissingCredential,
    /// Signature verified but the embedded expiry is in the past.
    ExpiredToken,
    /// Bad signature, malformed token, or missing required claims.
    InvalidToken,
    /// Decoded claims lack a usable subject or role.
    MalformedIdentity,
    /// Valid identity, insufficient role for this route.
    Forbidden(&'static str),
    /// Password did not match the stored hash.
    CredentialMismatch,
    /// Login/logout target account does not exist.
    AccountNotFound,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingCredential => write!(f, "Missing Authorization header"),
            AuthError::ExpiredToken => write!(f, "Token expired"),
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::MalformedIdentity => write!(f, "Token is missing identity claims"),
            AuthError::Forbidden(msg) => write!(f, "{}", msg),
            AuthError::CredentialMismatch => write!(f, "Incorrect password"),
            AuthError::AccountNotFound => write!(f, "Account not found"),
        }
    }
}

impl StdError for AuthError {}

/// Input validation errors.
#[derive(Debug, Clone)]
pub enum ValidationError {
    EmptyField(&'static str),
    TooShort(&'static str, usize),
    TooLong(&'static str, usize),
    InvalidFormat(&'static str),
    SuspiciousContent(&'static str),
    PasswordMismatch,
    DuplicateAccount,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::SuspiciousContent(field) => {
                write!(f, "{} contains suspicious content", field)
            }
            ValidationError::PasswordMismatch => write!(f, "Passwords do not match"),
            ValidationError::DuplicateAccount => write!(f, "Account already exists"),
        }
    }
}

impl StdError for ValidationError {}

/// Database operation errors.
#[derive(Debug)]
pub enum DatabaseError {
    NotFound(&'static str),
    UniqueConstraintViolation(String),
    QueryExecution(String),
    ConnectionPool(String),
    UnexpectedError(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::NotFound(what) => write!(f, "{} not found", what),
            DatabaseError::UniqueConstraintViolation(msg) => write!(f, "Duplicate entry: {}", msg),
            DatabaseError::QueryExecution(msg) => write!(f, "Query error: {}", msg),
            DatabaseError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::UnexpectedError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

/// Central error type that all application errors map to.
#[derive(Debug)]
pub enum AppError {
    Auth(AuthError),
    Validation(ValidationError),
    Database(DatabaseError),
    BadRequest(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Database(e) => write!(f, "{}", e),
            AppError::BadRequest(msg) => write!(f, "{}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::Database(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let error_msg = err.to_string();

        if error_msg.contains("duplicate key") || error_msg.contains("unique constraint") {
            AppError::Database(DatabaseError::UniqueConstraintViolation(
                "record already exists".to_string(),
            ))
        } else if error_msg.contains("no rows") {
            AppError::Database(DatabaseError::NotFound("Record"))
        } else if error_msg.contains("pool") || error_msg.contains("connect") {
            AppError::Database(DatabaseError::ConnectionPool(error_msg))
        } else {
            AppError::Database(DatabaseError::UnexpectedError(error_msg))
        }
    }
}

/// Error response body rendered for handler failures.
///
/// Matches the wire shape clients already depend on: a single `detail`
/// field carrying a short, stable message.
#[derive(Debug, serde::Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl AppError {
    fn log(&self) {
        match self {
            AppError::Auth(e) => {
                tracing::warn!(error = %e, "authentication error");
            }
            AppError::Validation(e) => {
                tracing::warn!(error = %e, "validation error");
            }
            AppError::BadRequest(msg) => {
                tracing::warn!(error = %msg, "bad request");
            }
            AppError::Database(DatabaseError::NotFound(what)) => {
                tracing::info!(entity = what, "record not found");
            }
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
            }
        }
    }

    fn public_detail(&self) -> String {
        match self {
            // Internal failure details never reach the client.
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::Database(DatabaseError::NotFound(_)) => self.to_string(),
            AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => self.to_string(),
            AppError::Database(_) => "Database error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(e) => match e {
                AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
                AuthError::AccountNotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::UNAUTHORIZED,
            },
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(e) => match e {
                DatabaseError::NotFound(_) => StatusCode::NOT_FOUND,
                DatabaseError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
                DatabaseError::ConnectionPool(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        self.log();
        HttpResponse::build(self.status_code()).json(ErrorBody {
            detail: self.public_detail(),
        })
    }
}
