/// Request authentication: bearer header in, typed identity out.
///
/// This is the single point where a raw token string becomes an
/// `Identity`. Authorization decisions downstream consume the output and
/// never re-parse tokens themselves.

use crate::auth::claims::{Claims, Role};
use crate::auth::token::decode_token;
use crate::configuration::JwtSettings;
use crate::error::AuthError;

const BEARER_PREFIX: &str = "Bearer ";

/// The resolved caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub role: Role,
    /// Stable account id when the token carries one.
    pub id: Option<String>,
}

impl TryFrom<Claims> for Identity {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        if claims.sub.is_empty() {
            return Err(AuthError::MalformedIdentity);
        }
        let role = claims.role.ok_or(AuthError::MalformedIdentity)?;

        Ok(Identity {
            email: claims.sub,
            role,
            id: claims.id,
        })
    }
}

/// Strip the bearer prefix from an `Authorization` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredential)?;
    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::MissingCredential)?;
    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(token)
}

/// Resolve an `Authorization` header into an identity.
///
/// Fails with `MissingCredential` when the header is absent or lacks a
/// bearer prefix, with the codec's `ExpiredToken`/`InvalidToken` when
/// decoding fails, and with `MalformedIdentity` when the claims lack a
/// subject or role.
pub fn authenticate(header: Option<&str>, config: &JwtSettings) -> Result<Identity, AuthError> {
    let token = bearer_token(header)?;
    let claims = decode_token(token, config)?;
    Identity::try_from(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::encode_token;

    fn test_config() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            algorithm: jsonwebtoken::Algorithm::HS256,
        }
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {}", token)
    }

    #[test]
    fn missing_header_is_missing_credential() {
        let config = test_config();
        assert_eq!(
            authenticate(None, &config).unwrap_err(),
            AuthError::MissingCredential
        );
    }

    #[test]
    fn non_bearer_schemes_are_missing_credential() {
        let config = test_config();
        for header in ["Basic dXNlcjpwYXNz", "Bearer", "BearerToken", ""] {
            assert_eq!(
                authenticate(Some(header), &config).unwrap_err(),
                AuthError::MissingCredential,
                "should reject header: {:?}",
                header
            );
        }
    }

    #[test]
    fn valid_token_resolves_to_identity() {
        let config = test_config();
        let claims = Claims::new("u@x.com", Role::Admin, "acct-1", 900);
        let token = encode_token(&claims, &config).unwrap();

        let identity = authenticate(Some(&bearer(&token)), &config).unwrap();
        assert_eq!(
            identity,
            Identity {
                email: "u@x.com".to_string(),
                role: Role::Admin,
                id: Some("acct-1".to_string()),
            }
        );
    }

    #[test]
    fn expired_and_invalid_tokens_surface_codec_errors() {
        let config = test_config();

        let expired = Claims::new("u@x.com", Role::Employee, "acct-2", -7200);
        let token = encode_token(&expired, &config).unwrap();
        assert_eq!(
            authenticate(Some(&bearer(&token)), &config).unwrap_err(),
            AuthError::ExpiredToken
        );

        assert_eq!(
            authenticate(Some("Bearer not.a.token"), &config).unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[test]
    fn claims_without_role_are_malformed() {
        let config = test_config();
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "u@x.com".to_string(),
            role: None,
            id: None,
            exp: now + 900,
            iat: now,
        };
        let token = encode_token(&claims, &config).unwrap();

        assert_eq!(
            authenticate(Some(&bearer(&token)), &config).unwrap_err(),
            AuthError::MalformedIdentity
        );
    }

    #[test]
    fn claims_with_empty_subject_are_malformed() {
        let config = test_config();
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: String::new(),
            role: Some(Role::Customer),
            id: None,
            exp: now + 900,
            iat: now,
        };
        let token = encode_token(&claims, &config).unwrap();

        assert_eq!(
            authenticate(Some(&bearer(&token)), &config).unwrap_err(),
            AuthError::MalformedIdentity
        );
    }
}
