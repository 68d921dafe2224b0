/// Role-based authorization gate.
///
/// Pure decision functions consulted at the top of route handlers, after
/// the global middleware has already established that the caller holds a
/// valid token. A recognized caller with an insufficient role gets a 403,
/// never a 401.

use crate::auth::claims::Role;
use crate::auth::identity::Identity;
use crate::error::AuthError;

/// Accept the identity when its role satisfies any of `allowed`,
/// honoring the Admin ⊇ Employee grant table.
pub fn require_role<'a>(
    identity: &'a Identity,
    allowed: &[Role],
    denial: &'static str,
) -> Result<&'a Identity, AuthError> {
    if allowed.iter().any(|role| identity.role.grants(*role)) {
        Ok(identity)
    } else {
        tracing::warn!(
            email = %identity.email,
            role = %identity.role,
            "insufficient role"
        );
        Err(AuthError::Forbidden(denial))
    }
}

/// Admin-only gate.
pub fn require_admin(identity: &Identity) -> Result<&Identity, AuthError> {
    require_role(identity, &[Role::Admin], "Admin access required")
}

/// Employee-or-admin gate.
pub fn require_employee(identity: &Identity) -> Result<&Identity, AuthError> {
    require_role(identity, &[Role::Employee], "Employee access required")
}
