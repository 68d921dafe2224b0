/// Token claims and the role tier carried inside them.

use serde::{Deserialize, Serialize};

/// Coarse permission tier attached to every account and carried in token
/// claims. Comparison is by enum variant, never by ad hoc string checks,
/// so every route shares one grant table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "EMPLOYEE")]
    Employee,
    #[serde(rename = "CUSTOMER")]
    Customer,
}

impl Role {
    /// Whether this role satisfies a route that requires `required`.
    ///
    /// Admin is a strict superset of Employee; no other implication
    /// exists between tiers.
    pub fn grants(&self, required: Role) -> bool {
        *self == required || (*self == Role::Admin && required == Role::Employee)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Employee => "EMPLOYEE",
            Role::Customer => "CUSTOMER",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "EMPLOYEE" => Ok(Role::Employee),
            "CUSTOMER" => Ok(Role::Customer),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed token payload.
///
/// `sub` carries the account email; `id` is the stable account id,
/// distinct from the email. Claims are immutable once signed; tampering
/// with any field invalidates the signature. `role` and `id` are optional
/// at the decoding layer so that tokens missing them are surfaced as
/// malformed identities rather than signature failures.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: account email.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Expiry (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
}

impl Claims {
    /// Build claims expiring `ttl_seconds` from now.
    pub fn new(email: &str, role: Role, account_id: &str, ttl_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: email.to_string(),
            role: Some(role),
            id: Some(account_id.to_string()),
            exp: now + ttl_seconds,
            iat: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.exp < chrono::Utc::now().timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_carry_subject_role_and_id() {
        let claims = Claims::new("u@x.com", Role::Employee, "acct-1", 900);

        assert_eq!(claims.sub, "u@x.com");
        assert_eq!(claims.role, Some(Role::Employee));
        assert_eq!(claims.id.as_deref(), Some("acct-1"));
        assert!(!claims.is_expired());
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn role_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"CUSTOMER\"").unwrap(),
            Role::Customer
        );
        // Case-sensitive: lowercase historical spellings are rejected.
        assert!(serde_json::from_str::<Role>("\"admin\"").is_err());
    }

    #[test]
    fn admin_is_a_superset_of_employee() {
        assert!(Role::Admin.grants(Role::Employee));
        assert!(Role::Admin.grants(Role::Admin));
        assert!(!Role::Employee.grants(Role::Admin));
        assert!(!Role::Customer.grants(Role::Employee));
        assert!(Role::Customer.grants(Role::Customer));
    }

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Admin, Role::Employee, Role::Customer] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("MANAGER".parse::<Role>().is_err());
    }
}
