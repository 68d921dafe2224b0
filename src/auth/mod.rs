/// Authentication core: token lifecycle, identity resolution, and
/// role-gated authorization.

mod authorize;
mod claims;
mod identity;
mod password;
mod token;

pub use authorize::{require_admin, require_employee, require_role};
pub use claims::{Claims, Role};
pub use identity::{authenticate, bearer_token, Identity};
pub use password::{hash_password, verify_password};
pub use token::{
    decode_token, encode_token, issue_token_pair, TokenPair, ACCESS_TOKEN_TTL_SECONDS,
    REFRESH_TOKEN_TTL_SECONDS,
};
