/// Credential store: persisted accounts with hashed passwords and an
/// active/inactive status flag.
///
/// The auth core reads accounts at login/logout and flips the status
/// flag; it treats the record as opaque otherwise. Token validation
/// never consults this table.

use chrono::Utc;
use sqlx::PgPool;

use crate::auth::Role;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "Active",
            AccountStatus::Inactive => "Inactive",
        }
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(AccountStatus::Active),
            "Inactive" => Ok(AccountStatus::Inactive),
            other => Err(format!("unknown account status: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
    pub status: AccountStatus,
}

type AccountRow = (String, String, String, String, String, String);

fn from_row(row: AccountRow) -> Result<Account, AppError> {
    let (id, email, name, password_hash, role, status) = row;
    Ok(Account {
        id,
        email,
        name,
        password_hash,
        role: role
            .parse()
            .map_err(|e: String| AppError::Internal(format!("corrupt account record: {}", e)))?,
        status: status
            .parse()
            .map_err(|e: String| AppError::Internal(format!("corrupt account record: {}", e)))?,
    })
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Account>, AppError> {
    let row = sqlx::query_as::<_, AccountRow>(
        "SELECT id, email, name, password_hash, role, status FROM accounts WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    row.map(from_row).transpose()
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Account>, AppError> {
    let row = sqlx::query_as::<_, AccountRow>(
        "SELECT id, email, name, password_hash, role, status FROM accounts WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(from_row).transpose()
}

pub async fn insert(pool: &PgPool, account: &Account) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO accounts (id, email, name, password_hash, role, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(&account.id)
    .bind(&account.email)
    .bind(&account.name)
    .bind(&account.password_hash)
    .bind(account.role.as_str())
    .bind(account.status.as_str())
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

/// Flip the active-status flag. Returns whether a record was touched.
pub async fn set_status(
    pool: &PgPool,
    id: &str,
    status: AccountStatus,
) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE accounts SET status = $1 WHERE id = $2")
        .bind(status.as_str())
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
