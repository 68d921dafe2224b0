/// Customer directory routes. Reads are open to employees and admins;
/// deletes are admin-only.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::{require_admin, require_employee, Identity};
use crate::error::{AppError, DatabaseError};

#[derive(Serialize)]
pub struct CustomerResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub created_at: String,
}

#[derive(Deserialize)]
pub struct CustomerSearch {
    pub search_id: Option<String>,
    pub search_name: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

#[derive(Deserialize)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

type CustomerRow = (String, String, String, String, String, DateTime<Utc>);

fn to_response(row: CustomerRow) -> CustomerResponse {
    let (id, name, email, phone, address, created_at) = row;
    CustomerResponse {
        id,
        name,
        email,
        phone,
        address,
        created_at: created_at.to_rfc3339(),
    }
}

/// GET /customers
pub async fn search_customers(
    query: web::Query<CustomerSearch>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    require_employee(&identity)?;

    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100);
    let offset = (page - 1) * limit;
    let id_filter = query.search_id.clone().unwrap_or_default();
    let name_filter = query.search_name.clone().unwrap_or_default();

    let rows = sqlx::query_as::<_, CustomerRow>(
        r#"
        SELECT id, name, email, phone, address, created_at
        FROM customers
        WHERE ($1 = '' OR id LIKE '%' || $1 || '%')
          AND ($2 = '' OR name ILIKE '%' || $2 || '%')
        ORDER BY created_at DESC, id DESC
        OFFSET $3 LIMIT $4
        "#,
    )
    .bind(&id_filter)
    .bind(&name_filter)
    .bind(offset)
    .bind(limit)
    .fetch_all(pool.get_ref())
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
        .fetch_one(pool.get_ref())
        .await?;

    let search_result: Vec<CustomerResponse> = rows.into_iter().map(to_response).collect();
    let customer_count = search_result.len();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "search_result": search_result,
        "customer_count": customer_count,
        "total_customer": total,
        "page": page,
        "limit": limit,
    })))
}

/// GET /customers/{id}
pub async fn get_customer(
    path: web::Path<String>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    require_employee(&identity)?;

    let row = sqlx::query_as::<_, CustomerRow>(
        "SELECT id, name, email, phone, address, created_at FROM customers WHERE id = $1",
    )
    .bind(path.as_str())
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or(DatabaseError::NotFound("Customer"))?;

    Ok(HttpResponse::Ok().json(to_response(row)))
}

/// PUT /customers/{id}: absent fields are left unchanged.
pub async fn update_customer(
    path: web::Path<String>,
    form: web::Json<CustomerUpdate>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    require_employee(&identity)?;

    let result = sqlx::query(
        r#"
        UPDATE customers
        SET name = COALESCE($1, name),
            email = COALESCE($2, email),
            phone = COALESCE($3, phone),
            address = COALESCE($4, address)
        WHERE id = $5
        "#,
    )
    .bind(&form.name)
    .bind(&form.email)
    .bind(&form.phone)
    .bind(&form.address)
    .bind(path.as_str())
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound("Customer").into());
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Customer updated successfully" })))
}

/// DELETE /customers/{id}: admin only.
pub async fn delete_customer(
    path: web::Path<String>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    require_admin(&identity)?;

    let result = sqlx::query("DELETE FROM customers WHERE id = $1")
        .bind(path.as_str())
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound("Customer").into());
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Customer deleted successfully" })))
}
