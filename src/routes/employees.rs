/// Employee directory routes. Listing is open to employees and admins;
/// mutations are admin-only.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{require_admin, require_employee, Identity};
use crate::error::{AppError, DatabaseError};

#[derive(Serialize)]
pub struct EmployeeResponse {
    pub id: String,
    pub name: String,
    pub role: String,
    pub email: String,
    pub active: bool,
    pub created_at: String,
}

#[derive(Deserialize)]
pub struct EmployeeSearch {
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
pub struct EmployeeInput {
    pub name: String,
    pub role: String,
    pub email: String,
    pub active: bool,
}

#[derive(Deserialize)]
pub struct EmployeeUpdate {
    pub name: Option<String>,
    pub role: Option<String>,
    pub email: Option<String>,
    pub active: Option<bool>,
}

type EmployeeRow = (String, String, String, String, bool, DateTime<Utc>);

fn to_response(row: EmployeeRow) -> EmployeeResponse {
    let (id, name, role, email, active, created_at) = row;
    EmployeeResponse {
        id,
        name,
        role,
        email,
        active,
        created_at: created_at.to_rfc3339(),
    }
}

/// GET /employees: search and paginate the directory.
pub async fn search_employees(
    query: web::Query<EmployeeSearch>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    require_employee(&identity)?;

    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100);
    let offset = (page - 1) * limit;
    let id_filter = query.search_id.clone().unwrap_or_default();
    let name_filter = query.search_name.clone().unwrap_or_default();

    let rows = sqlx::query_as::<_, EmployeeRow>(
        r#"
        SELECT id, name, role, email, active, created_at
        FROM employees
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

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
        .fetch_one(pool.get_ref())
        .await?;

    let search_result: Vec<EmployeeResponse> = rows.into_iter().map(to_response).collect();
    let employee_count = search_result.len();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "search_result": search_result,
        "employee_count": employee_count,
        "total_employee": total,
        "page": page,
        "limit": limit,
    })))
}

/// POST /employees: admin only.
pub async fn create_employee(
    form: web::Json<EmployeeInput>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    require_admin(&identity)?;

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO employees (id, name, role, email, active, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(&id)
    .bind(&form.name)
    .bind(&form.role)
    .bind(&form.email)
    .bind(form.active)
    .bind(Utc::now())
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Employee created successfully",
        "id": id,
    })))
}

/// PUT /employees/{id}: admin only; absent fields are left unchanged.
pub async fn update_employee(
    path: web::Path<String>,
    form: web::Json<EmployeeUpdate>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    require_admin(&identity)?;

    let result = sqlx::query(
        r#"
        UPDATE employees
        SET name = COALESCE($1, name),
            role = COALESCE($2, role),
            email = COALESCE($3, email),
            active = COALESCE($4, active)
        WHERE id = $5
        "#,
    )
    .bind(&form.name)
    .bind(&form.role)
    .bind(&form.email)
    .bind(form.active)
    .bind(path.as_str())
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound("Employee").into());
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Employee updated successfully" })))
}

/// DELETE /employees/{id}: admin only.
pub async fn delete_employee(
    path: web::Path<String>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    require_admin(&identity)?;

    let result = sqlx::query("DELETE FROM employees WHERE id = $1")
        .bind(path.as_str())
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound("Employee").into());
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Employee deleted successfully" })))
}
