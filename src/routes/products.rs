/// Product catalog routes. The catalog is readable by any authenticated
/// caller; mutations are admin-only.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{require_admin, Identity};
use crate::error::{AppError, DatabaseError};

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub stock: i32,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Deserialize)]
pub struct ProductSearch {
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
pub struct ProductInput {
    pub name: String,
    pub category: String,
    pub price: f64,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i32>,
    pub active: Option<bool>,
}

type ProductRow = (
    String,
    String,
    String,
    f64,
    i32,
    bool,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn to_response(row: ProductRow) -> ProductResponse {
    let (id, name, category, price, stock, active, created_at, updated_at) = row;
    ProductResponse {
        id,
        name,
        category,
        price,
        stock,
        active,
        created_at: created_at.to_rfc3339(),
        updated_at: updated_at.to_rfc3339(),
    }
}

/// GET /products: any authenticated caller.
pub async fn search_products(
    query: web::Query<ProductSearch>,
    _identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100);
    let offset = (page - 1) * limit;
    let id_filter = query.search_id.clone().unwrap_or_default();
    let name_filter = query.search_name.clone().unwrap_or_default();

    let rows = sqlx::query_as::<_, ProductRow>(
        r#"
        SELECT id, name, category, price, stock, active, created_at, updated_at
        FROM products
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

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(pool.get_ref())
        .await?;

    let search_result: Vec<ProductResponse> = rows.into_iter().map(to_response).collect();
    let product_count = search_result.len();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "search_result": search_result,
        "product_count": product_count,
        "total_product": total,
        "page": page,
        "limit": limit,
    })))
}

/// POST /products: admin only.
pub async fn create_product(
    form: web::Json<ProductInput>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    require_admin(&identity)?;

    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO products (id, name, category, price, stock, active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(&id)
    .bind(&form.name)
    .bind(&form.category)
    .bind(form.price)
    .bind(form.stock)
    .bind(form.active)
    .bind(now)
    .bind(now)
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Product created successfully",
        "id": id,
    })))
}

/// PUT /products/{id}: admin only; absent fields are left unchanged.
pub async fn update_product(
    path: web::Path<String>,
    form: web::Json<ProductUpdate>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    require_admin(&identity)?;

    let result = sqlx::query(
        r#"
        UPDATE products
        SET name = COALESCE($1, name),
            category = COALESCE($2, category),
            price = COALESCE($3, price),
            stock = COALESCE($4, stock),
            active = COALESCE($5, active),
            updated_at = $6
        WHERE id = $7
        "#,
    )
    .bind(&form.name)
    .bind(&form.category)
    .bind(form.price)
    .bind(form.stock)
    .bind(form.active)
    .bind(Utc::now())
    .bind(path.as_str())
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound("Product").into());
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Product updated successfully" })))
}

/// DELETE /products/{id}: admin only.
pub async fn delete_product(
    path: web::Path<String>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    require_admin(&identity)?;

    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(path.as_str())
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound("Product").into());
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Product deleted successfully" })))
}
