/// Order routes. Customers place orders; employees and admins work the
/// queue; assignment is admin-only.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::accounts;
use crate::auth::{require_admin, require_employee, Identity, Role};
use crate::error::{AppError, DatabaseError};

#[derive(Serialize)]
pub struct OrderSummary {
    pub id: String,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub status: String,
    pub assigned_to: Option<String>,
    pub created_at: String,
    pub total: f64,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub qty: i32,
    pub price: f64,
}

#[derive(Deserialize)]
pub struct OrderSearch {
    pub search_id: Option<String>,
    pub customer_name: Option<String>,
    pub employee_id: Option<String>,
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
pub struct OrderItemInput {
    pub product_id: String,
    pub qty: i32,
}

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub items: Vec<OrderItemInput>,
}

#[derive(Deserialize)]
pub struct OrderUpdate {
    pub customer_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct AssignOrderRequest {
    pub employee_id: String,
}

type OrderRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    DateTime<Utc>,
    f64,
);

fn to_summary(row: OrderRow) -> OrderSummary {
    let (id, customer_name, email, phone, address, status, assigned_to, created_at, total) = row;
    OrderSummary {
        id,
        customer_name,
        email,
        phone,
        address,
        status,
        assigned_to,
        created_at: created_at.to_rfc3339(),
        total,
    }
}

/// GET /orders: employee-or-admin; filter by order id, customer name,
/// or assigned employee.
pub async fn search_orders(
    query: web::Query<OrderSearch>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    require_employee(&identity)?;

    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100);
    let offset = (page - 1) * limit;
    let id_filter = query.search_id.clone().unwrap_or_default();
    let customer_filter = query.customer_name.clone().unwrap_or_default();
    let employee_filter = query.employee_id.clone().unwrap_or_default();

    let rows = sqlx::query_as::<_, OrderRow>(
        r#"
        SELECT o.id, o.customer_name, o.email, o.phone, o.address, o.status,
               o.assigned_to, o.created_at,
               COALESCE((SELECT SUM(oi.qty * oi.price)
                         FROM order_items oi WHERE oi.order_id = o.id), 0)::float8
        FROM orders o
        WHERE ($1 = '' OR o.id = $1)
          AND ($2 = '' OR o.customer_name ILIKE '%' || $2 || '%')
          AND ($3 = '' OR o.employee_id = $3)
        ORDER BY o.created_at DESC, o.id DESC
        OFFSET $4 LIMIT $5
        "#,
    )
    .bind(&id_filter)
    .bind(&customer_filter)
    .bind(&employee_filter)
    .bind(offset)
    .bind(limit)
    .fetch_all(pool.get_ref())
    .await?;

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM orders o
        WHERE ($1 = '' OR o.id = $1)
          AND ($2 = '' OR o.customer_name ILIKE '%' || $2 || '%')
          AND ($3 = '' OR o.employee_id = $3)
        "#,
    )
    .bind(&id_filter)
    .bind(&customer_filter)
    .bind(&employee_filter)
    .fetch_one(pool.get_ref())
    .await?;

    let search_result: Vec<OrderSummary> = rows.into_iter().map(to_summary).collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "search_result": search_result,
        "orders_count": total,
        "page": page,
        "limit": limit,
        "total_pages": (total + limit - 1) / limit,
    })))
}

/// GET /orders/{id}: order header plus line items.
pub async fn get_order(
    path: web::Path<String>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    require_employee(&identity)?;

    let order = sqlx::query_as::<_, OrderRow>(
        r#"
        SELECT o.id, o.customer_name, o.email, o.phone, o.address, o.status,
               o.assigned_to, o.created_at,
               COALESCE((SELECT SUM(oi.qty * oi.price)
                         FROM order_items oi WHERE oi.order_id = o.id), 0)::float8
        FROM orders o
        WHERE o.id = $1
        "#,
    )
    .bind(path.as_str())
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or(DatabaseError::NotFound("Order"))?;

    let items = sqlx::query_as::<_, (String, String, i32, f64)>(
        "SELECT product_id, product_name, qty, price FROM order_items WHERE order_id = $1",
    )
    .bind(path.as_str())
    .fetch_all(pool.get_ref())
    .await?;

    let items: Vec<OrderItemResponse> = items
        .into_iter()
        .map(|(product_id, product_name, qty, price)| OrderItemResponse {
            product_id,
            product_name,
            qty,
            price,
        })
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "order": to_summary(order),
        "items": items,
    })))
}

/// POST /orders: place an order, decrementing product stock. Open to
/// any authenticated caller (customers included).
pub async fn place_order(
    form: web::Json<PlaceOrderRequest>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    if form.items.is_empty() {
        return Err(AppError::BadRequest("Order has no items".to_string()));
    }

    let order_id = Uuid::new_v4().to_string();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO orders
            (id, customer_name, email, phone, address, status, customer_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, 'PENDING', $6, $7, $7)
        "#,
    )
    .bind(&order_id)
    .bind(&form.customer_name)
    .bind(&form.email)
    .bind(&form.phone)
    .bind(&form.address)
    .bind(identity.id.as_deref())
    .bind(Utc::now())
    .execute(&mut tx)
    .await?;

    for item in &form.items {
        if item.qty <= 0 {
            return Err(AppError::BadRequest("Item quantity must be positive".to_string()));
        }

        let product = sqlx::query_as::<_, (String, f64, i32)>(
            "SELECT name, price, stock FROM products WHERE id = $1",
        )
        .bind(&item.product_id)
        .fetch_optional(&mut tx)
        .await?
        .ok_or(DatabaseError::NotFound("Product"))?;

        let (product_name, price, stock) = product;
        if stock < item.qty {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for product '{}'",
                product_name
            )));
        }

        sqlx::query("UPDATE products SET stock = stock - $1 WHERE id = $2")
            .bind(item.qty)
            .bind(&item.product_id)
            .execute(&mut tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, product_id, product_name, qty, price)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&order_id)
        .bind(&item.product_id)
        .bind(&product_name)
        .bind(item.qty)
        .bind(price)
        .execute(&mut tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(order_id = %order_id, placed_by = %identity.email, "order placed");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Order placed successfully",
        "id": order_id,
    })))
}

/// PUT /orders/{id}: employee-or-admin; a transition into CANCELLED
/// restores product stock from the line items.
pub async fn update_order(
    path: web::Path<String>,
    form: web::Json<OrderUpdate>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    require_employee(&identity)?;

    let mut tx = pool.begin().await?;

    let previous_status = sqlx::query_scalar::<_, String>(
        "SELECT status FROM orders WHERE id = $1",
    )
    .bind(path.as_str())
    .fetch_optional(&mut tx)
    .await?
    .ok_or(DatabaseError::NotFound("Order"))?;

    sqlx::query(
        r#"
        UPDATE orders
        SET customer_name = COALESCE($1, customer_name),
            email = COALESCE($2, email),
            phone = COALESCE($3, phone),
            address = COALESCE($4, address),
            status = COALESCE($5, status),
            updated_at = $6
        WHERE id = $7
        "#,
    )
    .bind(&form.customer_name)
    .bind(&form.email)
    .bind(&form.phone)
    .bind(&form.address)
    .bind(&form.status)
    .bind(Utc::now())
    .bind(path.as_str())
    .execute(&mut tx)
    .await?;

    // Restore stock exactly once, on the transition into CANCELLED.
    if form.status.as_deref() == Some("CANCELLED") && previous_status != "CANCELLED" {
        sqlx::query(
            r#"
            UPDATE products p
            SET stock = p.stock + oi.qty
            FROM order_items oi
            WHERE oi.order_id = $1 AND p.id = oi.product_id
            "#,
        )
        .bind(path.as_str())
        .execute(&mut tx)
        .await?;
    }

    tx.commit().await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Order updated" })))
}

/// DELETE /orders/{id}: employee-or-admin.
pub async fn delete_order(
    path: web::Path<String>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    require_employee(&identity)?;

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM order_items WHERE order_id = $1")
        .bind(path.as_str())
        .execute(&mut tx)
        .await?;

    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(path.as_str())
        .execute(&mut tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound("Order").into());
    }

    tx.commit().await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Delete order successfully" })))
}

/// POST /orders/{id}/assign: admin only; the target account must hold
/// the EMPLOYEE role.
pub async fn assign_order(
    path: web::Path<String>,
    form: web::Json<AssignOrderRequest>,
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    require_admin(&identity)?;

    let order_exists = sqlx::query_scalar::<_, String>("SELECT id FROM orders WHERE id = $1")
        .bind(path.as_str())
        .fetch_optional(pool.get_ref())
        .await?;
    if order_exists.is_none() {
        return Err(DatabaseError::NotFound("Order").into());
    }

    let employee = accounts::find_by_id(pool.get_ref(), &form.employee_id)
        .await?
        .ok_or(DatabaseError::NotFound("Employee"))?;

    if employee.role != Role::Employee {
        return Err(AppError::BadRequest(
            "Only employees can be assigned orders".to_string(),
        ));
    }

    sqlx::query(
        r#"
        UPDATE orders
        SET employee_id = $1, assigned_to = $2, status = 'ASSIGNED', updated_at = $3
        WHERE id = $4
        "#,
    )
    .bind(&employee.id)
    .bind(&employee.name)
    .bind(Utc::now())
    .bind(path.as_str())
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Order assigned",
        "assigned_to": employee.name,
    })))
}
