use backoffice::configuration::{get_configuration, DatabaseSettings};
use backoffice::startup::run;
use serde_json::{json, Value};
use sqlx::{Connection, Executor, PgConnection, PgPool};
use std::net::TcpListener;

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
}

async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = uuid::Uuid::new_v4().to_string();
    let connection_pool = configure_database(&configuration.database).await;

    let server = run(listener, connection_pool.clone(), configuration.jwt.clone())
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        db_pool: connection_pool,
    }
}

pub async fn configure_database(config: &DatabaseSettings) -> PgPool {
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");

    let connection_pool = PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database.");
    connection_pool
}

/// Sign up and log in an account with the given role, returning its
/// access token.
async fn access_token_for(app: &TestApp, email: &str, role: &str) -> String {
    let client = reqwest::Client::new();

    let signup = client
        .post(&format!("{}/auth/signup", &app.address))
        .json(&json!({
            "name": "Test User",
            "email": email,
            "password": "SecurePass123",
            "confirm_password": "SecurePass123",
            "role": role,
        }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, signup.status().as_u16());

    let login = client
        .post(&format!("{}/auth/login", &app.address))
        .json(&json!({ "email": email, "password": "SecurePass123" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, login.status().as_u16());

    let body: Value = login.json().await.expect("Failed to parse login response");
    body["access_token"]
        .as_str()
        .expect("No access token")
        .to_string()
}

async fn account_id_for(app: &TestApp, email: &str) -> String {
    sqlx::query_scalar("SELECT id FROM accounts WHERE email = $1")
        .bind(email)
        .fetch_one(&app.db_pool)
        .await
        .expect("Failed to fetch account id")
}

async fn create_product(app: &TestApp, admin_token: &str, name: &str, stock: i32) -> String {
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/products", &app.address))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({
            "name": name,
            "category": "widgets",
            "price": 9.99,
            "stock": stock,
        }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_str().expect("No product id").to_string()
}

async fn product_stock(app: &TestApp, product_id: &str) -> i32 {
    sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_one(&app.db_pool)
        .await
        .expect("Failed to fetch product stock")
}

async fn place_order(app: &TestApp, token: &str, product_id: &str, qty: i32) -> Value {
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/orders", &app.address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "customer_name": "Jamie Doe",
            "email": "jamie@example.com",
            "phone": "010-1234-5678",
            "address": "1 Main St",
            "items": [{ "product_id": product_id, "qty": qty }],
        }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    response.json().await.expect("Failed to parse response")
}

// --- Role gates ---

#[tokio::test]
async fn product_mutations_are_admin_only() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    for (email, role) in [
        ("emp@example.com", "EMPLOYEE"),
        ("cust@example.com", "CUSTOMER"),
    ] {
        let token = access_token_for(&app, email, role).await;

        let response = client
            .post(&format!("{}/products", &app.address))
            .header("Authorization", format!("Bearer {}", token))
            .json(&json!({ "name": "Widget", "category": "widgets", "price": 1.0 }))
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(403, response.status().as_u16(), "role {} should be denied", role);
        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["detail"], "Admin access required");
    }
}

#[tokio::test]
async fn admin_can_create_update_and_delete_products() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let token = access_token_for(&app, "admin@example.com", "ADMIN").await;
    let product_id = create_product(&app, &token, "Widget", 5).await;

    let update = client
        .put(&format!("{}/products/{}", &app.address, product_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "price": 19.99 }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, update.status().as_u16());

    let delete = client
        .delete(&format!("{}/products/{}", &app.address, product_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, delete.status().as_u16());

    let missing = client
        .delete(&format!("{}/products/{}", &app.address, product_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(404, missing.status().as_u16());
}

#[tokio::test]
async fn customers_cannot_list_employees_or_orders() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let token = access_token_for(&app, "cust@example.com", "CUSTOMER").await;

    for path in ["/employees", "/orders", "/customers"] {
        let response = client
            .get(&format!("{}{}", &app.address, path))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(403, response.status().as_u16(), "{} should be denied", path);
        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["detail"], "Employee access required");
    }
}

#[tokio::test]
async fn admin_passes_employee_gates() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let token = access_token_for(&app, "admin@example.com", "ADMIN").await;

    for path in ["/employees", "/orders", "/customers"] {
        let response = client
            .get(&format!("{}{}", &app.address, path))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(200, response.status().as_u16(), "{} should be allowed", path);
    }
}

#[tokio::test]
async fn any_authenticated_caller_can_browse_products() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let token = access_token_for(&app, "cust@example.com", "CUSTOMER").await;

    let response = client
        .get(&format!("{}/products", &app.address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
}

// --- Order workflow ---

#[tokio::test]
async fn placing_an_order_decrements_stock() {
    let app = spawn_app().await;

    let admin_token = access_token_for(&app, "admin@example.com", "ADMIN").await;
    let customer_token = access_token_for(&app, "cust@example.com", "CUSTOMER").await;
    let product_id = create_product(&app, &admin_token, "Widget", 10).await;

    let body = place_order(&app, &customer_token, &product_id, 3).await;
    assert_eq!(body["message"], "Order placed successfully");

    assert_eq!(7, product_stock(&app, &product_id).await);
}

#[tokio::test]
async fn order_rejects_insufficient_stock() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let admin_token = access_token_for(&app, "admin@example.com", "ADMIN").await;
    let product_id = create_product(&app, &admin_token, "Widget", 2).await;

    let response = client
        .post(&format!("{}/orders", &app.address))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({
            "customer_name": "Jamie Doe",
            "email": "jamie@example.com",
            "phone": "010-1234-5678",
            "address": "1 Main St",
            "items": [{ "product_id": product_id, "qty": 5 }],
        }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn cancelling_an_order_restores_stock() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let admin_token = access_token_for(&app, "admin@example.com", "ADMIN").await;
    let customer_token = access_token_for(&app, "cust@example.com", "CUSTOMER").await;
    let product_id = create_product(&app, &admin_token, "Widget", 10).await;

    let order = place_order(&app, &customer_token, &product_id, 4).await;
    let order_id = order["id"].as_str().expect("No order id");
    assert_eq!(6, product_stock(&app, &product_id).await);

    let cancel = client
        .put(&format!("{}/orders/{}", &app.address, order_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({ "status": "CANCELLED" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, cancel.status().as_u16());
    assert_eq!(10, product_stock(&app, &product_id).await);

    // A second CANCELLED update must not restore stock again.
    let repeat = client
        .put(&format!("{}/orders/{}", &app.address, order_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({ "status": "CANCELLED" }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, repeat.status().as_u16());
    assert_eq!(10, product_stock(&app, &product_id).await);
}

#[tokio::test]
async fn order_detail_includes_line_items() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let admin_token = access_token_for(&app, "admin@example.com", "ADMIN").await;
    let product_id = create_product(&app, &admin_token, "Widget", 10).await;

    let order = place_order(&app, &admin_token, &product_id, 2).await;
    let order_id = order["id"].as_str().expect("No order id");

    let response = client
        .get(&format!("{}/orders/{}", &app.address, order_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["order"]["status"], "PENDING");
    assert_eq!(body["items"][0]["product_id"], product_id.as_str());
    assert_eq!(body["items"][0]["qty"], 2);
    let total = body["order"]["total"].as_f64().expect("No order total");
    assert!((total - 19.98).abs() < 1e-9);
}

#[tokio::test]
async fn assign_order_is_admin_only_and_targets_employees() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let admin_token = access_token_for(&app, "admin@example.com", "ADMIN").await;
    let employee_token = access_token_for(&app, "emp@example.com", "EMPLOYEE").await;
    access_token_for(&app, "cust@example.com", "CUSTOMER").await;

    let employee_id = account_id_for(&app, "emp@example.com").await;
    let customer_id = account_id_for(&app, "cust@example.com").await;

    let product_id = create_product(&app, &admin_token, "Widget", 10).await;
    let order = place_order(&app, &admin_token, &product_id, 1).await;
    let order_id = order["id"].as_str().expect("No order id");

    // Employees cannot assign.
    let denied = client
        .post(&format!("{}/orders/{}/assign", &app.address, order_id))
        .header("Authorization", format!("Bearer {}", employee_token))
        .json(&json!({ "employee_id": employee_id }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(403, denied.status().as_u16());

    // Customers cannot be assignment targets.
    let bad_target = client
        .post(&format!("{}/orders/{}/assign", &app.address, order_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({ "employee_id": customer_id }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(400, bad_target.status().as_u16());
    let body: Value = bad_target.json().await.expect("Failed to parse response");
    assert_eq!(body["detail"], "Only employees can be assigned orders");

    // Admin assigning an employee succeeds and flips the status.
    let assigned = client
        .post(&format!("{}/orders/{}/assign", &app.address, order_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({ "employee_id": employee_id }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, assigned.status().as_u16());

    let status: String = sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_one(&app.db_pool)
        .await
        .expect("Failed to fetch order status");
    assert_eq!(status, "ASSIGNED");
}
