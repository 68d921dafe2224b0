use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::configuration::JwtSettings;
use crate::middleware::{AuthMiddleware, PublicPaths, RequestLogger};
use crate::routes::{
    assign_order, create_employee, create_product, delete_customer, delete_employee, delete_order,
    delete_product, get_customer, get_order, health_check, login, logout, me, place_order, refresh,
    search_customers, search_employees, search_orders, search_products, signup, update_customer,
    update_employee, update_order, update_product,
};

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    jwt_config: JwtSettings,
) -> Result<Server, std::io::Error> {
    let connection = web::Data::new(connection);
    let jwt_config_data = web::Data::new(jwt_config.clone());

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware; the auth layer skips its own allow-list.
            .wrap(AuthMiddleware::new(jwt_config.clone(), PublicPaths::standard()))
            .wrap(RequestLogger)
            // Shared state
            .app_data(connection.clone())
            .app_data(jwt_config_data.clone())
            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/signup", web::post().to(signup))
            .route("/auth/login", web::post().to(login))
            .route("/auth/refresh", web::post().to(refresh))
            // Authenticated routes
            .route("/auth/logout", web::post().to(logout))
            .route("/auth/me", web::get().to(me))
            .route("/employees", web::get().to(search_employees))
            .route("/employees", web::post().to(create_employee))
            .route("/employees/{id}", web::put().to(update_employee))
            .route("/employees/{id}", web::delete().to(delete_employee))
            .route("/customers", web::get().to(search_customers))
            .route("/customers/{id}", web::get().to(get_customer))
            .route("/customers/{id}", web::put().to(update_customer))
            .route("/customers/{id}", web::delete().to(delete_customer))
            .route("/products", web::get().to(search_products))
            .route("/products", web::post().to(create_product))
            .route("/products/{id}", web::put().to(update_product))
            .route("/products/{id}", web::delete().to(delete_product))
            .route("/orders", web::get().to(search_orders))
            .route("/orders", web::post().to(place_order))
            .route("/orders/{id}", web::get().to(get_order))
            .route("/orders/{id}", web::put().to(update_order))
            .route("/orders/{id}", web::delete().to(delete_order))
            .route("/orders/{id}/assign", web::post().to(assign_order))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
