pub mod health;
pub mod auth;
pub mod public;
pub mod client;
pub mod sales;
pub mod admin;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(health::health_check)
            .configure(auth::auth_routes)
            .configure(public::public_routes)
            .configure(client::client_routes)
            .configure(sales::sales_routes)
            .configure(admin::admin_routes)
    );
}
