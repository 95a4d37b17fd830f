// API route configuration

use crate::api::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Page shell and health probe
        .route("/", web::get().to(handlers::index))
        .route("/health", web::get().to(handlers::health_check))
        // Catalog surface (HTML fragments)
        .service(
            web::scope("/products")
                .route("", web::get().to(handlers::list_products))
                .route("", web::post().to(handlers::create_product))
                // Must come before the `{id}` matcher.
                .route("/search", web::get().to(handlers::search_products))
                .route("/{id}", web::get().to(handlers::get_product))
                .route("/{id}", web::put().to(handlers::update_product))
                .route("/{id}", web::delete().to(handlers::delete_product)),
        );
}
