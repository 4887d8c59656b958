//! HTTP handlers and route configuration.

mod auth;
mod health;
mod posts;

use std::sync::Arc;

use actix_web::web;

use blog_core::ports::RateLimiter;

use crate::middleware::rate_limit::RateLimitMiddleware;

/// Configure all application routes. `rate_limiter` guards the auth endpoints.
pub fn configure_routes(cfg: &mut web::ServiceConfig, rate_limiter: Option<Arc<dyn RateLimiter>>) {
    cfg.route("/", web::get().to(posts::home))
        .route("/post/{id}", web::get().to(posts::view_post))
        .route("/createNewPost", web::get().to(posts::new_post_form))
        .route("/createNewPost", web::post().to(posts::create_post))
        .route("/editPost/{id}", web::get().to(posts::edit_post_form))
        .route("/editPost/{id}", web::post().to(posts::update_post))
        .route("/deletePost/{id}", web::post().to(posts::delete_post))
        .service(
            web::scope("/api")
                // Public routes
                .route("/health", web::get().to(health::health_check))
                // Auth routes
                .service(
                    web::scope("/auth")
                        .wrap(RateLimitMiddleware::new(rate_limiter))
                        .route("/register", web::post().to(auth::register))
                        .route("/login", web::post().to(auth::login))
                        .route("/me", web::get().to(auth::me)),
                ),
        );
}
