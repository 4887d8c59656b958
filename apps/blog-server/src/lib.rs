//! # Blog Server
//!
//! Actix-web application: the post pages, the authentication endpoints and
//! the middleware around them. `main.rs` only loads configuration and binds.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod state;
pub mod telemetry;

use actix_web::web;

use middleware::error::AppError;
use state::AppState;

/// Register the shared state, body extractor settings and routes.
pub fn configure_app(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let rate_limiter = state.rate_limiter.clone();
        cfg.app_data(web::Data::new(state))
            .app_data(json_config())
            .app_data(form_config());
        handlers::configure_routes(cfg, rate_limiter);
    }
}

/// Malformed JSON bodies are answered with a problem document.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

fn form_config() -> web::FormConfig {
    web::FormConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}
