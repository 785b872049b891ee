pub mod auth;
pub mod cards;
pub mod index;

use actix_web::web;

use crate::auth::AuthMiddleware;
use crate::error::AppError;

/// Mounts every route. `/cards` sits behind `AuthMiddleware`; `/` and `/auth` are open.
///
/// Malformed JSON bodies are answered with the same `{"error": ...}` shape as every
/// other failure.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(index::index)
        .service(
            web::scope("/auth")
                .service(auth::register)
                .service(auth::login),
        )
        .service(
            web::scope("/cards")
                .wrap(AuthMiddleware)
                .service(cards::get_cards),
        );
}

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}
