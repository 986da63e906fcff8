//! # cb-api
//!
//! The web routing and orchestration layer for corkboard.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod multipart;

use actix_web::web;

pub use error::ApiError;
pub use handlers::AppState;

/// Configures the routes for the board.
///
/// Each path is a resource, so a request with the wrong method gets a 405.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/board/details").route(web::get().to(handlers::board_details)),
    )
    .service(web::resource("/api/board/posts/get").route(web::get().to(handlers::get_posts)))
    .service(
        web::resource("/api/board/posts/create").route(web::post().to(handlers::create_post)),
    )
    .service(
        web::resource("/api/board/images/{image}").route(web::get().to(handlers::get_image)),
    )
    .service(web::resource("/").route(web::get().to(handlers::board_page)))
    .service(web::resource("/{board}/").route(web::get().to(handlers::board_page)));
}
