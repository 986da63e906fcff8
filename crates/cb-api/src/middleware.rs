//! corkboard/crates/cb-api/src/middleware.rs Middleware
//!
//! Access logging and CORS for the single-page client.

use actix_cors::Cors;
use actix_web::middleware::Logger;

// Returns the access logger for the API.
pub fn standard_middleware() -> Logger {
    // remote-ip "request-line" status-code response-size "referrer" "user-agent"
    Logger::default()
}

// Configures CORS (Cross-Origin Resource Sharing) for the board client.
// A "*" entry allows any origin.
pub fn cors_policy(origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .max_age(3600);

    if origins.iter().any(|o| o == "*") {
        return cors.allow_any_origin();
    }
    origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}
