//! # corkboard Binary
//!
//! The entry point that serves the board API.

use actix_web::{web, App, HttpServer};
use cb_api::{configure_routes, middleware, AppState};
use corkboard::settings::Settings;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load()?;
    log::debug!("settings: {settings:?}");

    // Dynamic dispatch inside the service keeps the backends swappable.
    let state = web::Data::new(AppState {
        service: corkboard::build_service(&settings).await?,
        max_upload_bytes: settings.max_upload_bytes,
        client_assets: settings.client_assets.clone(),
    });

    log::info!(
        "corkboard starting on http://{}:{}",
        settings.host,
        settings.port
    );

    let origins = settings.cors_origins.clone();
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::cors_policy(&origins))
            .wrap(middleware::standard_middleware())
            .app_data(state.clone())
            .configure(configure_routes)
    });
    if let Some(workers) = settings.workers {
        server = server.workers(workers);
    }

    server
        .bind((settings.host.as_str(), settings.port))?
        .run()
        .await?;
    Ok(())
}
