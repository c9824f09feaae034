use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use property_concierge::config::{LoggingSettings, Settings};
use property_concierge::core::Orchestrator;
use property_concierge::routes::{self, AppState};
use property_concierge::services::{
    load_or_empty, spawn_reload_task, Catalog, CatalogHandle, ChatCompletionsClient, SessionStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Initialize tracing from the `[logging]` settings, `LOG_LEVEL` / `LOG_FORMAT` win
fn init_logging(logging: &LoggingSettings) {
    let logging = logging.clone().with_overrides(
        std::env::var("LOG_LEVEL").ok(),
        std::env::var("LOG_FORMAT").ok(),
    );

    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.is_pretty() {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Configuration comes first since it carries the logging setup
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            init_logging(&LoggingSettings::default());
            error!("Failed to load configuration: {}", e);
            return Err(std::io::Error::other(format!("Configuration error: {}", e)));
        }
    };

    init_logging(&settings.logging);

    info!("Starting property concierge...");
    info!("Configuration loaded successfully");

    if settings.generation.api_key.is_empty() {
        warn!("No generation API key configured, greetings and concise replies will fail");
    }

    // Knowledge base (an unusable source degrades to an empty catalog)
    let kb_path = PathBuf::from(&settings.knowledge_base.path);
    let catalog = CatalogHandle::new(Catalog::new(load_or_empty(&kb_path)));

    if let Some(secs) = settings.knowledge_base.reload_interval_secs {
        spawn_reload_task(catalog.clone(), kb_path.clone(), Duration::from_secs(secs.max(1)));
        info!("Knowledge base reload every {}s from {}", secs, kb_path.display());
    }

    let generator = ChatCompletionsClient::new(&settings.generation).map_err(|e| {
        error!("Failed to build generation client: {}", e);
        std::io::Error::other(e)
    })?;

    info!(
        "Generation client initialized (model: {}, timeout: {}s)",
        settings.generation.model, settings.generation.timeout_secs
    );

    let orchestrator = Arc::new(Orchestrator::new(catalog, Arc::new(generator), &settings));

    let sessions = SessionStore::new(
        settings.session.max_sessions,
        Duration::from_secs(settings.session.idle_timeout_secs),
        settings.assistant.default_language.clone(),
    );

    // Build application state
    let app_state = AppState { orchestrator, sessions };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(routes::json_config())
            .app_data(routes::query_config())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
