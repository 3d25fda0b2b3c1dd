use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use std::sync::Arc;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;
use yojana_match::config::{LogFormat, Settings};
use yojana_match::core::Matcher;
use yojana_match::routes::{self, schemes::AppState};
use yojana_match::services::{build_embedder, load_catalog, SessionStore};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle path parameter errors
pub fn handle_path_error(err: error::PathError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_path".to_string(),
        message: format!("Invalid path: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_logging(level: &str, format: LogFormat) {
    // RUST_LOG wins, then LOG_LEVEL, then the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(std::env::var("LOG_LEVEL").unwrap_or_else(|_| level.to_string())))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let log_format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|value| LogFormat::parse(&value))
        .unwrap_or(format);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.pretty().init(),
        LogFormat::Compact => subscriber.compact().init(),
    }
}

fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_logging(&settings.logging.level, settings.logging.format);

    info!("Starting Yojana Match service...");

    let catalog = match load_catalog(&settings.catalog.path) {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => {
            error!("Failed to load catalog from {}: {}", settings.catalog.path, e);
            return Err(std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()));
        }
    };

    if catalog.is_empty() {
        error!("Catalog {} contains no schemes, every query will return nothing", settings.catalog.path);
    }

    // Built outside the async runtime: the HTTP embedder owns a blocking client
    let embedder = match build_embedder(&settings.embedding) {
        Ok(embedder) => embedder,
        Err(e) => {
            error!("Failed to initialize embedding provider: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };

    info!(
        "Embedding provider initialized ({:?}, model: {})",
        settings.embedding.provider,
        settings.embedding.model
    );

    let matcher = Matcher::new(embedder, settings.matching.policy());

    info!("Matcher initialized with policy: {:?}", matcher.policy());

    let sessions = Arc::new(SessionStore::new(
        settings.session.max_sessions,
        settings.session.ttl_secs,
        settings.session.max_turns,
    ));

    let app_state = AppState {
        catalog,
        matcher: matcher.clone(),
        sessions,
        matching: settings.matching.clone(),
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    let result = actix_web::rt::System::new().block_on(async move {
        HttpServer::new(move || {
            let cors = Cors::permissive();

            App::new()
                .app_data(web::Data::new(app_state.clone()))
                .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
                .app_data(web::PathConfig::default().error_handler(handle_path_error))
                .wrap(cors)
                .wrap(middleware::Logger::default())
                .wrap(middleware::Compress::default())
                .configure(routes::configure_routes)
        })
        .workers(workers)
        .bind((host, port))?
        .run()
        .await
    });

    // Last handle to the embedder is released here, outside the runtime
    drop(matcher);

    result
}
