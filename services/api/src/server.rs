use crate::cli::ServeArgs;
use crate::infra::{self, ApiState, AppState};
use crate::routes;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use edumarket::catalog::CareerQuery;
use edumarket::config::{AppConfig, CorsConfig};
use edumarket::error::{AppError, ServiceError};
use edumarket::store::DocumentStore;
use edumarket::{telemetry, Marketplace, SecuritySettings};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let mailer = infra::mailer(config.mail.as_ref())?;
    let store = match &config.storage.database_path {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(dir).await?;
            }
            DocumentStore::open(path).map_err(ServiceError::from)?
        }
        None => {
            tracing::warn!("DATABASE_PATH not set; records are kept in memory only");
            DocumentStore::new()
        }
    };
    let market = Arc::new(Marketplace::new(
        Arc::new(store),
        mailer,
        &SecuritySettings::from(&config.auth),
    ));
    bootstrap(&market, &config)?;

    tokio::fs::create_dir_all(&config.uploads.upload_dir).await?;
    let body_limit = config.uploads.max_bytes;
    let state = ApiState::new(market, config.uploads.clone());

    let app = routes::router(state)
        .layer(Extension(app_state))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors_layer(&config.cors))
        .layer(TraceLayer::new_for_http())
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "edumarket api ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Seeds the configured admin and, on an empty store, the starter career library.
fn bootstrap(market: &Marketplace<DocumentStore>, config: &AppConfig) -> Result<(), AppError> {
    if let Some(seed) = &config.admin_seed {
        market
            .accounts
            .seed_admin(&seed.name, &seed.email, &seed.password)?;
    }
    if market.catalog.careers(&CareerQuery::default())?.is_empty() {
        market.catalog.seed_careers()?;
    }
    Ok(())
}

/// Any origin when none are configured; unparsable entries are skipped with a warning.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.allowed_origins.is_empty() {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(origins)
}
