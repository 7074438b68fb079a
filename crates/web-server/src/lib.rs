use analytics::PredictionEngine;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use configuration::Config;
use database::DbRepository;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use weather::{OpenMeteoClient, WeatherGateway};

pub mod error;
pub mod handlers;
pub mod session;
pub mod views;

pub use error::AppError;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub repo: DbRepository,
    pub gateway: Arc<dyn WeatherGateway>,
    pub engine: PredictionEngine,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        repo: DbRepository,
        gateway: Arc<dyn WeatherGateway>,
        config: Config,
    ) -> Result<Self, AppError> {
        let engine = PredictionEngine::new(config.prediction.clone())?;
        Ok(Self { repo, gateway, engine, config: Arc::new(config) })
    }
}

/// Builds the full API router over the given state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.server.body_limit_bytes;
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/home", get(handlers::home))
        .route("/api/towns", get(handlers::list_towns))
        .route("/api/signup", post(handlers::signup))
        .route("/api/login", post(handlers::login))
        .route("/api/logout", post(handlers::logout))
        .route("/api/profile", get(handlers::profile))
        .route("/api/settings/password", post(handlers::change_password))
        .route("/api/support", post(handlers::support))
        .route("/api/weather", get(handlers::get_weather))
        .route("/api/cost-profit/summary", post(handlers::cost_profit_summary))
        .route(
            "/api/market-data",
            post(handlers::submit_market_data).delete(handlers::clear_market_data),
        )
        .route("/api/analytics", get(handlers::get_analytics))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit))
}

/// Connects the store, migrates it, and serves the API until the process stops.
///
/// Tracing is expected to be initialized by the caller.
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let addr = config.server.socket_addr()?;

    let db_pool = database::connect(&config.database).await?;
    database::run_migrations(&db_pool).await?;
    let repo = DbRepository::new(db_pool);
    let gateway: Arc<dyn WeatherGateway> = Arc::new(OpenMeteoClient::new(&config.weather)?);

    let app_state = Arc::new(AppState::new(repo, gateway, config)?);
    let app = build_router(app_state);

    tracing::info!("Web server listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
