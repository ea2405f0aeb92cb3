//! Portfolio Backend
//!
//! Serves published portfolio content from a read cache backed by a versioned
//! SQLite content store, and stores contact form submissions.

mod api;
mod auth;
mod cache;
mod config;
mod db;
mod errors;
mod models;
mod origin;
mod rate_limit;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cache::{MemoryCache, ReadCache, SqliteCache};
use config::Config;
use db::ContentStore;
use errors::AppError;
use models::{CacheEntry, ContentType};
use origin::OriginPolicy;
use rate_limit::RateLimiter;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ContentStore>,
    pub cache: Arc<dyn ReadCache>,
    pub origins: Arc<OriginPolicy>,
    pub contact_limiter: RateLimiter,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<ContentStore>, cache: Arc<dyn ReadCache>) -> Self {
        let origins = Arc::new(OriginPolicy::new(config.allowed_origins()));
        let contact_limiter =
            RateLimiter::new(config.contact_rate_window, config.contact_rate_limit);

        Self {
            store,
            cache,
            origins,
            contact_limiter,
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting portfolio backend");
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Allowed origins: {:?}", config.allowed_origins());

    if config.internal_secret.is_none() {
        tracing::warn!(
            "No internal secret configured (PORTFOLIO_INTERNAL_SECRET). Internal routes will reject all requests!"
        );
    }

    // Connect to the content store once, up front
    let store = Arc::new(ContentStore::new(config.database_url.clone()));
    store.repository().await?;
    tracing::info!(
        "Content store ready after {} connection attempt(s)",
        store.connect_attempts()
    );

    let cache: Arc<dyn ReadCache> = match &config.cache_url {
        Some(url) => {
            tracing::info!("Using shared SQLite read cache");
            Arc::new(SqliteCache::connect(url).await?)
        }
        None => {
            tracing::info!("Using in-process read cache");
            Arc::new(MemoryCache::new())
        }
    };

    let bind_addr = config.bind_addr;
    let state = AppState::new(config, store, cache);

    let warmed = warm_cache(&state).await?;
    tracing::info!("Read cache warmed for {} content types", warmed);

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Fill empty cache keys from the latest stored versions. Existing entries are
/// left alone. Returns how many keys were filled.
pub async fn warm_cache(state: &AppState) -> Result<usize, AppError> {
    let repo = state.store.repository().await?;
    let mut warmed = 0;

    for content_type in ContentType::ALL {
        if state.cache.get(content_type.key()).await?.is_some() {
            continue;
        }

        if let Some(latest) = repo.latest_content_version(content_type).await? {
            tracing::debug!(content_type = %content_type, version = latest.version, "Warming cache");
            cache::store_entry(
                state.cache.as_ref(),
                content_type.key(),
                &CacheEntry::from(latest),
            )
            .await?;
            warmed += 1;
        }
    }

    Ok(warmed)
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // Browser preflight for the contact form
    let allowed_origins: Vec<HeaderValue> = state
        .origins
        .allowed()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    let contact_cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    // Clone secret for the auth layer
    let secret = state.config.internal_secret.clone();

    // Internal routes
    let internal_routes = Router::new()
        .route(
            "/content/{content_type}",
            post(api::publish_content).delete(api::invalidate_content),
        )
        .route(
            "/content/{content_type}/rebuild",
            post(api::rebuild_content),
        )
        .route(
            "/content/{content_type}/history",
            get(api::content_history),
        )
        .route("/contact", get(api::list_contact_messages))
        // Apply secret auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::secret_auth_layer(secret.clone(), req, next)
        }));

    // Public routes
    let public_routes = Router::new()
        .route("/content/{content_type}", get(api::get_content))
        .route(
            "/contact",
            post(api::submit_contact).layer(contact_cors),
        );

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api/internal", internal_routes)
        .nest("/api", public_routes)
        .merge(health_routes)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
