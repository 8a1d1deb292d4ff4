//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{CannedReplyAdapter, SupabaseAuthAdapter, SupabaseClient, SupabaseRestAdapter},
    config::Config,
    error::ApiError,
    web::{rest::ApiDoc, router, state::AppState},
};
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Service Adapters ---
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()?;
    let supabase = SupabaseClient::new(
        http,
        config.supabase_url.clone(),
        config.supabase_anon_key.clone(),
    );
    info!("Using backend project at {}", supabase.base_url());

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        auth: Arc::new(SupabaseAuthAdapter::new(supabase.clone())),
        sessions: Arc::new(SupabaseRestAdapter::new(supabase)),
        replies: Arc::new(CannedReplyAdapter::new(config.reply_delay)),
        config: config.clone(),
    });

    let origin = config.public_base_url.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!(
            "PUBLIC_BASE_URL '{}' is not a valid origin: {}",
            config.public_base_url, e
        ))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // --- 4. Create the Web Router ---
    // Merge the application with the Swagger UI router for a complete service.
    let app = Router::new()
        .merge(router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
