pub mod request_id;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::controllers::{audio::AudioController, health};
use crate::infrastructure::config::Config;
use crate::infrastructure::repositories::FileContentStore;

pub use request_id::{request_id_middleware, RequestId};

/// All routes with the request id, tracing and CORS layers applied
pub fn build_router(audio_controller: Arc<AudioController>, store: Arc<FileContentStore>) -> Router {
    let audio_routes = Router::new()
        .route("/api/audio/generate", post(AudioController::generate))
        .route("/api/audio/cache/:file", get(AudioController::get_cached))
        .with_state(audio_controller);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(store)
        .merge(audio_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware)),
        )
}

/// Bind and serve until the process is stopped
pub async fn start_http_server(config: Arc<Config>, app: Router) -> Result<(), Box<dyn std::error::Error>> {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
