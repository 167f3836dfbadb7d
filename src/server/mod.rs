pub mod routes;

use crate::state::AppState;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

/// HTTP surface of the trade store plus the static dashboard.
pub fn router(state: Arc<AppState>) -> Router {
    let dashboard = state.config.dashboard_dir.clone();

    Router::new()
        .route(
            "/api/trades",
            get(routes::list_trades).post(routes::create_trade),
        )
        .route("/api/trades/{id}", axum::routing::patch(routes::update_trade))
        .route("/api/trades/{id}/close", axum::routing::post(routes::close_trade))
        .route("/api/counters", get(routes::get_counters))
        .fallback_service(
            tower_http::services::ServeDir::new(&dashboard)
                .fallback(tower_http::services::ServeFile::new(dashboard.join("index.html"))),
        )
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}
