use axum::Router;
use tower_http::cors::CorsLayer;

use crate::routes::{admin, health, tickers};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .nest("/health", health::router())
        .merge(tickers::router())
        .merge(admin::router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
