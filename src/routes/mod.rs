use crate::models::AppState;
use axum::Router;

pub mod home_routes;
pub mod panel_routes;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", panel_routes::router())
        .merge(home_routes::router())
        .with_state(state)
}
