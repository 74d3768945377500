use axum::{Json, Router, extract::State, routing::get};

use crate::error::ApiError;
use crate::middleware::auth_context::AuthContext;
use crate::models::AppState;
use crate::panel::capability::{Action, Capabilities};

#[derive(serde::Serialize)]
pub struct HomeResponse {
    pub data: HomeData,
}

#[derive(serde::Serialize)]
pub struct HomeData {
    pub view: String,
    pub capabilities: Capabilities,
    pub actions: Vec<Action>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/home", get(home))
}

pub async fn home(
    State(_state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<HomeResponse>, ApiError> {
    let view = auth
        .session()
        .map_or("anonymous", |s| s.role.as_str())
        .to_string();
    let capabilities = Capabilities::for_session(auth.session());

    Ok(Json(HomeResponse {
        data: HomeData {
            view,
            capabilities,
            actions: capabilities.actions(),
        },
    }))
}
