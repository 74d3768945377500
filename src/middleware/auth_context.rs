use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};

use crate::auth::hash_access_token;
use crate::error::ApiError;
use crate::models::{AppState, Session};

/// The viewer behind a request. `session` is `None` for anonymous viewers.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub session: Option<Session>,
}

impl AuthContext {
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            // No credentials at all: read-only viewer
            if !parts.headers.contains_key(header::AUTHORIZATION) {
                return Ok(AuthContext::default());
            }

            // Extract Authorization: Bearer <token>
            let TypedHeader(authz): TypedHeader<Authorization<Bearer>> =
                TypedHeader::from_request_parts(parts, state)
                    .await
                    .map_err(|_| ApiError::session_expired())?;

            let token_hash = hash_access_token(authz.token());

            let session = state
                .sessions
                .resolve(&token_hash)
                .await?
                .ok_or_else(ApiError::session_expired)?;

            Ok(AuthContext {
                session: Some(session),
            })
        }
    }
}
