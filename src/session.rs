use std::collections::HashMap;

use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::hash_access_token;
use crate::models::{Role, Session};
use crate::store::StoreError;

#[async_trait::async_trait]
pub trait SessionProvider: Send + Sync {
    /// Look up a live session by the SHA-256 hex of its access token.
    async fn resolve(&self, token_hash: &str) -> Result<Option<Session>, StoreError>;
}

#[derive(Default)]
pub struct InMemorySessions {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plain access token. Only its hash is kept.
    pub async fn insert_token(&self, token: &str, session: Session) {
        self.sessions
            .write()
            .await
            .insert(hash_access_token(token), session);
    }
}

#[async_trait::async_trait]
impl SessionProvider for InMemorySessions {
    async fn resolve(&self, token_hash: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.read().await.get(token_hash).cloned())
    }
}

pub struct PgSessions {
    db: PgPool,
}

impl PgSessions {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SessionLookupRow {
    session_token_id: Uuid,
    user_id: Uuid,
    role: i16,
}

#[async_trait::async_trait]
impl SessionProvider for PgSessions {
    async fn resolve(&self, token_hash: &str) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query_as::<_, SessionLookupRow>(
            r#"
            SELECT st.session_token_id, st.user_id, u.role
            FROM session_token st
            JOIN app_user u ON u.user_id = st.user_id
            WHERE st.session_token_hash = $1
              AND st.revoked_at IS NULL
              AND st.expires_at > now()
              AND u.is_active = true
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.db)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        // Touch last_seen_at (best-effort)
        if let Err(e) = sqlx::query(
            r#"
            UPDATE session_token
            SET last_seen_at = now()
            WHERE session_token_id = $1
            "#,
        )
        .bind(row.session_token_id)
        .execute(&self.db)
        .await
        {
            tracing::debug!(error = %e, "failed to touch session last_seen_at");
        }

        Ok(Some(Session {
            session_id: row.session_token_id,
            user_id: row.user_id,
            role: Role::from_code(row.role),
        }))
    }
}
