mod auth;
mod config;
mod middleware;

mod error;
mod models;
mod panel;
mod routes;
mod seed;
mod session;
mod store;

use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::Config,
    models::{AppState, Role, Session},
    panel::registry::PanelRegistry,
    session::{InMemorySessions, PgSessions, SessionProvider},
    store::{
        AppointmentManager,
        memory::InMemoryAppointments,
        postgres::{PgAppointments, connect_pg},
    },
};

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use axum::http::header;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

type Collaborators = (Arc<dyn AppointmentManager>, Arc<dyn SessionProvider>);

async fn in_memory_collaborators(cfg: &Config) -> anyhow::Result<Collaborators> {
    let seed = match &cfg.seed_file {
        Some(path) => Some(seed::load(path)?),
        None => None,
    };

    let sessions = InMemorySessions::new();
    let appointments = match seed {
        Some(seed) => {
            seed::register_sessions(&sessions, seed.sessions).await;
            InMemoryAppointments::with_appointments(cfg.slot_policy, seed.appointments)
        }
        None => {
            // DEV ONLY: no seed, so hand out one token per staff role.
            for role in [Role::Admin, Role::Receptionist, Role::Psychologist] {
                let token = auth::generate_access_token();
                tracing::warn!(role = role.as_str(), %token, "issued development access token");
                let session = Session {
                    session_id: Uuid::new_v4(),
                    user_id: Uuid::new_v4(),
                    role,
                };
                sessions.insert_token(&token, session).await;
            }
            InMemoryAppointments::new(cfg.slot_policy)
        }
    };

    tracing::info!(appointments = appointments.len().await, "using in-memory collaborators");
    Ok((
        Arc::new(appointments) as Arc<dyn AppointmentManager>,
        Arc::new(sessions) as Arc<dyn SessionProvider>,
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cfg = Config::from_env()?;

    let (appointments, sessions): Collaborators = match &cfg.database_url {
        Some(url) => {
            let pool = connect_pg(url).await?;
            tracing::info!("using postgres collaborators");
            (
                Arc::new(PgAppointments::new(pool.clone(), cfg.slot_policy)) as Arc<dyn AppointmentManager>,
                Arc::new(PgSessions::new(pool)) as Arc<dyn SessionProvider>,
            )
        }
        None => in_memory_collaborators(&cfg).await?,
    };

    let state = AppState {
        appointments,
        sessions,
        panels: Arc::new(PanelRegistry::new(Duration::from_secs(
            cfg.panel_idle_minutes.saturating_mul(60),
        ))),
    };

    // DEV ONLY: allow browser clients served from another origin to drive the panel.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]);

    let app = routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    tracing::info!("Listening on http://{}", cfg.bind_addr);
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
