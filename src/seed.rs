use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{Appointment, Role, Session};
use crate::session::InMemorySessions;

#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub appointments: Vec<Appointment>,
    #[serde(default)]
    pub sessions: Vec<SeedSession>,
}

#[derive(Debug, Deserialize)]
pub struct SeedSession {
    /// Plain access token, as a client would send it.
    pub token: String,
    #[serde(default = "Uuid::new_v4")]
    pub user_id: Uuid,
    pub role: Role,
}

pub fn load(path: &Path) -> anyhow::Result<SeedFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading seed file {}", path.display()))?;
    parse(&raw).with_context(|| format!("parsing seed file {}", path.display()))
}

fn parse(raw: &str) -> anyhow::Result<SeedFile> {
    Ok(serde_json::from_str(raw)?)
}

pub async fn register_sessions(sessions: &InMemorySessions, seeds: Vec<SeedSession>) {
    for seed in seeds {
        let session = Session {
            session_id: Uuid::new_v4(),
            user_id: seed.user_id,
            role: seed.role,
        };
        sessions.insert_token(&seed.token, session).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_access_token;
    use crate::models::{AppointmentStatus, PaymentMethod};
    use crate::session::SessionProvider;

    const SEED: &str = r#"{
        "appointments": [{
            "id": "6f1c2a44-7f0e-4d55-9a0c-0b6a4d0b6c11",
            "patient_id": "2b1f4c3e-1111-4a2b-8c3d-000000000001",
            "patient_name": "Carla Mendes",
            "psychologist_id": "2b1f4c3e-2222-4a2b-8c3d-000000000002",
            "psychologist_name": "Dra. Helena Prado",
            "room_name": "Sala 3",
            "date": "2025-04-14",
            "start_time": "10:00:00",
            "end_time": "10:50:00",
            "payment_method": "insurance",
            "insurance_type": "Bradesco Saúde",
            "insurance_token": null,
            "value_cents": 18000,
            "status": "awaiting_payment"
        }],
        "sessions": [{ "token": "dev-admin", "role": "admin" }]
    }"#;

    #[test]
    fn parses_appointments_with_unknown_status() {
        let seed = parse(SEED).unwrap();
        assert_eq!(seed.appointments.len(), 1);
        let appt = &seed.appointments[0];
        assert_eq!(appt.payment_method, PaymentMethod::Insurance);
        assert_eq!(appt.status, AppointmentStatus::Other("awaiting_payment".into()));
        assert_eq!(seed.sessions[0].role, Role::Admin);
    }

    #[test]
    fn empty_object_is_an_empty_seed() {
        let seed = parse("{}").unwrap();
        assert!(seed.appointments.is_empty());
        assert!(seed.sessions.is_empty());
    }

    #[tokio::test]
    async fn registered_sessions_resolve_by_token() {
        let sessions = InMemorySessions::new();
        register_sessions(&sessions, parse(SEED).unwrap().sessions).await;

        let session = sessions
            .resolve(&hash_access_token("dev-admin"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.role, Role::Admin);
    }
}
