// src/routes/panel_routes.rs

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::{auth_context::AuthContext, json_body::JsonBody},
    models::{ApiOk, AppState, EditRescheduleRequest, EditTokenRequest, SelectStatusRequest},
    panel::{ClosedPanel, PanelView, registry::PanelHandle},
};

type PanelResponse = Result<Json<ApiOk<PanelView>>, ApiError>;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/appointments/{appointment_id}/panel",
            get(open_panel).delete(close_panel),
        )
        .route("/appointments/{appointment_id}/panel/status", put(select_status))
        .route("/appointments/{appointment_id}/panel/token", put(edit_token))
        .route("/appointments/{appointment_id}/panel/token/save", post(save_token))
        .route(
            "/appointments/{appointment_id}/panel/reschedule",
            post(open_reschedule).patch(edit_reschedule),
        )
        .route(
            "/appointments/{appointment_id}/panel/reschedule/confirm",
            post(confirm_reschedule),
        )
        .route(
            "/appointments/{appointment_id}/panel/reschedule/cancel",
            post(cancel_reschedule),
        )
        .route("/appointments/{appointment_id}/panel/delete", post(request_delete))
        .route(
            "/appointments/{appointment_id}/panel/delete/confirm",
            post(confirm_delete),
        )
        .route(
            "/appointments/{appointment_id}/panel/delete/cancel",
            post(cancel_delete),
        )
}

async fn checkout(state: &AppState, auth: &AuthContext, appointment_id: Uuid) -> Result<PanelHandle, ApiError> {
    Ok(state
        .panels
        .acquire(auth.session(), appointment_id, state.appointments.as_ref())
        .await?)
}

async fn render(state: &AppState, panel: PanelHandle) -> PanelResponse {
    let view = state
        .panels
        .release(panel, state.appointments.as_ref())
        .await?;
    Ok(Json(ApiOk { data: view }))
}

/* ============================================================
   Panel lifecycle
   ============================================================ */

pub async fn open_panel(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> PanelResponse {
    let panel = checkout(&state, &auth, appointment_id).await?;
    render(&state, panel).await
}

pub async fn close_panel(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> Json<ApiOk<ClosedPanel>> {
    state.panels.close(auth.session(), appointment_id);
    Json(ApiOk {
        data: ClosedPanel {
            appointment_id,
            closed: true,
        },
    })
}

/* ============================================================
   Status
   ============================================================ */

pub async fn select_status(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
    JsonBody(req): JsonBody<SelectStatusRequest>,
) -> PanelResponse {
    let mut panel = checkout(&state, &auth, appointment_id).await?;
    panel
        .select_status(req.status, state.appointments.as_ref())
        .await?;
    render(&state, panel).await
}

/* ============================================================
   Insurance token
   ============================================================ */

pub async fn edit_token(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
    JsonBody(req): JsonBody<EditTokenRequest>,
) -> PanelResponse {
    let mut panel = checkout(&state, &auth, appointment_id).await?;
    panel.edit_token(req.token)?;
    render(&state, panel).await
}

pub async fn save_token(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> PanelResponse {
    let mut panel = checkout(&state, &auth, appointment_id).await?;
    panel.save_token(state.appointments.as_ref()).await?;
    render(&state, panel).await
}

/* ============================================================
   Reschedule dialog
   ============================================================ */

pub async fn open_reschedule(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> PanelResponse {
    let mut panel = checkout(&state, &auth, appointment_id).await?;
    panel.open_reschedule(state.appointments.as_ref()).await?;
    render(&state, panel).await
}

pub async fn edit_reschedule(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
    JsonBody(req): JsonBody<EditRescheduleRequest>,
) -> PanelResponse {
    let mut panel = checkout(&state, &auth, appointment_id).await?;
    panel.edit_reschedule(req.date, req.start_time, req.end_time)?;
    render(&state, panel).await
}

pub async fn confirm_reschedule(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> PanelResponse {
    let mut panel = checkout(&state, &auth, appointment_id).await?;
    panel.confirm_reschedule(state.appointments.as_ref()).await?;
    render(&state, panel).await
}

pub async fn cancel_reschedule(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> PanelResponse {
    let mut panel = checkout(&state, &auth, appointment_id).await?;
    panel.cancel_reschedule()?;
    render(&state, panel).await
}

/* ============================================================
   Delete (two-step)
   ============================================================ */

pub async fn request_delete(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> PanelResponse {
    let mut panel = checkout(&state, &auth, appointment_id).await?;
    panel.request_delete()?;
    render(&state, panel).await
}

pub async fn confirm_delete(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> PanelResponse {
    let mut panel = checkout(&state, &auth, appointment_id).await?;
    panel.confirm_delete(state.appointments.as_ref()).await?;
    render(&state, panel).await
}

pub async fn cancel_delete(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> PanelResponse {
    let mut panel = checkout(&state, &auth, appointment_id).await?;
    panel.cancel_delete()?;
    render(&state, panel).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use chrono::{NaiveDate, NaiveDateTime};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::models::{Appointment, AppointmentStatus, PaymentMethod, Role, Session};
    use crate::panel::registry::PanelRegistry;
    use crate::session::InMemorySessions;
    use crate::store::AppointmentManager;
    use crate::store::memory::InMemoryAppointments;
    use crate::store::memory::tests::sample_appointment;
    use crate::store::slots::SlotPolicy;

    fn monday_morning() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 3)
            .unwrap()
            .and_hms_opt(7, 0, 0)
            .unwrap()
    }

    struct Harness {
        app: Router,
        store: Arc<InMemoryAppointments>,
        appointment: Appointment,
    }

    async fn harness(appointment: Appointment) -> Harness {
        let store = Arc::new(
            InMemoryAppointments::with_appointments(SlotPolicy::default(), [appointment.clone()])
                .with_clock(monday_morning),
        );
        let sessions = InMemorySessions::new();
        for (token, role) in [
            ("admin-token", Role::Admin),
            ("reception-token", Role::Receptionist),
            ("psy-token", Role::Psychologist),
            ("patient-token", Role::Other("patient".into())),
        ] {
            let session = Session {
                session_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                role,
            };
            sessions.insert_token(token, session).await;
        }

        let state = AppState {
            appointments: store.clone(),
            sessions: Arc::new(sessions),
            panels: Arc::new(PanelRegistry::new(Duration::from_secs(600))),
        };

        Harness {
            app: crate::routes::router(state),
            store,
            appointment,
        }
    }

    impl Harness {
        async fn call(&self, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
            let uri = format!("/api/v1/appointments/{}/panel{path}", self.appointment.id);
            let mut req = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                req = req.header("authorization", format!("Bearer {token}"));
            }
            let body = match body {
                Some(v) => {
                    req = req.header("content-type", "application/json");
                    Body::from(serde_json::to_vec(&v).unwrap())
                }
                None => Body::empty(),
            };

            let resp = self.app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
            let status = resp.status();
            let bytes = resp.into_body().collect().await.unwrap().to_bytes();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, json)
        }
    }

    #[tokio::test]
    async fn receptionist_edits_and_saves_token() {
        let h = harness(sample_appointment()).await;

        let (status, body) = h.call(Method::GET, "", Some("reception-token"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["token_editor"]["value"], "");

        let (status, _) = h
            .call(Method::PUT, "/token", Some("reception-token"), Some(json!({ "token": "AUTH-123" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        let stored = h.store.get_appointment(h.appointment.id).await.unwrap().unwrap();
        assert_eq!(stored.insurance_token, None);

        let (status, body) = h.call(Method::POST, "/token/save", Some("reception-token"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["notifications"][0]["title"], "Token salvo");

        let stored = h.store.get_appointment(h.appointment.id).await.unwrap().unwrap();
        assert_eq!(stored.insurance_token.as_deref(), Some("AUTH-123"));
        assert_eq!(
            Appointment {
                insurance_token: None,
                ..stored
            },
            h.appointment
        );
    }

    #[tokio::test]
    async fn anonymous_and_patient_get_read_only_panel() {
        let h = harness(sample_appointment()).await;

        for token in [None, Some("patient-token")] {
            let (status, body) = h.call(Method::GET, "", token, None).await;
            assert_eq!(status, StatusCode::OK);
            let data = &body["data"];
            assert_eq!(data["actions"], json!(["close"]));
            assert!(data["status_selector"].is_null());
            assert!(data["token_editor"].is_null());
            assert_eq!(data["detail"]["patient_name"], "Maria Silva");

            let (status, body) = h
                .call(Method::PUT, "/status", token, Some(json!({ "status": "cancelled" })))
                .await;
            assert_eq!(status, StatusCode::FORBIDDEN);
            assert_eq!(body["error"]["code"], "FORBIDDEN");

            let (status, _) = h.call(Method::POST, "/delete", token, None).await;
            assert_eq!(status, StatusCode::FORBIDDEN);
        }

        let (status, body) = h.call(Method::DELETE, "", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["closed"], true);
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let h = harness(sample_appointment()).await;
        let (status, body) = h.call(Method::GET, "", Some("nope"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "SESSION_EXPIRED");
    }

    #[tokio::test]
    async fn status_change_flows_back_into_the_badge() {
        let h = harness(sample_appointment()).await;

        let (status, body) = h
            .call(Method::PUT, "/status", Some("admin-token"), Some(json!({ "status": "confirmed" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["detail"]["status"], json!({ "color": "green", "label": "Confirmado" }));
        assert_eq!(body["data"]["status_selector"]["selected"], "confirmed");

        let (status, body) = h
            .call(Method::PUT, "/status", Some("admin-token"), Some(json!({ "status": "completed" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
        let stored = h.store.get_appointment(h.appointment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AppointmentStatus::Confirmed);
    }

    #[tokio::test]
    async fn malformed_bodies_get_the_error_envelope() {
        let h = harness(sample_appointment()).await;
        h.call(Method::POST, "/reschedule", Some("admin-token"), None).await;

        for (method, path, body) in [
            (Method::PUT, "/status", json!({})),
            (Method::PUT, "/token", json!({ "token": 42 })),
            (Method::PATCH, "/reschedule", json!({ "start_time": "nine o'clock" })),
        ] {
            let (status, body) = h.call(method, path, Some("admin-token"), Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
            assert_eq!(body["error"]["code"], "BAD_REQUEST", "{path}");
        }
    }

    #[tokio::test]
    async fn completed_appointment_hides_token_only() {
        let mut appt = sample_appointment();
        appt.status = AppointmentStatus::Completed;
        let h = harness(appt).await;

        let (_, body) = h.call(Method::GET, "", Some("admin-token"), None).await;
        let data = &body["data"];
        assert!(data["token_editor"].is_null());
        assert!(!data["status_selector"].is_null());
        assert_eq!(data["actions"], json!(["change_status", "reschedule", "delete", "close"]));

        let (status, _) = h.call(Method::POST, "/token/save", Some("admin-token"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn reschedule_flow_through_http() {
        let mut appt = sample_appointment();
        appt.payment_method = PaymentMethod::Private;
        let h = harness(appt).await;

        let (status, _) = h.call(Method::POST, "/reschedule/confirm", Some("psy-token"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = h.call(Method::POST, "/reschedule", Some("psy-token"), None).await;
        assert_eq!(status, StatusCode::OK);
        let dialog = &body["data"]["reschedule_dialog"];
        assert_eq!(dialog["date"], "2025-03-03");
        assert_eq!(dialog["start_time"], "08:00:00");
        assert_eq!(dialog["end_time"], "08:50:00");

        let (status, _) = h
            .call(
                Method::PATCH,
                "/reschedule",
                Some("psy-token"),
                Some(json!({ "start_time": "10:00:00", "end_time": "09:00:00" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = h.call(Method::POST, "/reschedule/confirm", Some("psy-token"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["reschedule_dialog"].is_null());
        assert_eq!(body["data"]["detail"]["time_range"], "10:00 - 09:00");
        assert_eq!(body["data"]["detail"]["date"], "3 de março de 2025");
    }

    #[tokio::test]
    async fn cancelled_reschedule_changes_nothing() {
        let h = harness(sample_appointment()).await;

        h.call(Method::POST, "/reschedule", Some("admin-token"), None).await;
        let (status, body) = h.call(Method::POST, "/reschedule/cancel", Some("admin-token"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["reschedule_dialog"].is_null());

        let stored = h.store.get_appointment(h.appointment.id).await.unwrap().unwrap();
        assert_eq!(stored, h.appointment);
    }

    #[tokio::test]
    async fn delete_requires_confirmation_and_closes() {
        let h = harness(sample_appointment()).await;

        let (status, body) = h.call(Method::POST, "/delete", Some("admin-token"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"]["delete_confirmation"]["prompt"],
            "Tem certeza que deseja excluir este agendamento?"
        );
        assert_eq!(h.store.len().await, 1);

        let (status, body) = h.call(Method::POST, "/delete/confirm", Some("admin-token"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["closed"], true);
        assert_eq!(h.store.len().await, 0);

        let (status, _) = h.call(Method::GET, "", Some("admin-token"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn close_succeeds_after_appointment_deleted_elsewhere() {
        let h = harness(sample_appointment()).await;

        let (status, _) = h.call(Method::POST, "/reschedule", Some("reception-token"), None).await;
        assert_eq!(status, StatusCode::OK);
        h.store.delete_appointment(h.appointment.id).await.unwrap();

        let (status, body) = h.call(Method::DELETE, "", Some("reception-token"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["closed"], true);
        assert_eq!(body["data"]["appointment_id"], h.appointment.id.to_string());
    }
}
