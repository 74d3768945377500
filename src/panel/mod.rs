//! Appointment detail panel, rendered server-side.

pub mod capability;
pub mod delete;
pub mod detail;
pub mod registry;
pub mod reschedule;
pub mod token;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Appointment, MutableStatus, Session};
use crate::store::{AppointmentManager, StoreError};

use capability::{Action, Capabilities, should_show_token_input};
use delete::DeleteConfirmation;
use detail::{DetailView, status_label};
use reschedule::{RescheduleDialog, RescheduleDraft};
use token::TokenEditor;

#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("action {0:?} is not available")]
    NotPermitted(Action),
    #[error("{0}")]
    InvalidState(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What the host must do after an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelEvent {
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
}

/// Transient toast, delivered with the next render only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn token_saved() -> Self {
        Self {
            kind: NotificationKind::Success,
            title: "Token salvo".into(),
            description: "O token do convênio foi atualizado com sucesso.".into(),
        }
    }
}

/* -------------------------
   Rendered view
--------------------------*/

#[derive(Debug, Serialize)]
pub struct StatusOption {
    pub value: MutableStatus,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StatusSelectorView {
    pub selected: Option<MutableStatus>,
    pub options: Vec<StatusOption>,
}

#[derive(Debug, Serialize)]
pub struct TokenEditorView {
    pub label: &'static str,
    pub placeholder: &'static str,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct RescheduleDialogView {
    pub title: &'static str,
    #[serde(flatten)]
    pub draft: RescheduleDraft,
}

#[derive(Debug, Serialize)]
pub struct ConfirmationView {
    pub prompt: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PanelView {
    pub appointment_id: Uuid,
    pub detail: DetailView,
    pub actions: Vec<Action>,
    pub status_selector: Option<StatusSelectorView>,
    pub token_editor: Option<TokenEditorView>,
    pub reschedule_dialog: Option<RescheduleDialogView>,
    pub delete_confirmation: Option<ConfirmationView>,
    pub notifications: Vec<Notification>,
    pub closed: bool,
}

#[derive(Debug, Serialize)]
pub struct ClosedPanel {
    pub appointment_id: Uuid,
    pub closed: bool,
}

/* -------------------------
   Panel
--------------------------*/

#[derive(Debug, Clone)]
pub struct AppointmentPanel {
    appointment: Appointment,
    capabilities: Capabilities,
    token: TokenEditor,
    reschedule: RescheduleDialog,
    delete: DeleteConfirmation,
    notifications: Vec<Notification>,
    closed: bool,
}

impl AppointmentPanel {
    pub fn new(appointment: Appointment, session: Option<&Session>) -> Self {
        Self {
            token: TokenEditor::new(&appointment),
            capabilities: Capabilities::for_session(session),
            appointment,
            reschedule: RescheduleDialog::Closed,
            delete: DeleteConfirmation::Idle,
            notifications: Vec::new(),
            closed: false,
        }
    }

    pub fn appointment(&self) -> &Appointment {
        &self.appointment
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Take in the appointment manager's latest version. Drafts are kept.
    pub fn refresh(&mut self, appointment: Appointment) {
        self.appointment = appointment;
    }

    pub fn shows_token_input(&self) -> bool {
        should_show_token_input(
            self.appointment.payment_method,
            &self.appointment.status,
            &self.capabilities,
        )
    }

    fn require(&self, action: Action) -> Result<(), PanelError> {
        if self.closed {
            return Err(PanelError::InvalidState("panel is closed"));
        }
        if !self.capabilities.permits(action) {
            return Err(PanelError::NotPermitted(action));
        }
        Ok(())
    }

    fn require_token_input(&self) -> Result<(), PanelError> {
        self.require(Action::EditToken)?;
        if !self.shows_token_input() {
            return Err(PanelError::NotPermitted(Action::EditToken));
        }
        Ok(())
    }

    pub async fn select_status(
        &mut self,
        status: MutableStatus,
        store: &dyn AppointmentManager,
    ) -> Result<(), PanelError> {
        self.require(Action::ChangeStatus)?;
        tracing::info!(appointment_id = %self.appointment.id, ?status, "update appointment status");
        store
            .update_appointment_status(self.appointment.id, status)
            .await?;
        Ok(())
    }

    pub fn edit_token(&mut self, value: impl Into<String>) -> Result<(), PanelError> {
        self.require_token_input()?;
        self.token.edit(value);
        Ok(())
    }

    pub async fn save_token(&mut self, store: &dyn AppointmentManager) -> Result<(), PanelError> {
        self.require_token_input()?;
        tracing::info!(appointment_id = %self.appointment.id, "save insurance token");
        let notification = self.token.save(&self.appointment, store).await?;
        self.notifications.push(notification);
        Ok(())
    }

    pub async fn open_reschedule(&mut self, store: &dyn AppointmentManager) -> Result<(), PanelError> {
        self.require(Action::Reschedule)?;
        self.reschedule.open(&self.appointment, store).await?;
        tracing::debug!(appointment_id = %self.appointment.id, draft = ?self.reschedule.draft(), "reschedule dialog opened");
        Ok(())
    }

    pub fn edit_reschedule(
        &mut self,
        date: Option<NaiveDate>,
        start_time: Option<NaiveTime>,
        end_time: Option<NaiveTime>,
    ) -> Result<(), PanelError> {
        self.require(Action::Reschedule)?;
        self.reschedule.edit(date, start_time, end_time)
    }

    pub fn cancel_reschedule(&mut self) -> Result<(), PanelError> {
        self.require(Action::Reschedule)?;
        self.reschedule.cancel()
    }

    pub async fn confirm_reschedule(&mut self, store: &dyn AppointmentManager) -> Result<(), PanelError> {
        self.require(Action::Reschedule)?;
        let draft = self.reschedule.confirm(self.appointment.id, store).await?;
        tracing::info!(appointment_id = %self.appointment.id, ?draft, "appointment rescheduled");
        Ok(())
    }

    pub fn request_delete(&mut self) -> Result<(), PanelError> {
        self.require(Action::Delete)?;
        self.delete.request();
        Ok(())
    }

    pub fn cancel_delete(&mut self) -> Result<(), PanelError> {
        self.require(Action::Delete)?;
        self.delete.cancel()
    }

    /// Delete, then close the panel.
    pub async fn confirm_delete(&mut self, store: &dyn AppointmentManager) -> Result<PanelEvent, PanelError> {
        self.require(Action::Delete)?;
        self.delete.confirm(self.appointment.id, store).await?;
        tracing::info!(appointment_id = %self.appointment.id, "appointment deleted");
        Ok(self.close())
    }

    pub fn close(&mut self) -> PanelEvent {
        self.closed = true;
        self.reschedule = RescheduleDialog::Closed;
        self.delete = DeleteConfirmation::Idle;
        PanelEvent::Closed
    }

    /// Render the current state. Pending notifications are handed out once.
    pub fn render(&mut self) -> PanelView {
        let show_token = self.shows_token_input();
        let can_manage = self.capabilities.can_manage && !self.closed;

        let actions = self
            .capabilities
            .actions()
            .into_iter()
            .filter(|a| *a != Action::EditToken || show_token)
            .filter(|a| !self.closed || *a == Action::Close)
            .collect();

        PanelView {
            appointment_id: self.appointment.id,
            detail: DetailView::project(&self.appointment),
            actions,
            status_selector: can_manage.then(|| StatusSelectorView {
                selected: MutableStatus::from_status(&self.appointment.status),
                options: MutableStatus::ALL
                    .into_iter()
                    .map(|value| StatusOption {
                        value,
                        label: status_label(value),
                    })
                    .collect(),
            }),
            token_editor: (show_token && !self.closed).then(|| TokenEditorView {
                label: "Token de autorização do convênio",
                placeholder: "Digite o token do convênio",
                value: self.token.draft().to_string(),
            }),
            reschedule_dialog: self.reschedule.draft().map(|draft| RescheduleDialogView {
                title: "Reagendar consulta",
                draft: *draft,
            }),
            delete_confirmation: self.delete.prompt().map(|prompt| ConfirmationView { prompt }),
            notifications: std::mem::take(&mut self.notifications),
            closed: self.closed,
        }
    }
}
