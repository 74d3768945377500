use uuid::Uuid;

use crate::store::AppointmentManager;

use super::PanelError;

pub const DELETE_PROMPT: &str = "Tem certeza que deseja excluir este agendamento?";

/// Two-step delete: request, then confirm or dismiss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeleteConfirmation {
    #[default]
    Idle,
    AwaitingConfirmation,
}

impl DeleteConfirmation {
    pub fn request(&mut self) {
        *self = DeleteConfirmation::AwaitingConfirmation;
    }

    pub fn prompt(&self) -> Option<&'static str> {
        match self {
            DeleteConfirmation::AwaitingConfirmation => Some(DELETE_PROMPT),
            DeleteConfirmation::Idle => None,
        }
    }

    pub fn cancel(&mut self) -> Result<(), PanelError> {
        if *self == DeleteConfirmation::Idle {
            return Err(PanelError::InvalidState("no delete awaiting confirmation"));
        }
        *self = DeleteConfirmation::Idle;
        Ok(())
    }

    pub async fn confirm(
        &mut self,
        appointment_id: Uuid,
        store: &dyn AppointmentManager,
    ) -> Result<(), PanelError> {
        if *self == DeleteConfirmation::Idle {
            return Err(PanelError::InvalidState("no delete awaiting confirmation"));
        }
        store.delete_appointment(appointment_id).await?;
        *self = DeleteConfirmation::Idle;
        Ok(())
    }
}
