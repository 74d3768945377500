use crate::models::Appointment;
use crate::store::AppointmentManager;

use super::{Notification, PanelError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenEditor {
    draft: String,
}

impl TokenEditor {
    pub fn new(appointment: &Appointment) -> Self {
        Self {
            draft: appointment.insurance_token.clone().unwrap_or_default(),
        }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn edit(&mut self, value: impl Into<String>) {
        self.draft = value.into();
    }

    /// The appointment with only its token replaced by the draft.
    pub fn apply(&self, appointment: &Appointment) -> Appointment {
        Appointment {
            insurance_token: Some(self.draft.clone()),
            ..appointment.clone()
        }
    }

    pub async fn save(
        &self,
        appointment: &Appointment,
        store: &dyn AppointmentManager,
    ) -> Result<Notification, PanelError> {
        store.update_appointment(self.apply(appointment)).await?;
        Ok(Notification::token_saved())
    }
}
