use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Appointment, Slot};
use crate::store::AppointmentManager;

use super::PanelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RescheduleDraft {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl RescheduleDraft {
    pub fn from_appointment(appointment: &Appointment) -> Self {
        Self {
            date: appointment.date,
            start_time: appointment.start_time,
            end_time: appointment.end_time,
        }
    }
}

impl From<Slot> for RescheduleDraft {
    fn from(slot: Slot) -> Self {
        Self {
            date: slot.date,
            start_time: slot.start_time,
            end_time: slot.end_time,
        }
    }
}

/// The draft is not validated: a start at or after the end is kept as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RescheduleDialog {
    #[default]
    Closed,
    Open(RescheduleDraft),
}

impl RescheduleDialog {
    pub fn is_open(&self) -> bool {
        matches!(self, RescheduleDialog::Open(_))
    }

    pub fn draft(&self) -> Option<&RescheduleDraft> {
        match self {
            RescheduleDialog::Open(draft) => Some(draft),
            RescheduleDialog::Closed => None,
        }
    }

    /// Opens on the next free slot, or the current time when there is none.
    pub async fn open(
        &mut self,
        appointment: &Appointment,
        store: &dyn AppointmentManager,
    ) -> Result<(), PanelError> {
        let suggested = store
            .find_next_available_slot(appointment.psychologist_id)
            .await?;

        let draft = match suggested {
            Some(slot) => RescheduleDraft::from(slot),
            None => RescheduleDraft::from_appointment(appointment),
        };
        *self = RescheduleDialog::Open(draft);
        Ok(())
    }

    pub fn edit(
        &mut self,
        date: Option<NaiveDate>,
        start_time: Option<NaiveTime>,
        end_time: Option<NaiveTime>,
    ) -> Result<(), PanelError> {
        let RescheduleDialog::Open(draft) = self else {
            return Err(PanelError::InvalidState("reschedule dialog is not open"));
        };
        if let Some(date) = date {
            draft.date = date;
        }
        if let Some(start_time) = start_time {
            draft.start_time = start_time;
        }
        if let Some(end_time) = end_time {
            draft.end_time = end_time;
        }
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), PanelError> {
        if !self.is_open() {
            return Err(PanelError::InvalidState("reschedule dialog is not open"));
        }
        *self = RescheduleDialog::Closed;
        Ok(())
    }

    pub async fn confirm(
        &mut self,
        appointment_id: Uuid,
        store: &dyn AppointmentManager,
    ) -> Result<RescheduleDraft, PanelError> {
        let Some(draft) = self.draft().copied() else {
            return Err(PanelError::InvalidState("reschedule dialog is not open"));
        };
        store
            .reschedule_appointment(appointment_id, draft.date, draft.start_time, draft.end_time)
            .await?;
        *self = RescheduleDialog::Closed;
        Ok(draft)
    }
}
