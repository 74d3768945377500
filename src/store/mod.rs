pub mod memory;
pub mod postgres;
pub mod slots;

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::models::{Appointment, MutableStatus, Slot};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("appointment {0} not found")]
    NotFound(Uuid),
    #[error("stored appointment is malformed: {0}")]
    Malformed(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait::async_trait]
pub trait AppointmentManager: Send + Sync {
    /// Current version of an appointment, or `None` once it is gone.
    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError>;

    async fn update_appointment_status(
        &self,
        appointment_id: Uuid,
        status: MutableStatus,
    ) -> Result<(), StoreError>;

    async fn delete_appointment(&self, appointment_id: Uuid) -> Result<(), StoreError>;

    /// Next free opening for the psychologist, if any exists in the search window.
    async fn find_next_available_slot(&self, psychologist_id: Uuid) -> Result<Option<Slot>, StoreError>;

    async fn reschedule_appointment(
        &self,
        appointment_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<(), StoreError>;

    /// Whole-record replace.
    async fn update_appointment(&self, appointment: Appointment) -> Result<(), StoreError>;
}
