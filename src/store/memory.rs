use std::collections::HashMap;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::slots::{SlotPolicy, next_free_slot};
use super::{AppointmentManager, StoreError};
use crate::models::{Appointment, AppointmentStatus, MutableStatus, Slot};

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Process-local appointment store, used when no database is configured.
pub struct InMemoryAppointments {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
    policy: SlotPolicy,
    clock: fn() -> NaiveDateTime,
}

impl InMemoryAppointments {
    pub fn new(policy: SlotPolicy) -> Self {
        Self::with_appointments(policy, Vec::new())
    }

    pub fn with_appointments(
        policy: SlotPolicy,
        appointments: impl IntoIterator<Item = Appointment>,
    ) -> Self {
        let appointments = appointments.into_iter().map(|a| (a.id, a)).collect();
        Self {
            appointments: RwLock::new(appointments),
            policy,
            clock: local_now,
        }
    }

    /// Fix "now" for the slot search.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub async fn len(&self) -> usize {
        self.appointments.read().await.len()
    }
}

#[async_trait::async_trait]
impl AppointmentManager for InMemoryAppointments {
    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self.appointments.read().await.get(&appointment_id).cloned())
    }

    async fn update_appointment_status(
        &self,
        appointment_id: Uuid,
        status: MutableStatus,
    ) -> Result<(), StoreError> {
        let mut map = self.appointments.write().await;
        let appointment = map
            .get_mut(&appointment_id)
            .ok_or(StoreError::NotFound(appointment_id))?;
        appointment.status = status.into();
        Ok(())
    }

    async fn delete_appointment(&self, appointment_id: Uuid) -> Result<(), StoreError> {
        self.appointments
            .write()
            .await
            .remove(&appointment_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(appointment_id))
    }

    async fn find_next_available_slot(&self, psychologist_id: Uuid) -> Result<Option<Slot>, StoreError> {
        let booked: Vec<Slot> = self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| a.psychologist_id == psychologist_id && a.status != AppointmentStatus::Cancelled)
            .map(|a| Slot {
                date: a.date,
                start_time: a.start_time,
                end_time: a.end_time,
            })
            .collect();

        Ok(next_free_slot(&booked, (self.clock)(), &self.policy))
    }

    async fn reschedule_appointment(
        &self,
        appointment_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<(), StoreError> {
        let mut map = self.appointments.write().await;
        let appointment = map
            .get_mut(&appointment_id)
            .ok_or(StoreError::NotFound(appointment_id))?;
        appointment.date = date;
        appointment.start_time = start_time;
        appointment.end_time = end_time;
        Ok(())
    }

    async fn update_appointment(&self, appointment: Appointment) -> Result<(), StoreError> {
        let mut map = self.appointments.write().await;
        let slot = map
            .get_mut(&appointment.id)
            .ok_or(StoreError::NotFound(appointment.id))?;
        *slot = appointment;
        Ok(())
    }
}
