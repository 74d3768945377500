// src/store/postgres.rs

use chrono::{Local, NaiveDate, NaiveTime};
use sqlx::PgPool;
use uuid::Uuid;

use super::slots::{SlotPolicy, next_free_slot};
use super::{AppointmentManager, StoreError};
use crate::models::{Appointment, AppointmentStatus, MutableStatus, PaymentMethod, Slot};

/// Appointment store backed by the `appointment` table (see `sql/schema.sql`).
pub struct PgAppointments {
    db: PgPool,
    policy: SlotPolicy,
}

impl PgAppointments {
    pub fn new(db: PgPool, policy: SlotPolicy) -> Self {
        Self { db, policy }
    }
}

pub async fn connect_pg(database_url: &str) -> Result<PgPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    appointment_id: Uuid,
    patient_id: Uuid,
    patient_name: String,
    psychologist_id: Uuid,
    psychologist_name: String,
    room_name: String,
    appointment_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    payment_method: String,
    insurance_type: Option<String>,
    insurance_token: Option<String>,
    value_cents: i64,
    status: String,
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = StoreError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let payment_method = PaymentMethod::parse(&row.payment_method).ok_or_else(|| {
            StoreError::Malformed(format!(
                "appointment {} has payment_method {:?}",
                row.appointment_id, row.payment_method
            ))
        })?;

        Ok(Appointment {
            id: row.appointment_id,
            patient_id: row.patient_id,
            patient_name: row.patient_name,
            psychologist_id: row.psychologist_id,
            psychologist_name: row.psychologist_name,
            room_name: row.room_name,
            date: row.appointment_date,
            start_time: row.start_time,
            end_time: row.end_time,
            payment_method,
            insurance_type: row.insurance_type,
            insurance_token: row.insurance_token,
            value_cents: row.value_cents,
            status: AppointmentStatus::from(row.status),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BookedRow {
    appointment_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
}

fn ensure_affected(result: sqlx::postgres::PgQueryResult, appointment_id: Uuid) -> Result<(), StoreError> {
    if result.rows_affected() == 0 {
        Err(StoreError::NotFound(appointment_id))
    } else {
        Ok(())
    }
}

#[async_trait::async_trait]
impl AppointmentManager for PgAppointments {
    async fn get_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let row = sqlx::query_as::<_, AppointmentRow>(
            r#"
            SELECT
              appointment_id,
              patient_id,
              patient_name,
              psychologist_id,
              psychologist_name,
              room_name,
              appointment_date,
              start_time,
              end_time,
              payment_method,
              insurance_type,
              insurance_token,
              value_cents,
              status
            FROM appointment
            WHERE appointment_id = $1
            "#,
        )
        .bind(appointment_id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Appointment::try_from).transpose()
    }

    async fn update_appointment_status(
        &self,
        appointment_id: Uuid,
        status: MutableStatus,
    ) -> Result<(), StoreError> {
        let status = AppointmentStatus::from(status);
        let result = sqlx::query(
            r#"
            UPDATE appointment
            SET status = $2,
                updated_at = now()
            WHERE appointment_id = $1
            "#,
        )
        .bind(appointment_id)
        .bind(status.as_str())
        .execute(&self.db)
        .await?;

        ensure_affected(result, appointment_id)
    }

    async fn delete_appointment(&self, appointment_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query(r#"DELETE FROM appointment WHERE appointment_id = $1"#)
            .bind(appointment_id)
            .execute(&self.db)
            .await?;

        ensure_affected(result, appointment_id)
    }

    async fn find_next_available_slot(&self, psychologist_id: Uuid) -> Result<Option<Slot>, StoreError> {
        let now = Local::now().naive_local();

        let rows = sqlx::query_as::<_, BookedRow>(
            r#"
            SELECT appointment_date, start_time, end_time
            FROM appointment
            WHERE psychologist_id = $1
              AND status <> 'cancelled'
              AND appointment_date >= $2
              AND appointment_date <  $3
            ORDER BY appointment_date ASC, start_time ASC
            "#,
        )
        .bind(psychologist_id)
        .bind(now.date())
        .bind(self.policy.search_end(now.date()))
        .fetch_all(&self.db)
        .await?;

        let booked: Vec<Slot> = rows
            .into_iter()
            .map(|r| Slot {
                date: r.appointment_date,
                start_time: r.start_time,
                end_time: r.end_time,
            })
            .collect();

        Ok(next_free_slot(&booked, now, &self.policy))
    }

    async fn reschedule_appointment(
        &self,
        appointment_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE appointment
            SET appointment_date = $2,
                start_time = $3,
                end_time = $4,
                updated_at = now()
            WHERE appointment_id = $1
            "#,
        )
        .bind(appointment_id)
        .bind(date)
        .bind(start_time)
        .bind(end_time)
        .execute(&self.db)
        .await?;

        ensure_affected(result, appointment_id)
    }

    async fn update_appointment(&self, appointment: Appointment) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE appointment
            SET
              patient_id = $2,
              patient_name = $3,
              psychologist_id = $4,
              psychologist_name = $5,
              room_name = $6,
              appointment_date = $7,
              start_time = $8,
              end_time = $9,
              payment_method = $10,
              insurance_type = $11,
              insurance_token = $12,
              value_cents = $13,
              status = $14,
              updated_at = now()
            WHERE appointment_id = $1
            "#,
        )
        .bind(appointment.id)
        .bind(appointment.patient_id)
        .bind(&appointment.patient_name)
        .bind(appointment.psychologist_id)
        .bind(&appointment.psychologist_name)
        .bind(&appointment.room_name)
        .bind(appointment.date)
        .bind(appointment.start_time)
        .bind(appointment.end_time)
        .bind(appointment.payment_method.as_str())
        .bind(&appointment.insurance_type)
        .bind(&appointment.insurance_token)
        .bind(appointment.value_cents)
        .bind(appointment.status.as_str())
        .execute(&self.db)
        .await?;

        ensure_affected(result, appointment.id)
    }
}
