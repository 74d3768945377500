use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Serialize;

use crate::models::{Appointment, AppointmentStatus, MutableStatus, PaymentMethod};

const MONTHS_PT_BR: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeColor {
    Yellow,
    Green,
    Red,
    Blue,
    Gray,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    pub color: BadgeColor,
    pub label: String,
}

impl StatusBadge {
    pub fn for_status(status: &AppointmentStatus) -> Self {
        let (color, label) = match status {
            AppointmentStatus::Pending => (BadgeColor::Yellow, "Pendente"),
            AppointmentStatus::Confirmed => (BadgeColor::Green, "Confirmado"),
            AppointmentStatus::Cancelled => (BadgeColor::Red, "Cancelado"),
            AppointmentStatus::Completed => (BadgeColor::Blue, "Concluído"),
            AppointmentStatus::Other(raw) => (BadgeColor::Gray, raw.as_str()),
        };
        Self {
            color,
            label: label.to_string(),
        }
    }
}

pub fn status_label(status: MutableStatus) -> &'static str {
    match status {
        MutableStatus::Pending => "Pendente",
        MutableStatus::Confirmed => "Confirmado",
        MutableStatus::Cancelled => "Cancelado",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailView {
    pub patient_name: String,
    pub date: String,
    pub time_range: String,
    pub psychologist_name: String,
    pub room_name: String,
    pub payment: String,
    pub value: String,
    pub status: StatusBadge,
}

impl DetailView {
    pub fn project(appointment: &Appointment) -> Self {
        Self {
            patient_name: appointment.patient_name.clone(),
            date: format_long_date(appointment.date),
            time_range: format_time_range(appointment.start_time, appointment.end_time),
            psychologist_name: appointment.psychologist_name.clone(),
            room_name: appointment.room_name.clone(),
            payment: payment_label(appointment.payment_method, appointment.insurance_type.as_deref()),
            value: format_currency(appointment.value_cents),
            status: StatusBadge::for_status(&appointment.status),
        }
    }
}

/// "5 de março de 2025"
pub fn format_long_date(date: NaiveDate) -> String {
    let month = MONTHS_PT_BR[date.month0() as usize];
    format!("{} de {} de {}", date.day(), month, date.year())
}

pub fn format_time_range(start: NaiveTime, end: NaiveTime) -> String {
    format!("{} - {}", start.format("%H:%M"), end.format("%H:%M"))
}

pub fn payment_label(method: PaymentMethod, insurance_type: Option<&str>) -> String {
    match method {
        PaymentMethod::Private => "Particular".to_string(),
        PaymentMethod::Insurance => match insurance_type {
            Some(kind) if !kind.is_empty() => format!("Convênio - {kind}"),
            _ => "Convênio".to_string(),
        },
    }
}

/// "R$ 150.00"
pub fn format_currency(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}R$ {}.{:02}", abs / 100, abs % 100)
}
