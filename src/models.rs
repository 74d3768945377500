use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::panel::registry::PanelRegistry;
use crate::session::SessionProvider;
use crate::store::AppointmentManager;

#[derive(Clone)]
pub struct AppState {
    pub appointments: Arc<dyn AppointmentManager>,
    pub sessions: Arc<dyn SessionProvider>,
    pub panels: Arc<PanelRegistry>,
}

/* -------------------------
   Domain records
--------------------------*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Private,
    Insurance,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Private => "private",
            PaymentMethod::Insurance => "insurance",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "private" => Some(PaymentMethod::Private),
            "insurance" => Some(PaymentMethod::Insurance),
            _ => None,
        }
    }
}

/// Appointment status as stored by the appointment manager.
///
/// Unknown values are kept verbatim so the badge can echo them back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    Other(String),
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Other(raw) => raw,
        }
    }

    /// Pending and confirmed appointments still accept an insurance token.
    pub fn is_open(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }
}

impl From<String> for AppointmentStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pending" => AppointmentStatus::Pending,
            "confirmed" => AppointmentStatus::Confirmed,
            "cancelled" => AppointmentStatus::Cancelled,
            "completed" => AppointmentStatus::Completed,
            _ => AppointmentStatus::Other(raw),
        }
    }
}

impl From<AppointmentStatus> for String {
    fn from(status: AppointmentStatus) -> Self {
        match status {
            AppointmentStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The statuses staff may pick by hand. `completed` is set elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutableStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl MutableStatus {
    pub const ALL: [MutableStatus; 3] = [
        MutableStatus::Pending,
        MutableStatus::Confirmed,
        MutableStatus::Cancelled,
    ];

    pub fn from_status(status: &AppointmentStatus) -> Option<Self> {
        match status {
            AppointmentStatus::Pending => Some(MutableStatus::Pending),
            AppointmentStatus::Confirmed => Some(MutableStatus::Confirmed),
            AppointmentStatus::Cancelled => Some(MutableStatus::Cancelled),
            _ => None,
        }
    }
}

impl From<MutableStatus> for AppointmentStatus {
    fn from(status: MutableStatus) -> Self {
        match status {
            MutableStatus::Pending => AppointmentStatus::Pending,
            MutableStatus::Confirmed => AppointmentStatus::Confirmed,
            MutableStatus::Cancelled => AppointmentStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub psychologist_id: Uuid,
    pub psychologist_name: String,
    pub room_name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub payment_method: PaymentMethod,
    pub insurance_type: Option<String>,
    pub insurance_token: Option<String>,
    pub value_cents: i64,
    pub status: AppointmentStatus,
}

/// A free opening proposed for a psychologist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/* -------------------------
   Sessions
--------------------------*/

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Receptionist,
    Psychologist,
    Other(String),
}

impl Role {
    /// Role mapping of `app_user.role`:
    /// 0 patient, 1 admin, 2 receptionist, 3 psychologist
    pub fn from_code(code: i16) -> Self {
        match code {
            1 => Role::Admin,
            2 => Role::Receptionist,
            3 => Role::Psychologist,
            0 => Role::Other("patient".into()),
            _ => Role::Other("unknown".into()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Receptionist => "receptionist",
            Role::Psychologist => "psychologist",
            Role::Other(raw) => raw,
        }
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "admin" => Role::Admin,
            "receptionist" => Role::Receptionist,
            "psychologist" => Role::Psychologist,
            _ => Role::Other(raw),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
}

/* -------------------------
   API DTOs
--------------------------*/

#[derive(Debug, Serialize)]
pub struct ApiOk<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct SelectStatusRequest {
    pub status: MutableStatus,
}

#[derive(Debug, Deserialize)]
pub struct EditTokenRequest {
    pub token: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct EditRescheduleRequest {
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}
