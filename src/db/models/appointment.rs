//! Appointments and their status lifecycle.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::common::IdInput;
use super::patient::Patient;
use super::user::{Role, UserResponse};

/// Appointment status.
///
/// Lifecycle: `scheduled` is the only non-terminal state; it may move to
/// `completed` or `cancelled`, and nothing leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Check if moving from this status to `next` is allowed
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        matches!(
            (self, next),
            (Self::Scheduled, Self::Completed) | (Self::Scheduled, Self::Cancelled)
        )
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scheduled" => Ok(Self::Scheduled),
            "completed" => Ok(Self::Completed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown appointment status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Appointment {
    pub id: i64,
    pub date: String,
    pub status: String,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Columns selected for an appointment joined with its doctor and patient.
///
/// Append a `WHERE`/`ORDER BY` clause; table aliases are `a`, `d` and `p`.
pub const APPOINTMENT_DETAIL_SELECT: &str = r#"
    SELECT a.id, a.date, a.status, a.doctor_id, a.patient_id, a.created_at, a.updated_at,
           d.email AS doctor_email, d.name AS doctor_name, d.role AS doctor_role,
           p.name AS patient_name, p.email AS patient_email, p.phone AS patient_phone,
           p.birth_date AS patient_birth_date, p.medical_history AS patient_medical_history,
           p.created_at AS patient_created_at, p.updated_at AS patient_updated_at
    FROM appointments a
    INNER JOIN users d ON d.id = a.doctor_id
    INNER JOIN patients p ON p.id = a.patient_id
"#;

/// Flat row produced by [`APPOINTMENT_DETAIL_SELECT`]
#[derive(Debug, Clone, FromRow)]
pub struct AppointmentDetailRow {
    pub id: i64,
    pub date: String,
    pub status: String,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub created_at: String,
    pub updated_at: String,
    pub doctor_email: String,
    pub doctor_name: String,
    pub doctor_role: String,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: Option<String>,
    pub patient_birth_date: Option<String>,
    pub patient_medical_history: Option<String>,
    pub patient_created_at: String,
    pub patient_updated_at: String,
}

/// Appointment with its doctor and patient embedded
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentResponse {
    pub id: i64,
    pub date: String,
    pub status: String,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub created_at: String,
    pub updated_at: String,
    pub doctor: UserResponse,
    pub patient: Patient,
}

impl From<AppointmentDetailRow> for AppointmentResponse {
    fn from(row: AppointmentDetailRow) -> Self {
        let doctor_role = row.doctor_role.parse().unwrap_or(Role::Doctor);
        Self {
            id: row.id,
            date: row.date,
            status: row.status,
            doctor_id: row.doctor_id,
            patient_id: row.patient_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            doctor: UserResponse {
                id: row.doctor_id,
                email: row.doctor_email,
                name: row.doctor_name,
                role: doctor_role,
            },
            patient: Patient {
                id: row.patient_id,
                name: row.patient_name,
                email: row.patient_email,
                phone: row.patient_phone,
                birth_date: row.patient_birth_date,
                medical_history: row.patient_medical_history,
                created_at: row.patient_created_at,
                updated_at: row.patient_updated_at,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentQuery {
    pub doctor_id: Option<String>,
    pub patient_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    #[serde(default)]
    pub patient_id: Option<IdInput>,
    #[serde(default)]
    pub doctor_id: Option<IdInput>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAppointmentRequest {
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduled_transitions() {
        let s = AppointmentStatus::Scheduled;
        assert!(s.can_transition_to(AppointmentStatus::Completed));
        assert!(s.can_transition_to(AppointmentStatus::Cancelled));
        assert!(!s.can_transition_to(AppointmentStatus::Scheduled));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for from in [AppointmentStatus::Completed, AppointmentStatus::Cancelled] {
            for to in [
                AppointmentStatus::Scheduled,
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ] {
                assert!(!from.can_transition_to(to), "{} -> {} allowed", from, to);
            }
        }
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("completed".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::Completed);
        assert_eq!(" Scheduled ".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::Scheduled);
        assert_eq!("canceled".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::Cancelled);
        assert!("done".parse::<AppointmentStatus>().is_err());
    }
}
