//! Per-role dashboard counters.

use axum::{extract::State, Json};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::db::{format_timestamp, AppointmentStatus, Role};
use crate::session::Claims;
use crate::AppState;

use super::error::ApiError;

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum DashboardStats {
    FrontDesk {
        patient_count: i64,
        appointment_count: i64,
    },
    Doctor {
        today_appointments: i64,
        completed_appointments: i64,
    },
    Patient {
        upcoming_appointments: i64,
        pending_payments: i64,
    },
}

/// Dashboard statistics for the caller's role
///
/// GET /api/dashboard
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    claims: Claims,
) -> Result<Json<DashboardStats>, ApiError> {
    let stats = dashboard_stats(&state.db, &claims, Utc::now()).await?;
    Ok(Json(stats))
}

pub async fn dashboard_stats(
    pool: &sqlx::SqlitePool,
    claims: &Claims,
    now: DateTime<Utc>,
) -> Result<DashboardStats, sqlx::Error> {
    match claims.role {
        Role::Admin | Role::Receptionist => {
            let patient_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM patients")
                .fetch_one(pool)
                .await?;
            let appointment_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM appointments")
                .fetch_one(pool)
                .await?;
            Ok(DashboardStats::FrontDesk {
                patient_count,
                appointment_count,
            })
        }
        Role::Doctor => {
            let day_start = now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|t| t.and_utc())
                .unwrap_or(now);
            let day_end = day_start + Duration::days(1);

            let today_appointments: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM appointments WHERE doctor_id = ? AND date >= ? AND date < ?",
            )
            .bind(claims.user_id)
            .bind(format_timestamp(day_start))
            .bind(format_timestamp(day_end))
            .fetch_one(pool)
            .await?;

            let completed_appointments: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM appointments WHERE doctor_id = ? AND status = ?",
            )
            .bind(claims.user_id)
            .bind(AppointmentStatus::Completed.as_str())
            .fetch_one(pool)
            .await?;

            Ok(DashboardStats::Doctor {
                today_appointments,
                completed_appointments,
            })
        }
        Role::Patient => {
            let patient_id: Option<i64> =
                sqlx::query_scalar("SELECT id FROM patients WHERE email = ? ORDER BY id LIMIT 1")
                    .bind(&claims.email)
                    .fetch_optional(pool)
                    .await?;

            let Some(patient_id) = patient_id else {
                return Ok(DashboardStats::Patient {
                    upcoming_appointments: 0,
                    pending_payments: 0,
                });
            };

            let upcoming_appointments: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM appointments WHERE patient_id = ? AND date >= ? AND status = ?",
            )
            .bind(patient_id)
            .bind(format_timestamp(now))
            .bind(AppointmentStatus::Scheduled.as_str())
            .fetch_one(pool)
            .await?;

            let pending_payments: i64 = sqlx::query_scalar(
                r#"
                SELECT COUNT(*) FROM appointments a
                LEFT JOIN payments pay ON pay.appointment_id = a.id
                WHERE a.patient_id = ? AND a.status = ? AND pay.id IS NULL
                "#,
            )
            .bind(patient_id)
            .bind(AppointmentStatus::Completed.as_str())
            .fetch_one(pool)
            .await?;

            Ok(DashboardStats::Patient {
                upcoming_appointments,
                pending_payments,
            })
        }
    }
}
