//! Appointment scheduling endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::db::{
    format_timestamp, now_timestamp, parse_datetime, Appointment, AppointmentDetailRow,
    AppointmentQuery, AppointmentResponse, AppointmentStatus, CreateAppointmentRequest, Role,
    UpdateAppointmentRequest, User, APPOINTMENT_DETAIL_SELECT,
};
use crate::session::Claims;
use crate::AppState;

use super::error::{ApiError, ErrorDetails, ValidationErrorBuilder};
use super::extract::ApiJson;

/// Fetch one appointment with doctor and patient embedded
pub async fn fetch_appointment_detail(
    pool: &sqlx::SqlitePool,
    id: i64,
) -> Result<Option<AppointmentResponse>, sqlx::Error> {
    let sql = format!("{} WHERE a.id = ?", APPOINTMENT_DETAIL_SELECT);
    let row: Option<AppointmentDetailRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(AppointmentResponse::from))
}

/// Parse an optional integer filter from the query string
fn parse_filter(field: &str, value: &Option<String>) -> Result<Option<i64>, ApiError> {
    match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| ApiError::validation_field(field, format!("Invalid {}", field))),
    }
}

/// List appointments, optionally filtered by doctor and/or patient
///
/// GET /api/appointments?doctorId=&patientId=
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    _claims: Claims,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<Vec<AppointmentResponse>>, ApiError> {
    let doctor_id = parse_filter("doctorId", &query.doctor_id)?;
    let patient_id = parse_filter("patientId", &query.patient_id)?;

    let sql = format!(
        "{} WHERE (?1 IS NULL OR a.doctor_id = ?1) AND (?2 IS NULL OR a.patient_id = ?2) \
         ORDER BY a.date ASC, a.id ASC",
        APPOINTMENT_DETAIL_SELECT
    );
    let rows: Vec<AppointmentDetailRow> = sqlx::query_as(&sql)
        .bind(doctor_id)
        .bind(patient_id)
        .fetch_all(&state.db)
        .await?;

    Ok(Json(rows.into_iter().map(AppointmentResponse::from).collect()))
}

/// Book a new appointment. Front desk only.
///
/// POST /api/appointments
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    ApiJson(req): ApiJson<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentResponse>), ApiError> {
    claims.require_role(&Role::FRONT_DESK)?;

    let mut errors = ValidationErrorBuilder::new();
    let patient_id = req.patient_id.as_ref().and_then(|id| id.as_id());
    let doctor_id = req.doctor_id.as_ref().and_then(|id| id.as_id());
    let date = req.date.as_deref().and_then(parse_datetime);
    if patient_id.is_none() {
        errors.add("patientId", "Please select a patient");
    }
    if doctor_id.is_none() {
        errors.add("doctorId", "Please select a doctor");
    }
    if date.is_none() {
        errors.add("date", "Please select a date and time");
    }
    errors.finish()?;
    let (Some(patient_id), Some(doctor_id), Some(date)) = (patient_id, doctor_id, date) else {
        return Err(ApiError::bad_request("Missing required fields"));
    };

    let doctor: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(doctor_id)
        .fetch_optional(&state.db)
        .await?;
    if !matches!(doctor, Some(ref d) if d.role_enum() == Role::Doctor) {
        return Err(ApiError::validation_field("doctorId", "Doctor not found"));
    }

    let patient_exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM patients WHERE id = ?")
        .bind(patient_id)
        .fetch_optional(&state.db)
        .await?;
    if patient_exists.is_none() {
        return Err(ApiError::validation_field("patientId", "Patient not found"));
    }

    let id = sqlx::query(
        "INSERT INTO appointments (date, status, doctor_id, patient_id) VALUES (?, ?, ?, ?)",
    )
    .bind(format_timestamp(date))
    .bind(AppointmentStatus::Scheduled.as_str())
    .bind(doctor_id)
    .bind(patient_id)
    .execute(&state.db)
    .await?
    .last_insert_rowid();

    info!(
        appointment_id = id,
        doctor_id,
        patient_id,
        booked_by = claims.user_id,
        "Appointment created"
    );

    let appointment = fetch_appointment_detail(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::internal("Failed to create appointment"))?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

/// Move an appointment to a new status
///
/// PATCH /api/appointments/:id
pub async fn update_appointment_status(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<UpdateAppointmentRequest>,
) -> Result<Json<AppointmentResponse>, ApiError> {
    let next: AppointmentStatus = match req.status.as_deref() {
        None => return Err(ApiError::validation_field("status", "Status is required")),
        Some(s) => s.parse().map_err(|_| {
            ApiError::validation_field(
                "status",
                "Invalid status. Must be one of: scheduled, completed, cancelled",
            )
        })?,
    };

    let appointment: Appointment = sqlx::query_as("SELECT * FROM appointments WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment not found"))?;

    // Stored values outside the known set are treated as scheduled
    let current: AppointmentStatus = appointment
        .status
        .parse()
        .unwrap_or(AppointmentStatus::Scheduled);

    if !current.can_transition_to(next) {
        let mut details = HashMap::new();
        details.insert("from".to_string(), json!(current.as_str()));
        details.insert("to".to_string(), json!(next.as_str()));
        return Err(ApiError::conflict(format!(
            "Cannot change appointment status from {} to {}",
            current, next
        ))
        .with_details(ErrorDetails::Generic(details)));
    }

    // Guard on the current status so a concurrent change is not overwritten
    let result = sqlx::query(
        "UPDATE appointments SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(next.as_str())
    .bind(now_timestamp())
    .bind(id)
    .bind(&appointment.status)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::conflict("Appointment was modified concurrently"));
    }

    info!(
        appointment_id = id,
        from = %current,
        to = %next,
        changed_by = claims.user_id,
        "Appointment status updated"
    );

    let appointment = fetch_appointment_detail(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment not found"))?;

    Ok(Json(appointment))
}
