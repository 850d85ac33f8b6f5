//! Patient registry endpoints.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::info;

use crate::db::{parse_birth_date, CreatePatientRequest, Patient, Role};
use crate::session::Claims;
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::extract::ApiJson;
use super::validation::{
    non_empty, validate_email, validate_medical_history, validate_name, validate_phone,
};

/// Validate a CreatePatientRequest
fn validate_create_request(req: &CreatePatientRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_name(req.name.as_deref().unwrap_or_default()) {
        errors.add("name", &e);
    }

    if let Err(e) = validate_email(non_empty(&req.email).unwrap_or_default()) {
        errors.add("email", &e);
    }

    if let Err(e) = validate_phone(&req.phone) {
        errors.add("phone", &e);
    }

    if let Some(birth_date) = non_empty(&req.birth_date) {
        if parse_birth_date(birth_date).is_none() {
            errors.add("birthDate", "Invalid birth date. Use YYYY-MM-DD");
        }
    }

    if let Err(e) = validate_medical_history(&req.medical_history) {
        errors.add("medicalHistory", &e);
    }

    errors.finish()
}

/// List all patients, newest first
///
/// GET /api/patients
pub async fn list_patients(
    State(state): State<Arc<AppState>>,
    _claims: Claims,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let patients = sqlx::query_as::<_, Patient>(
        "SELECT * FROM patients ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(patients))
}

/// Register a patient record. Front desk only.
///
/// POST /api/patients
pub async fn create_patient(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    ApiJson(req): ApiJson<CreatePatientRequest>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    claims.require_role(&Role::FRONT_DESK)?;
    validate_create_request(&req)?;

    let name = req.name.as_deref().map(str::trim).unwrap_or_default();
    let email = non_empty(&req.email).unwrap_or_default();
    let birth_date = non_empty(&req.birth_date).and_then(parse_birth_date);

    let id = sqlx::query(
        r#"
        INSERT INTO patients (name, email, phone, birth_date, medical_history)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(non_empty(&req.phone))
    .bind(birth_date)
    .bind(non_empty(&req.medical_history))
    .execute(&state.db)
    .await?
    .last_insert_rowid();

    let patient = sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE id = ?")
        .bind(id)
        .fetch_one(&state.db)
        .await?;

    info!(patient_id = id, created_by = claims.user_id, "Patient created");

    Ok((StatusCode::CREATED, Json(patient)))
}
