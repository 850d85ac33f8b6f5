use axum::{extract::State, Json};
use std::sync::Arc;

use crate::db::{DoctorSummary, Role};
use crate::session::Claims;
use crate::AppState;

use super::error::ApiError;

/// List all doctors
///
/// GET /api/doctors
pub async fn list_doctors(
    State(state): State<Arc<AppState>>,
    _claims: Claims,
) -> Result<Json<Vec<DoctorSummary>>, ApiError> {
    let doctors = sqlx::query_as::<_, DoctorSummary>(
        "SELECT id, name, email FROM users WHERE role = ? ORDER BY name ASC",
    )
    .bind(Role::Doctor.as_str())
    .fetch_all(&state.db)
    .await?;

    Ok(Json(doctors))
}
