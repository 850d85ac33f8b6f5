//! Payment intent creation and payment recording.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::db::{
    to_minor_units, AmountInput, CreatePaymentIntentRequest, CreatePaymentIntentResponse,
    CreatePaymentRequest, Payment,
};
use crate::payments::PaymentIntentRequest;
use crate::session::Claims;
use crate::AppState;

use super::error::ApiError;
use super::extract::ApiJson;

const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Ask the payment processor for an intent; the browser completes payment with the client secret
///
/// POST /api/create-payment-intent
pub async fn create_payment_intent(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    headers: HeaderMap,
    ApiJson(req): ApiJson<CreatePaymentIntentRequest>,
) -> Result<Json<CreatePaymentIntentResponse>, ApiError> {
    let amount = req
        .amount
        .as_ref()
        .and_then(AmountInput::as_amount)
        .filter(|a| *a > 0.0);
    let appointment_id = req.appointment_id.as_ref().and_then(|id| id.as_id());
    let (Some(amount), Some(appointment_id)) = (amount, appointment_id) else {
        return Err(ApiError::bad_request("Missing required fields"));
    };

    let mut metadata = BTreeMap::new();
    metadata.insert("appointmentId".to_string(), appointment_id.to_string());
    metadata.insert("patientId".to_string(), claims.user_id.to_string());
    if let Some(doctor_name) = req.doctor_name {
        metadata.insert("doctorName".to_string(), doctor_name);
    }

    let idempotency_key = headers
        .get(IDEMPOTENCY_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());

    let intent = state
        .payments
        .create_payment_intent(PaymentIntentRequest {
            amount: to_minor_units(amount),
            currency: state.config.payments.currency.clone(),
            metadata,
            idempotency_key,
        })
        .await
        .map_err(|e| ApiError::internal_logged("Failed to create payment intent", e))?;

    info!(
        payment_intent = %intent.id,
        appointment_id,
        user_id = claims.user_id,
        "Payment intent created"
    );

    Ok(Json(CreatePaymentIntentResponse {
        client_secret: intent.client_secret,
    }))
}

/// Record that an appointment has been paid
///
/// POST /api/payments
pub async fn record_payment(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    ApiJson(req): ApiJson<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    let appointment_id = req
        .appointment_id
        .as_ref()
        .and_then(|id| id.as_id())
        .ok_or_else(|| ApiError::validation_field("appointmentId", "Appointment is required"))?;

    let appointment: Option<(i64,)> = sqlx::query_as("SELECT id FROM appointments WHERE id = ?")
        .bind(appointment_id)
        .fetch_optional(&state.db)
        .await?;
    if appointment.is_none() {
        return Err(ApiError::not_found("Appointment not found"));
    }

    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM payments WHERE appointment_id = ?")
            .bind(appointment_id)
            .fetch_optional(&state.db)
            .await?;
    if existing.is_some() {
        return Err(ApiError::conflict("Appointment has already been paid"));
    }

    let amount_cents = req
        .amount
        .as_ref()
        .and_then(AmountInput::as_amount)
        .filter(|a| *a >= 0.0)
        .map(to_minor_units);

    let id = sqlx::query(
        "INSERT INTO payments (appointment_id, amount_cents, payment_intent_id) VALUES (?, ?, ?)",
    )
    .bind(appointment_id)
    .bind(amount_cents)
    .bind(req.payment_intent_id.as_deref())
    .execute(&state.db)
    .await?
    .last_insert_rowid();

    let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = ?")
        .bind(id)
        .fetch_one(&state.db)
        .await?;

    info!(payment_id = id, appointment_id, user_id = claims.user_id, "Payment recorded");

    Ok((StatusCode::CREATED, Json(payment)))
}
