//! Payments and payment intents.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::common::{AmountInput, IdInput};

/// A recorded payment. Its existence marks the appointment as paid.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    pub appointment_id: Option<i64>,
    pub amount_cents: Option<i64>,
    pub payment_intent_id: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    #[serde(default)]
    pub appointment_id: Option<IdInput>,
    #[serde(default)]
    pub payment_intent_id: Option<String>,
    /// Amount in currency units (e.g. dollars)
    #[serde(default)]
    pub amount: Option<AmountInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentRequest {
    /// Amount in currency units (e.g. dollars)
    #[serde(default)]
    pub amount: Option<AmountInput>,
    #[serde(default)]
    pub appointment_id: Option<IdInput>,
    #[serde(default)]
    pub doctor_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentResponse {
    pub client_secret: String,
}

/// Convert an amount in currency units to the smallest unit, rounding half away from zero
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_minor_units_rounds() {
        assert_eq!(to_minor_units(50.0), 5000);
        assert_eq!(to_minor_units(19.99), 1999);
        assert_eq!(to_minor_units(12.344), 1234);
    }
}
