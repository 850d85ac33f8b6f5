//! Payment processor integration.
//!
//! Handlers talk to a [`PaymentProcessor`]; production uses [`StripeClient`].

mod stripe;

pub use stripe::StripeClient;

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

/// Request to open a payment intent
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntentRequest {
    /// Amount in the currency's smallest unit (cents)
    pub amount: i64,
    pub currency: String,
    pub metadata: BTreeMap<String, String>,
    /// Forwarded to the processor when the client supplied one
    pub idempotency_key: Option<String>,
}

/// A payment intent as returned by the processor
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment processor request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("payment processor returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("payment processor response missing client secret")]
    MissingClientSecret,
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError>;
}
