//! Stripe REST client for payment intents.

use async_trait::async_trait;
use serde::Deserialize;

use super::{PaymentError, PaymentIntent, PaymentIntentRequest, PaymentProcessor};

/// API version pinned for request/response shapes
const STRIPE_API_VERSION: &str = "2024-11-20.acacia";

pub struct StripeClient {
    secret_key: String,
    api_base: String,
    client: reqwest::Client,
}

impl StripeClient {
    pub fn new(secret_key: String, api_base: String) -> Self {
        Self {
            secret_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StripePaymentIntent {
    id: String,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    message: Option<String>,
}

/// Encode a payment intent request as Stripe's bracketed form fields
fn form_fields(request: &PaymentIntentRequest) -> Vec<(String, String)> {
    let mut fields = vec![
        ("amount".to_string(), request.amount.to_string()),
        ("currency".to_string(), request.currency.clone()),
        (
            "automatic_payment_methods[enabled]".to_string(),
            "true".to_string(),
        ),
    ];
    for (key, value) in &request.metadata {
        fields.push((format!("metadata[{}]", key), value.clone()));
    }
    fields
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        let url = format!("{}/v1/payment_intents", self.api_base);

        let mut builder = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .header("Stripe-Version", STRIPE_API_VERSION)
            .form(&form_fields(&request));
        if let Some(key) = &request.idempotency_key {
            builder = builder.header("Idempotency-Key", key);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<StripeErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or(body);
            return Err(PaymentError::Api { status, message });
        }

        let intent: StripePaymentIntent = response.json().await?;
        let client_secret = intent
            .client_secret
            .ok_or(PaymentError::MissingClientSecret)?;

        Ok(PaymentIntent {
            id: intent.id,
            client_secret,
        })
    }
}
