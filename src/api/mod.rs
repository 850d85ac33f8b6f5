mod appointments;
pub mod auth;
mod dashboard;
mod doctors;
pub mod error;
mod extract;
mod patients;
mod payments;
mod validation;


use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Session routes (public)
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/register", post(auth::register))
        .route("/session", get(auth::current_session));

    // Resource routes; each handler authenticates through the `Claims` extractor
    // and applies its own role allow-list
    let api_routes = Router::new()
        // Appointments
        .route(
            "/appointments",
            get(appointments::list_appointments).post(appointments::create_appointment),
        )
        .route(
            "/appointments/:id",
            patch(appointments::update_appointment_status),
        )
        // Patients
        .route(
            "/patients",
            get(patients::list_patients).post(patients::create_patient),
        )
        // Doctors
        .route("/doctors", get(doctors::list_doctors))
        // Payments
        .route("/create-payment-intent", post(payments::create_payment_intent))
        .route("/payments", post(payments::record_payment))
        // Dashboard
        .route("/dashboard", get(dashboard::get_dashboard));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", auth_routes.merge(api_routes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
