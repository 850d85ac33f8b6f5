pub mod api;
pub mod config;
pub mod db;
pub mod payments;
pub mod session;

pub use db::DbPool;

use config::Config;
use std::sync::Arc;

use crate::payments::{PaymentProcessor, StripeClient};
use crate::session::SessionManager;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub sessions: SessionManager,
    pub payments: Arc<dyn PaymentProcessor>,
}

impl AppState {
    pub fn new(config: Config, db: DbPool) -> Self {
        let payments: Arc<dyn PaymentProcessor> = Arc::new(StripeClient::new(
            config.payments.stripe_secret_key.clone(),
            config.payments.api_base.clone(),
        ));
        Self::with_payments(config, db, payments)
    }

    /// Build state with a specific payment processor
    pub fn with_payments(config: Config, db: DbPool, payments: Arc<dyn PaymentProcessor>) -> Self {
        let sessions = SessionManager::new(&config.auth.session_secret, config.server.production);
        Self {
            config,
            db,
            sessions,
            payments,
        }
    }
}
