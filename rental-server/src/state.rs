//! Application state for rental-server

use std::sync::Arc;

use crate::config::Config;
use crate::db::{PgStore, RentalStore};
use crate::gateway::{MidtransGateway, PaymentGateway};
use crate::orders::OrderWorkflow;
use crate::reconcile::Reconciler;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Order creation, return and lookup
    pub orders: OrderWorkflow,
    /// Payment notification handling
    pub reconciler: Reconciler,
}

impl AppState {
    /// Connect to PostgreSQL (running migrations) and build the Midtrans client
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let store = PgStore::connect(&config.database_url, config.db_max_connections).await?;
        tracing::info!("Database ready");

        let gateway = MidtransGateway::new(
            &config.midtrans_server_key,
            config.midtrans_production,
            config.gateway_timeout,
        )?;
        tracing::info!(
            production = config.midtrans_production,
            timeout_secs = config.gateway_timeout.as_secs(),
            "Midtrans client ready"
        );

        Ok(Self::from_parts(
            Arc::new(store),
            Arc::new(gateway),
            config.release_bikes_on_failed_payment,
        ))
    }

    pub fn from_parts(
        store: Arc<dyn RentalStore>,
        gateway: Arc<dyn PaymentGateway>,
        release_bikes_on_failed_payment: bool,
    ) -> Self {
        Self {
            orders: OrderWorkflow::new(store.clone(), gateway.clone()),
            reconciler: Reconciler::new(store, gateway, release_bikes_on_failed_payment),
        }
    }
}
