//! Scripted gateway for tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CheckoutRequest, GatewayError, PaymentGateway, TransactionStatus};

/// Gateway double: records checkouts and answers status queries from a script
#[derive(Default)]
pub struct FakeGateway {
    checkouts: Mutex<Vec<CheckoutRequest>>,
    statuses: Mutex<HashMap<String, TransactionStatus>>,
    checkout_failure: Mutex<Option<GatewayError>>,
    status_failure: Mutex<Option<GatewayError>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the status returned for `order_id`
    pub fn set_status(&self, order_id: &str, transaction: &str, fraud: Option<&str>, payment_type: &str) {
        self.statuses.lock().unwrap().insert(
            order_id.to_string(),
            TransactionStatus {
                transaction_status: transaction.to_string(),
                fraud_status: fraud.map(String::from),
                payment_type: Some(payment_type.to_string()),
            },
        );
    }

    /// Next `create_checkout` fails with `err`
    pub fn fail_checkout(&self, err: GatewayError) {
        *self.checkout_failure.lock().unwrap() = Some(err);
    }

    /// Next `transaction_status` fails with `err`
    pub fn fail_status(&self, err: GatewayError) {
        *self.status_failure.lock().unwrap() = Some(err);
    }

    pub fn checkouts(&self) -> Vec<CheckoutRequest> {
        self.checkouts.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<String, GatewayError> {
        if let Some(err) = self.checkout_failure.lock().unwrap().take() {
            return Err(err);
        }
        self.checkouts.lock().unwrap().push(request.clone());
        Ok(format!(
            "https://app.sandbox.midtrans.com/snap/v3/redirection/{}",
            request.order_id
        ))
    }

    async fn transaction_status(&self, order_id: &str) -> Result<TransactionStatus, GatewayError> {
        if let Some(err) = self.status_failure.lock().unwrap().take() {
            return Err(err);
        }
        self.statuses
            .lock()
            .unwrap()
            .get(order_id)
            .cloned()
            .ok_or_else(|| GatewayError::Rejected {
                status: 404,
                message: "Transaction doesn't exist.".to_string(),
            })
    }
}
