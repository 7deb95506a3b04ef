//! Midtrans integration via REST API (no SDK dependency)
//!
//! - Snap: `POST /snap/v1/transactions` creates a hosted checkout
//! - Core API: `GET /v2/{order_id}/status` reads the transaction status

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use super::{CheckoutRequest, GatewayError, PaymentGateway, TransactionStatus};

const SANDBOX_SNAP_URL: &str = "https://app.sandbox.midtrans.com";
const SANDBOX_API_URL: &str = "https://api.sandbox.midtrans.com";
const PRODUCTION_SNAP_URL: &str = "https://app.midtrans.com";
const PRODUCTION_API_URL: &str = "https://api.midtrans.com";

/// Payment channels offered on the hosted checkout page
const ENABLED_PAYMENTS: [&str; 7] = [
    "bni_va",
    "permata_va",
    "bca_va",
    "bri_va",
    "bank_transfer",
    "gopay",
    "shopeepay",
];

/// Midtrans client, built once at start-up and shared across requests
#[derive(Clone)]
pub struct MidtransGateway {
    http: Client,
    server_key: String,
    snap_base_url: String,
    api_base_url: String,
}

impl MidtransGateway {
    pub fn new(server_key: &str, production: bool, timeout: Duration) -> Result<Self, GatewayError> {
        let (snap, api) = if production {
            (PRODUCTION_SNAP_URL, PRODUCTION_API_URL)
        } else {
            (SANDBOX_SNAP_URL, SANDBOX_API_URL)
        };
        Self::with_base_urls(server_key, snap, api, timeout)
    }

    pub fn with_base_urls(
        server_key: &str,
        snap_base_url: &str,
        api_base_url: &str,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;

        Ok(Self {
            http,
            server_key: server_key.to_string(),
            snap_base_url: snap_base_url.trim_end_matches('/').to_string(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_decode() {
        GatewayError::Malformed(err.to_string())
    } else {
        GatewayError::Unavailable(err.to_string())
    }
}

/// Snap request body
fn snap_payload(request: &CheckoutRequest) -> Value {
    json!({
        "transaction_details": {
            "order_id": request.order_id,
            "gross_amount": request.gross_amount,
        },
        "customer_details": {
            "email": request.customer_email,
            "phone": request.customer_phone,
        },
        "item_details": request.items,
        "enabled_payments": ENABLED_PAYMENTS,
    })
}

/// First human-readable message in a Midtrans error body
fn error_message(body: &Value) -> String {
    body["error_messages"]
        .as_array()
        .and_then(|msgs| msgs.first())
        .and_then(Value::as_str)
        .or_else(|| body["status_message"].as_str())
        .unwrap_or("unknown error")
        .to_string()
}

/// Map a non-success HTTP status: provider-side failures are retryable
fn status_error(status: reqwest::StatusCode, body: &Value) -> GatewayError {
    if status.is_server_error() {
        GatewayError::Unavailable(format!("{status}: {}", error_message(body)))
    } else {
        GatewayError::Rejected {
            status: status.as_u16(),
            message: error_message(body),
        }
    }
}

/// Read a response body, classifying by HTTP status before parsing.
///
/// Proxies in front of Midtrans answer 5xx with HTML or nothing at all, so
/// an error body is parsed leniently and only a success body must be JSON.
async fn read_body(resp: reqwest::Response) -> Result<Value, GatewayError> {
    let status = resp.status();
    let text = resp.text().await.map_err(transport_error)?;
    let parsed = serde_json::from_str::<Value>(&text);
    if !status.is_success() {
        return Err(status_error(status, &parsed.unwrap_or(Value::Null)));
    }
    parsed.map_err(|e| GatewayError::Malformed(format!("invalid JSON body: {e}")))
}

/// Parse a Core API status body.
///
/// Midtrans answers HTTP 200 even for unknown orders; the real outcome
/// lives in `status_code` and only a body with `transaction_status` is a
/// transaction.
fn parse_status_body(body: Value) -> Result<TransactionStatus, GatewayError> {
    if body.get("transaction_status").is_none() {
        let status = body["status_code"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        return Err(GatewayError::Rejected {
            status,
            message: error_message(&body),
        });
    }
    serde_json::from_value(body).map_err(|e| GatewayError::Malformed(e.to_string()))
}

#[async_trait]
impl PaymentGateway for MidtransGateway {
    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<String, GatewayError> {
        let resp = self
            .http
            .post(format!("{}/snap/v1/transactions", self.snap_base_url))
            .basic_auth(&self.server_key, Some(""))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&snap_payload(request))
            .send()
            .await
            .map_err(transport_error)?;

        let body = read_body(resp).await?;
        body["redirect_url"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| GatewayError::Malformed(format!("Snap response without redirect_url: {body}")))
    }

    async fn transaction_status(&self, order_id: &str) -> Result<TransactionStatus, GatewayError> {
        let resp = self
            .http
            .get(format!("{}/v2/{order_id}/status", self.api_base_url))
            .basic_auth(&self.server_key, Some(""))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport_error)?;

        parse_status_body(read_body(resp).await?)
    }
}
