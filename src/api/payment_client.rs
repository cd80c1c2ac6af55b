// src/api/payment_client.rs
//
// Minimal client for the payment-initiation gateway. The gateway is an opaque
// collaborator: given an amount and a method it answers with a status and its
// own transaction id. Authorization: X-Api-Key header.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug)]
pub enum PaymentError {
    Http(reqwest::Error),
    Api { status: u16, body: String },
    InvalidResponse(String),
    /// The gateway answered, but the payment did not go through.
    Declined { status: String },
}

impl fmt::Display for PaymentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentError::Http(e) => write!(f, "http error: {e}"),
            PaymentError::Api { status, body } => {
                write!(f, "gateway error status={status} body={body}")
            }
            PaymentError::InvalidResponse(e) => write!(f, "invalid response: {e}"),
            PaymentError::Declined { status } => write!(f, "payment declined: status={status}"),
        }
    }
}

impl From<reqwest::Error> for PaymentError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

#[derive(Debug, Serialize)]
pub struct InitiatePaymentRequest {
    #[serde(rename = "amount")]
    pub amount_fcfa: i64,

    pub currency: String,

    #[serde(rename = "paymentMethod")]
    pub payment_method: String,

    /// Our ledger reference; echoed back by the gateway for reconciliation.
    pub reference: String,

    #[serde(rename = "payerEmail")]
    pub payer_email: String,
}

#[derive(Debug, Deserialize)]
pub struct PaymentConfirmation {
    #[serde(rename = "transactionId")]
    pub transaction_id: String,

    pub status: String,
}

impl PaymentConfirmation {
    pub fn is_succeeded(&self) -> bool {
        matches!(self.status.as_str(), "succeeded" | "success" | "completed")
    }
}

pub async fn initiate_payment(
    base_url: &str,
    api_key: &str,
    req: InitiatePaymentRequest,
) -> Result<PaymentConfirmation, PaymentError> {
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base_url}/api/v1/payments"))
        .header("X-Api-Key", api_key)
        .json(&req)
        .send()
        .await?;

    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(PaymentError::Api {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str::<PaymentConfirmation>(&body)
        .map_err(|e| PaymentError::InvalidResponse(format!("{e}; body={body}")))
}
