// src/api/purchases.rs

use actix_web::{post, web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::payment_client::{self, InitiatePaymentRequest, PaymentError};
use crate::error::ServiceError;
use crate::models::{TokenTransaction, TxType};
use crate::tariff::LOW_BALANCE_WARNING_TOKENS;
use crate::{db, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct PurchaseTokensRequest {
    /// i32 on purpose: values outside the column range are refused at the
    /// boundary instead of silently truncated.
    pub token_amount: i32,
    /// e.g. "mobile_money", "card"
    pub payment_method: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseTokensResponse {
    pub transaction: TokenTransaction,
    pub new_balance: i32,
    /// Non-blocking low-balance advisory, present when the balance after the
    /// purchase is still below the rescue minimum.
    pub warning: Option<String>,
}

/// Ledger reference: timestamp plus a random suffix. Uniqueness is advisory;
/// the UNIQUE column is the actual guard.
pub fn new_reference(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("TKN-{}-{}", now.format("%Y%m%d%H%M%S"), &suffix[..8])
}

pub fn low_balance_warning(new_balance: i64) -> Option<String> {
    if new_balance < LOW_BALANCE_WARNING_TOKENS {
        Some(format!(
            "token balance ({new_balance}) is below the rescue minimum of {LOW_BALANCE_WARNING_TOKENS}"
        ))
    } else {
        None
    }
}

#[utoipa::path(
    post,
    path = "/api/subscriptions/{id}/purchase",
    params(("id" = i32, Path, description = "subscription id")),
    request_body = PurchaseTokensRequest,
    responses(
        (status = 200, body = PurchaseTokensResponse),
        (status = 400, description = "non-positive token amount"),
        (status = 404, description = "subscription not found"),
        (status = 502, description = "payment initiation failed")
    ),
    tag = "purchases"
)]
#[post("/subscriptions/{id}/purchase")]
pub async fn purchase_tokens(
    state: web::Data<AppState>,
    member_id: web::ReqData<i32>,
    path: web::Path<i32>,
    payload: web::Json<PurchaseTokensRequest>,
) -> Result<HttpResponse, ServiceError> {
    let member_id = *member_id;
    let subscription_id = path.into_inner();
    let now = Utc::now();

    if payload.token_amount <= 0 {
        return Err(ServiceError::Validation(
            "token_amount must be positive".to_string(),
        ));
    }

    let subscription = db::get_subscription_owned(&state.pool, subscription_id, member_id)
        .await?
        .ok_or(ServiceError::NotFound("subscription"))?;

    if !subscription.is_active {
        return Err(ServiceError::Validation(
            "subscription is not active".to_string(),
        ));
    }

    let tariff = db::get_tariff(&state.pool, subscription.service_type)
        .await?
        .ok_or(ServiceError::NotFound("service tariff"))?;

    let total_value_fcfa = i64::from(payload.token_amount) * tariff.token_value_fcfa;

    let payer_email = db::member_email(&state.pool, member_id)
        .await?
        .ok_or(ServiceError::NotFound("member"))?;

    let reference = new_reference(now);

    log::info!(
        "initiating payment member_id={} subscription_id={} amount_fcfa={} reference={}",
        member_id,
        subscription_id,
        total_value_fcfa,
        reference
    );

    // Payment collection is the gateway's job; the ledger entry is only
    // written once the gateway reports success.
    let confirmation = payment_client::initiate_payment(
        &state.payment_api_base,
        &state.payment_api_key,
        InitiatePaymentRequest {
            amount_fcfa: total_value_fcfa,
            currency: "XOF".to_string(),
            payment_method: payload.payment_method.clone(),
            reference: reference.clone(),
            payer_email,
        },
    )
    .await?;

    if !confirmation.is_succeeded() {
        return Err(ServiceError::Payment(PaymentError::Declined {
            status: confirmation.status,
        }));
    }

    let transaction = db::insert_token_transaction(
        &state.pool,
        subscription_id,
        TxType::Purchase,
        payload.token_amount,
        total_value_fcfa,
        &payload.payment_method,
        &reference,
        Some(&confirmation.transaction_id),
        now,
    )
    .await?;

    // The trigger has applied the amount; read back the result.
    let new_balance = db::subscription_balance(&state.pool, subscription_id).await?;
    let warning = low_balance_warning(i64::from(new_balance));

    Ok(HttpResponse::Ok().json(PurchaseTokensResponse {
        transaction,
        new_balance,
        warning,
    }))
}
