// src/api/subscriptions.rs

use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::engine::{self, IneligibilityReason};
use crate::error::ServiceError;
use crate::models::{ServiceType, Subscription};
use crate::tariff::ServiceTariff;
use crate::{db, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSubscriptionRequest {
    pub service_type: ServiceType,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EligibilityResponse {
    pub subscription_id: i32,
    pub eligible: bool,
    pub reasons: Vec<IneligibilityReason>,
    /// Present only when eligible; same computation as the submission path.
    pub rescue_value_fcfa: Option<i64>,
    pub multiplier_percent: Option<u16>,
}

#[utoipa::path(
    get,
    path = "/api/services",
    responses((status = 200, description = "Valuation table for all service types", body = [ServiceTariff])),
    tag = "subscriptions"
)]
#[get("/services")]
pub async fn list_services(state: web::Data<AppState>) -> Result<HttpResponse, ServiceError> {
    let tariffs = db::list_tariffs(&state.pool).await?;
    Ok(HttpResponse::Ok().json(tariffs))
}

#[utoipa::path(
    post,
    path = "/api/subscriptions",
    request_body = CreateSubscriptionRequest,
    responses(
        (status = 200, body = Subscription),
        (status = 400, description = "duplicate subscription for this service")
    ),
    tag = "subscriptions"
)]
#[post("/subscriptions")]
pub async fn create_subscription(
    state: web::Data<AppState>,
    member_id: web::ReqData<i32>,
    payload: web::Json<CreateSubscriptionRequest>,
) -> Result<HttpResponse, ServiceError> {
    let member_id = *member_id;
    let now = Utc::now();

    // FK would catch it too, but fail with a clear message first
    if db::get_tariff(&state.pool, payload.service_type).await?.is_none() {
        return Err(ServiceError::NotFound("service tariff"));
    }

    let subscription =
        db::create_subscription(&state.pool, member_id, payload.service_type, now).await?;

    log::info!(
        "subscription opened member_id={} service={} id={}",
        member_id,
        subscription.service_type,
        subscription.id
    );

    Ok(HttpResponse::Ok().json(subscription))
}

#[utoipa::path(
    get,
    path = "/api/subscriptions",
    responses((status = 200, body = [Subscription])),
    tag = "subscriptions"
)]
#[get("/subscriptions")]
pub async fn list_subscriptions(
    state: web::Data<AppState>,
    member_id: web::ReqData<i32>,
) -> Result<HttpResponse, ServiceError> {
    let subs = db::list_subscriptions(&state.pool, *member_id).await?;
    Ok(HttpResponse::Ok().json(subs))
}

#[utoipa::path(
    get,
    path = "/api/subscriptions/{id}/eligibility",
    params(("id" = i32, Path, description = "subscription id")),
    responses(
        (status = 200, body = EligibilityResponse),
        (status = 404, description = "subscription not found")
    ),
    tag = "rescue"
)]
#[get("/subscriptions/{id}/eligibility")]
pub async fn eligibility(
    state: web::Data<AppState>,
    member_id: web::ReqData<i32>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let subscription_id = path.into_inner();
    let now = Utc::now();

    let subscription = db::get_subscription_owned(&state.pool, subscription_id, *member_id)
        .await?
        .ok_or(ServiceError::NotFound("subscription"))?;

    // same gate as the submission path, so an estimate is never quoted for a
    // subscription the write path would refuse
    if !subscription.is_active {
        return Err(ServiceError::Validation(
            "subscription is not active".to_string(),
        ));
    }

    let tariff = db::get_tariff(&state.pool, subscription.service_type)
        .await?
        .ok_or(ServiceError::NotFound("service tariff"))?;

    let reasons = engine::evaluate_eligibility(&subscription, &tariff, now);
    let eligible = reasons.is_empty();

    let (rescue_value_fcfa, multiplier_percent) = if eligible {
        (
            Some(engine::compute_rescue_value(&subscription, &tariff, now)),
            Some(engine::rescue_multiplier(subscription.last_rescue_claim_date, now).percent()),
        )
    } else {
        (None, None)
    };

    Ok(HttpResponse::Ok().json(EligibilityResponse {
        subscription_id,
        eligible,
        reasons,
        rescue_value_fcfa,
        multiplier_percent,
    }))
}
