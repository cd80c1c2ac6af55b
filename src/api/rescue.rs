// src/api/rescue.rs

use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::engine;
use crate::error::ServiceError;
use crate::models::RescueRequest;
use crate::{db, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitRescueRequest {
    pub description: String,
}

#[utoipa::path(
    post,
    path = "/api/subscriptions/{id}/rescue",
    params(("id" = i32, Path, description = "subscription id")),
    request_body = SubmitRescueRequest,
    responses(
        (status = 200, body = RescueRequest),
        (status = 400, description = "empty description or pending request exists"),
        (status = 404, description = "subscription not found"),
        (status = 422, description = "not eligible; body carries the reasons")
    ),
    tag = "rescue"
)]
#[post("/subscriptions/{id}/rescue")]
pub async fn submit_rescue_request(
    state: web::Data<AppState>,
    member_id: web::ReqData<i32>,
    path: web::Path<i32>,
    payload: web::Json<SubmitRescueRequest>,
) -> Result<HttpResponse, ServiceError> {
    let subscription_id = path.into_inner();
    let now = Utc::now();

    // validated before anything is loaded or checked
    let description = payload.description.trim();
    if description.is_empty() {
        return Err(ServiceError::Validation(
            "description must not be empty".to_string(),
        ));
    }

    let subscription = db::get_subscription_owned(&state.pool, subscription_id, *member_id)
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

    // Re-checked here with the live balance and clock; an earlier UI verdict
    // is never trusted.
    let reasons = engine::evaluate_eligibility(&subscription, &tariff, now);
    if !reasons.is_empty() {
        return Err(ServiceError::Ineligible(reasons));
    }

    let rescue_value_fcfa = engine::compute_rescue_value(&subscription, &tariff, now);

    // No token debit here: the request only snapshots the balance.
    let request = db::insert_rescue_request(
        &state.pool,
        subscription_id,
        description,
        subscription.token_balance,
        rescue_value_fcfa,
        now,
    )
    .await?;

    log::info!(
        "rescue request created id={} subscription_id={} value_fcfa={}",
        request.id,
        subscription_id,
        rescue_value_fcfa
    );

    Ok(HttpResponse::Ok().json(request))
}

#[utoipa::path(
    get,
    path = "/api/rescue-requests",
    responses((status = 200, body = [RescueRequest])),
    tag = "rescue"
)]
#[get("/rescue-requests")]
pub async fn list_rescue_requests(
    state: web::Data<AppState>,
    member_id: web::ReqData<i32>,
) -> Result<HttpResponse, ServiceError> {
    let requests = db::list_rescue_requests_for_member(&state.pool, *member_id).await?;
    Ok(HttpResponse::Ok().json(requests))
}
