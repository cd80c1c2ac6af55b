// src/api/admin.rs
//
// Operator hooks for the rescue workflow. The engine only creates `pending`
// requests; everything after that is a manual decision exposed here as
// explicit transitions:
//
//   pending -> approved | rejected (terminal, needs notes)
//   approved -> completed (terminal, stamps last_rescue_claim_date)

use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::ServiceError;
use crate::models::{RescueRequest, RescueStatus};
use crate::{db, AppState};

#[derive(Debug, Deserialize)]
pub struct ReviewQueueQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveBody {
    pub admin_notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectBody {
    pub admin_notes: String,
}

#[utoipa::path(
    get,
    path = "/admin/rescue-requests",
    params(("status" = Option<String>, Query, description = "filter by status")),
    responses((status = 200, body = [RescueRequest])),
    tag = "admin"
)]
#[get("/rescue-requests")]
pub async fn review_queue(
    state: web::Data<AppState>,
    query: web::Query<ReviewQueueQuery>,
) -> Result<HttpResponse, ServiceError> {
    let status = query
        .status
        .as_deref()
        .map(RescueStatus::parse)
        .transpose()?;

    let requests = db::list_rescue_requests_by_status(&state.pool, status).await?;
    Ok(HttpResponse::Ok().json(requests))
}

#[utoipa::path(
    post,
    path = "/admin/rescue-requests/{id}/approve",
    params(("id" = i32, Path, description = "rescue request id")),
    request_body = ApproveBody,
    responses(
        (status = 200, body = RescueRequest),
        (status = 400, description = "not in pending status"),
        (status = 404, description = "rescue request not found")
    ),
    tag = "admin"
)]
#[post("/rescue-requests/{id}/approve")]
pub async fn approve(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    payload: web::Json<ApproveBody>,
) -> Result<HttpResponse, ServiceError> {
    let request_id = path.into_inner();
    let request =
        db::approve_rescue_request(&state.pool, request_id, payload.admin_notes.as_deref()).await?;

    log::info!("rescue request approved id={request_id}");
    Ok(HttpResponse::Ok().json(request))
}

#[utoipa::path(
    post,
    path = "/admin/rescue-requests/{id}/reject",
    params(("id" = i32, Path, description = "rescue request id")),
    request_body = RejectBody,
    responses(
        (status = 200, body = RescueRequest),
        (status = 400, description = "not pending, or notes missing"),
        (status = 404, description = "rescue request not found")
    ),
    tag = "admin"
)]
#[post("/rescue-requests/{id}/reject")]
pub async fn reject(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    payload: web::Json<RejectBody>,
) -> Result<HttpResponse, ServiceError> {
    let request_id = path.into_inner();

    let notes = payload.admin_notes.trim();
    if notes.is_empty() {
        return Err(ServiceError::Validation(
            "admin_notes are required when rejecting".to_string(),
        ));
    }

    let request = db::reject_rescue_request(&state.pool, request_id, notes).await?;

    log::info!("rescue request rejected id={request_id}");
    Ok(HttpResponse::Ok().json(request))
}

#[utoipa::path(
    post,
    path = "/admin/rescue-requests/{id}/complete",
    params(("id" = i32, Path, description = "rescue request id")),
    responses(
        (status = 200, body = RescueRequest),
        (status = 400, description = "not in approved status"),
        (status = 404, description = "rescue request not found")
    ),
    tag = "admin"
)]
#[post("/rescue-requests/{id}/complete")]
pub async fn complete(
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let request_id = path.into_inner();
    let now = Utc::now();

    let request = db::complete_rescue_request(&state.pool, request_id, now).await?;

    log::info!(
        "rescue request completed id={request_id} subscription_id={}",
        request.subscription_id
    );
    Ok(HttpResponse::Ok().json(request))
}
