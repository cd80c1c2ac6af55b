// src/db.rs

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::error::{unique_violation, ServiceError};
use crate::models::{RescueRequest, RescueStatus, ServiceType, Subscription, TokenTransaction, TxType};
use crate::tariff::ServiceTariff;

fn map_subscription(r: &PgRow) -> Result<Subscription, ServiceError> {
    Ok(Subscription {
        id: r.get("id"),
        member_id: r.get("member_id"),
        service_type: ServiceType::parse(r.get::<String, _>("service_type").as_str())?,
        token_balance: r.get("token_balance"),
        subscription_date: r.get("subscription_date"),
        last_rescue_claim_date: r.get("last_rescue_claim_date"),
        is_active: r.get("is_active"),
        created_at: r.get("created_at"),
    })
}

fn map_rescue_request(r: &PgRow) -> Result<RescueRequest, ServiceError> {
    Ok(RescueRequest {
        id: r.get("id"),
        subscription_id: r.get("subscription_id"),
        description: r.get("description"),
        token_balance_at_request: r.get("token_balance_at_request"),
        rescue_value_fcfa: r.get("rescue_value_fcfa"),
        status: RescueStatus::parse(r.get::<String, _>("status").as_str())?,
        request_date: r.get("request_date"),
        admin_notes: r.get("admin_notes"),
        created_at: r.get("created_at"),
    })
}

pub async fn get_tariff(
    pool: &PgPool,
    service_type: ServiceType,
) -> Result<Option<ServiceTariff>, ServiceError> {
    let row = sqlx::query(
        r#"SELECT token_value_fcfa, min_tokens, max_tokens
           FROM service_tariffs
           WHERE service_type = $1"#,
    )
    .bind(service_type.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| ServiceTariff {
        service_type,
        token_value_fcfa: r.get("token_value_fcfa"),
        min_tokens: r.get("min_tokens"),
        max_tokens: r.get("max_tokens"),
    }))
}

pub async fn list_tariffs(pool: &PgPool) -> Result<Vec<ServiceTariff>, ServiceError> {
    let rows = sqlx::query(
        r#"SELECT service_type, token_value_fcfa, min_tokens, max_tokens
           FROM service_tariffs
           ORDER BY service_type"#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|r| {
            Ok(ServiceTariff {
                service_type: ServiceType::parse(r.get::<String, _>("service_type").as_str())?,
                token_value_fcfa: r.get("token_value_fcfa"),
                min_tokens: r.get("min_tokens"),
                max_tokens: r.get("max_tokens"),
            })
        })
        .collect()
}

pub async fn member_email(pool: &PgPool, member_id: i32) -> Result<Option<String>, ServiceError> {
    let row = sqlx::query("SELECT email FROM members WHERE id = $1")
        .bind(member_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.get("email")))
}

pub async fn create_subscription(
    pool: &PgPool,
    member_id: i32,
    service_type: ServiceType,
    now: DateTime<Utc>,
) -> Result<Subscription, ServiceError> {
    let row = sqlx::query(
        r#"INSERT INTO subscriptions (member_id, service_type, subscription_date)
           VALUES ($1, $2, $3)
           RETURNING id, member_id, service_type, token_balance, subscription_date,
                     last_rescue_claim_date, is_active, created_at"#,
    )
    .bind(member_id)
    .bind(service_type.as_str())
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| match unique_violation(&e) {
        Some(c) if c == "subscriptions_member_service_key" => ServiceError::Validation(format!(
            "a subscription for service '{service_type}' already exists"
        )),
        _ => ServiceError::Database(e),
    })?;

    map_subscription(&row)
}

/// Read scoped to the owning member, so a foreign id behaves like a missing one.
pub async fn get_subscription_owned(
    pool: &PgPool,
    subscription_id: i32,
    member_id: i32,
) -> Result<Option<Subscription>, ServiceError> {
    let row = sqlx::query(
        r#"SELECT id, member_id, service_type, token_balance, subscription_date,
                  last_rescue_claim_date, is_active, created_at
           FROM subscriptions
           WHERE id = $1 AND member_id = $2"#,
    )
    .bind(subscription_id)
    .bind(member_id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| map_subscription(&r)).transpose()
}

pub async fn list_subscriptions(
    pool: &PgPool,
    member_id: i32,
) -> Result<Vec<Subscription>, ServiceError> {
    let rows = sqlx::query(
        r#"SELECT id, member_id, service_type, token_balance, subscription_date,
                  last_rescue_claim_date, is_active, created_at
           FROM subscriptions
           WHERE member_id = $1
           ORDER BY created_at DESC"#,
    )
    .bind(member_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(map_subscription).collect()
}

/// Re-reads the balance after the ledger trigger has applied a transaction.
pub async fn subscription_balance(
    pool: &PgPool,
    subscription_id: i32,
) -> Result<i32, ServiceError> {
    let row = sqlx::query("SELECT token_balance FROM subscriptions WHERE id = $1")
        .bind(subscription_id)
        .fetch_one(pool)
        .await?;
    Ok(row.get("token_balance"))
}

/// Appends a ledger entry. The balance increment/decrement is applied by the
/// token_transactions trigger, not recomputed here.
#[allow(clippy::too_many_arguments)]
pub async fn insert_token_transaction(
    pool: &PgPool,
    subscription_id: i32,
    tx_type: TxType,
    token_amount: i32,
    token_value_fcfa: i64,
    payment_method: &str,
    reference: &str,
    provider_tx_id: Option<&str>,
    now: DateTime<Utc>,
) -> Result<TokenTransaction, ServiceError> {
    let row = sqlx::query(
        r#"INSERT INTO token_transactions
               (subscription_id, tx_type, token_amount, token_value_fcfa,
                payment_method, reference, provider_tx_id, created_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
           RETURNING id, created_at"#,
    )
    .bind(subscription_id)
    .bind(tx_type.as_str())
    .bind(token_amount)
    .bind(token_value_fcfa)
    .bind(payment_method)
    .bind(reference)
    .bind(provider_tx_id)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(TokenTransaction {
        id: row.get("id"),
        subscription_id,
        tx_type,
        token_amount,
        token_value_fcfa,
        payment_method: payment_method.to_string(),
        reference: reference.to_string(),
        provider_tx_id: provider_tx_id.map(|s| s.to_string()),
        created_at: row.get("created_at"),
    })
}

pub async fn insert_rescue_request(
    pool: &PgPool,
    subscription_id: i32,
    description: &str,
    token_balance_at_request: i32,
    rescue_value_fcfa: i64,
    now: DateTime<Utc>,
) -> Result<RescueRequest, ServiceError> {
    let row = sqlx::query(
        r#"INSERT INTO rescue_requests
               (subscription_id, description, token_balance_at_request,
                rescue_value_fcfa, status, request_date)
           VALUES ($1, $2, $3, $4, 'pending', $5)
           RETURNING id, subscription_id, description, token_balance_at_request,
                     rescue_value_fcfa, status, request_date, admin_notes, created_at"#,
    )
    .bind(subscription_id)
    .bind(description)
    .bind(token_balance_at_request)
    .bind(rescue_value_fcfa)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| match unique_violation(&e) {
        Some(c) if c == "rescue_requests_one_pending" => ServiceError::Validation(
            "a pending rescue request already exists for this subscription".to_string(),
        ),
        _ => ServiceError::Database(e),
    })?;

    map_rescue_request(&row)
}

pub async fn list_rescue_requests_for_member(
    pool: &PgPool,
    member_id: i32,
) -> Result<Vec<RescueRequest>, ServiceError> {
    let rows = sqlx::query(
        r#"SELECT r.id, r.subscription_id, r.description, r.token_balance_at_request,
                  r.rescue_value_fcfa, r.status, r.request_date, r.admin_notes, r.created_at
           FROM rescue_requests r
           JOIN subscriptions s ON s.id = r.subscription_id
           WHERE s.member_id = $1
           ORDER BY r.request_date DESC"#,
    )
    .bind(member_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(map_rescue_request).collect()
}

pub async fn list_rescue_requests_by_status(
    pool: &PgPool,
    status: Option<RescueStatus>,
) -> Result<Vec<RescueRequest>, ServiceError> {
    let rows = match status {
        Some(status) => {
            sqlx::query(
                r#"SELECT id, subscription_id, description, token_balance_at_request,
                          rescue_value_fcfa, status, request_date, admin_notes, created_at
                   FROM rescue_requests
                   WHERE status = $1
                   ORDER BY request_date ASC"#,
            )
            .bind(status.as_str())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(
                r#"SELECT id, subscription_id, description, token_balance_at_request,
                          rescue_value_fcfa, status, request_date, admin_notes, created_at
                   FROM rescue_requests
                   ORDER BY request_date ASC"#,
            )
            .fetch_all(pool)
            .await?
        }
    };

    rows.iter().map(map_rescue_request).collect()
}

pub async fn get_rescue_request(
    pool: &PgPool,
    request_id: i32,
) -> Result<Option<RescueRequest>, ServiceError> {
    let row = sqlx::query(
        r#"SELECT id, subscription_id, description, token_balance_at_request,
                  rescue_value_fcfa, status, request_date, admin_notes, created_at
           FROM rescue_requests
           WHERE id = $1"#,
    )
    .bind(request_id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| map_rescue_request(&r)).transpose()
}

fn invalid_transition(request: &RescueRequest, action: &str) -> ServiceError {
    ServiceError::Validation(format!(
        "cannot {action} a rescue request in status '{}'",
        request.status
    ))
}

/// pending -> approved
pub async fn approve_rescue_request(
    pool: &PgPool,
    request_id: i32,
    admin_notes: Option<&str>,
) -> Result<RescueRequest, ServiceError> {
    let request = get_rescue_request(pool, request_id)
        .await?
        .ok_or(ServiceError::NotFound("rescue request"))?;
    if request.status != RescueStatus::Pending {
        return Err(invalid_transition(&request, "approve"));
    }

    let row = sqlx::query(
        r#"UPDATE rescue_requests
           SET status = 'approved', admin_notes = COALESCE($2, admin_notes)
           WHERE id = $1 AND status = 'pending'
           RETURNING id, subscription_id, description, token_balance_at_request,
                     rescue_value_fcfa, status, request_date, admin_notes, created_at"#,
    )
    .bind(request_id)
    .bind(admin_notes)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| invalid_transition(&request, "approve"))?;

    map_rescue_request(&row)
}

/// pending -> rejected (terminal). Notes are mandatory for rejections.
pub async fn reject_rescue_request(
    pool: &PgPool,
    request_id: i32,
    admin_notes: &str,
) -> Result<RescueRequest, ServiceError> {
    let request = get_rescue_request(pool, request_id)
        .await?
        .ok_or(ServiceError::NotFound("rescue request"))?;
    if request.status != RescueStatus::Pending {
        return Err(invalid_transition(&request, "reject"));
    }

    let row = sqlx::query(
        r#"UPDATE rescue_requests
           SET status = 'rejected', admin_notes = $2
           WHERE id = $1 AND status = 'pending'
           RETURNING id, subscription_id, description, token_balance_at_request,
                     rescue_value_fcfa, status, request_date, admin_notes, created_at"#,
    )
    .bind(request_id)
    .bind(admin_notes)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| invalid_transition(&request, "reject"))?;

    map_rescue_request(&row)
}

/// approved -> completed (terminal). Stamps last_rescue_claim_date on the
/// owning subscription in the same transaction, so a completed request and its
/// bonus-clock reset are never observed separately.
pub async fn complete_rescue_request(
    pool: &PgPool,
    request_id: i32,
    now: DateTime<Utc>,
) -> Result<RescueRequest, ServiceError> {
    let request = get_rescue_request(pool, request_id)
        .await?
        .ok_or(ServiceError::NotFound("rescue request"))?;
    if request.status != RescueStatus::Approved {
        return Err(invalid_transition(&request, "complete"));
    }

    let mut tx = pool.begin().await?;

    let row = sqlx::query(
        r#"UPDATE rescue_requests
           SET status = 'completed'
           WHERE id = $1 AND status = 'approved'
           RETURNING id, subscription_id, description, token_balance_at_request,
                     rescue_value_fcfa, status, request_date, admin_notes, created_at"#,
    )
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| invalid_transition(&request, "complete"))?;

    let completed = map_rescue_request(&row)?;

    sqlx::query("UPDATE subscriptions SET last_rescue_claim_date = $1 WHERE id = $2")
        .bind(now)
        .bind(completed.subscription_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(completed)
}
