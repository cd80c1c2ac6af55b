// src/engine.rs
//
// Pure eligibility and payout computation for Ô Secours rescue requests.
// No I/O: callers load the subscription and tariff, inject `now`, and get the
// same answer whether they are rendering an estimate or persisting a request.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Subscription;
use crate::tariff::ServiceTariff;

/// A subscription must be at least this old before tokens become claimable.
pub const MATURATION_DAYS: i64 = 30;

/// A claim older than this restores the 200% payout bonus.
pub const BONUS_RESET_DAYS: i64 = 365;

const MILLIS_PER_DAY: i64 = 86_400_000;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum IneligibilityReason {
    /// The 30-day maturation window has not elapsed. `days_remaining` is a
    /// ceiling, for display only.
    SubscriptionTooRecent { days_remaining: i64 },
    /// The token balance is below the service minimum.
    InsufficientTokens {
        balance: i64,
        minimum: i64,
        shortfall: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayoutMultiplier {
    /// 200%: first claim ever, or the last claim is at least a year old.
    Double,
    /// 150%: a claim within the last year.
    OneAndHalf,
}

impl PayoutMultiplier {
    /// Applies the multiplier in integer arithmetic, flooring. Under-payment
    /// is the conservative default; the result never exceeds the exact
    /// real-valued product.
    pub fn apply(self, base_fcfa: i64) -> i64 {
        match self {
            PayoutMultiplier::Double => base_fcfa * 2,
            PayoutMultiplier::OneAndHalf => base_fcfa * 3 / 2,
        }
    }

    pub fn percent(self) -> u16 {
        match self {
            PayoutMultiplier::Double => 200,
            PayoutMultiplier::OneAndHalf => 150,
        }
    }
}

/// Whole days needed to cover `deficit`, rounding any partial day up. Counted
/// in milliseconds so even a sub-second deficit reports one remaining day
/// rather than a contradictory zero.
fn ceil_days(deficit: Duration) -> i64 {
    let millis = deficit.num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

/// Checks both rescue conditions. An empty vec means eligible. Boundaries are
/// inclusive: exactly 30 days old counts, exactly the minimum balance counts.
pub fn evaluate_eligibility(
    subscription: &Subscription,
    tariff: &ServiceTariff,
    now: DateTime<Utc>,
) -> Vec<IneligibilityReason> {
    let mut reasons = Vec::new();

    let elapsed = now - subscription.subscription_date;
    let maturation = Duration::days(MATURATION_DAYS);
    if elapsed < maturation {
        reasons.push(IneligibilityReason::SubscriptionTooRecent {
            days_remaining: ceil_days(maturation - elapsed),
        });
    }

    let balance = i64::from(subscription.token_balance);
    if balance < tariff.min_tokens {
        reasons.push(IneligibilityReason::InsufficientTokens {
            balance,
            minimum: tariff.min_tokens,
            shortfall: tariff.min_tokens - balance,
        });
    }

    reasons
}

pub fn is_eligible(
    subscription: &Subscription,
    tariff: &ServiceTariff,
    now: DateTime<Utc>,
) -> bool {
    evaluate_eligibility(subscription, tariff, now).is_empty()
}

pub fn rescue_multiplier(
    last_rescue_claim_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> PayoutMultiplier {
    match last_rescue_claim_date {
        None => PayoutMultiplier::Double,
        Some(last) if now - last >= Duration::days(BONUS_RESET_DAYS) => PayoutMultiplier::Double,
        Some(_) => PayoutMultiplier::OneAndHalf,
    }
}

/// `floor(token_balance * token_value * multiplier)` in FCFA. Deterministic in
/// its inputs; both the estimate endpoint and the submission write path call
/// this with the live balance and the request clock.
pub fn compute_rescue_value(
    subscription: &Subscription,
    tariff: &ServiceTariff,
    now: DateTime<Utc>,
) -> i64 {
    let base = i64::from(subscription.token_balance) * tariff.token_value_fcfa;
    rescue_multiplier(subscription.last_rescue_claim_date, now).apply(base)
}
