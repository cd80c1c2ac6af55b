// src/tariff.rs
//
// Per-service token valuation. The authoritative copy lives in the
// service_tariffs table (seeded by migration 0002); these constants mirror it
// so the pure engine can be tested without a database.

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::ServiceType;

/// Below this many tokens the purchase response carries a low-balance warning.
pub const LOW_BALANCE_WARNING_TOKENS: i64 = 30;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServiceTariff {
    pub service_type: ServiceType,
    pub token_value_fcfa: i64,
    pub min_tokens: i64,
    pub max_tokens: i64,
}

impl ServiceTariff {
    pub fn for_service(service_type: ServiceType) -> ServiceTariff {
        let (token_value_fcfa, min_tokens, max_tokens) = match service_type {
            ServiceType::Motors => (250, 30, 60),
            ServiceType::Telephone => (250, 30, 60),
            ServiceType::SchoolFees => (500, 30, 60),
            ServiceType::CataCatanis => (500, 30, 60),
            ServiceType::Auto => (750, 30, 60),
        };
        ServiceTariff {
            service_type,
            token_value_fcfa,
            min_tokens,
            max_tokens,
        }
    }
}
