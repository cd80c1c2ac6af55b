// src/models.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ServiceError;

/// Service families covered by the Ô Secours product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Motors,
    Auto,
    Telephone,
    CataCatanis,
    SchoolFees,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Motors => "motors",
            ServiceType::Auto => "auto",
            ServiceType::Telephone => "telephone",
            ServiceType::CataCatanis => "cata_catanis",
            ServiceType::SchoolFees => "school_fees",
        }
    }

    /// Validates a stored value at the persistence boundary. Unknown strings
    /// never travel further into the engine.
    pub fn parse(value: &str) -> Result<Self, ServiceError> {
        match value {
            "motors" => Ok(ServiceType::Motors),
            "auto" => Ok(ServiceType::Auto),
            "telephone" => Ok(ServiceType::Telephone),
            "cata_catanis" => Ok(ServiceType::CataCatanis),
            "school_fees" => Ok(ServiceType::SchoolFees),
            other => Err(ServiceError::Validation(format!(
                "unknown service type: {other}"
            ))),
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TxType {
    Purchase,
    Debit,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Purchase => "purchase",
            TxType::Debit => "debit",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ServiceError> {
        match value {
            "purchase" => Ok(TxType::Purchase),
            "debit" => Ok(TxType::Debit),
            other => Err(ServiceError::Validation(format!(
                "unknown transaction type: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RescueStatus {
    Pending,
    Approved,
    Completed,
    Rejected,
}

impl RescueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RescueStatus::Pending => "pending",
            RescueStatus::Approved => "approved",
            RescueStatus::Completed => "completed",
            RescueStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ServiceError> {
        match value {
            "pending" => Ok(RescueStatus::Pending),
            "approved" => Ok(RescueStatus::Approved),
            "completed" => Ok(RescueStatus::Completed),
            "rejected" => Ok(RescueStatus::Rejected),
            other => Err(ServiceError::Validation(format!(
                "unknown rescue request status: {other}"
            ))),
        }
    }

    /// `completed` and `rejected` never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RescueStatus::Completed | RescueStatus::Rejected)
    }
}

impl fmt::Display for RescueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Subscription {
    pub id: i32,
    pub member_id: i32,
    pub service_type: ServiceType,
    pub token_balance: i32,
    pub subscription_date: DateTime<Utc>,
    pub last_rescue_claim_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenTransaction {
    pub id: i32,
    pub subscription_id: i32,
    pub tx_type: TxType,
    pub token_amount: i32,
    /// Total FCFA value at write time: token_amount * tariff token value.
    pub token_value_fcfa: i64,
    pub payment_method: String,
    pub reference: String,
    pub provider_tx_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RescueRequest {
    pub id: i32,
    pub subscription_id: i32,
    pub description: String,
    pub token_balance_at_request: i32,
    pub rescue_value_fcfa: i64,
    pub status: RescueStatus,
    pub request_date: DateTime<Utc>,
    pub admin_notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}
