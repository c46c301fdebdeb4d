//! FASHUN.CO Storefront Service
//!
//! Backend for the FASHUN.CO streetwear storefront and admin console.
//!
//! ## Features
//! - Experiment assignment (deterministic bucketing, targeting, sandboxed variants)
//! - Feature flag rollout
//! - Inventory management (warehouses, alerts, purchase orders, transfers)
//! - Affiliate program (commissions, payouts, click tracking)
//! - Real user monitoring ingest and stats
//! - Tiered image fallback with generated placeholders

pub mod api;
pub mod config;
pub mod domain;
pub mod events;
pub mod experiments;
pub mod images;
pub mod repository;
pub mod services;

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid action")]
    InvalidAction,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Insufficient balance")]
    InsufficientBalance { available: domain::value_objects::Money },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl From<validator::ValidationErrors> for StoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        StoreError::Validation(errors.to_string())
    }
}

impl From<domain::value_objects::SkuError> for StoreError {
    fn from(e: domain::value_objects::SkuError) -> Self {
        StoreError::Validation(e.to_string())
    }
}

impl From<domain::value_objects::PercentageError> for StoreError {
    fn from(e: domain::value_objects::PercentageError) -> Self {
        StoreError::Validation(e.to_string())
    }
}

impl From<domain::aggregates::inventory::StockError> for StoreError {
    fn from(e: domain::aggregates::inventory::StockError) -> Self {
        StoreError::Validation(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
