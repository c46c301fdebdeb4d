//! Aggregates module
pub mod affiliate;
pub mod experiment;
pub mod feature_flag;
pub mod inventory;
pub mod rum;

pub use affiliate::{AffiliateProfile, AffiliateStatus, AffiliateType, Commission, CommissionStatus, Payout, PayoutStatus, PaymentMethod, PromotionalContent, ReferralClick};
pub use experiment::{DeviceType, ExperimentAssignment, ExperimentConfig, ExperimentDraft, ExperimentStatus, ExperimentType, ExperimentVariant, Targeting, VariantChange};
pub use feature_flag::{FeatureFlag, FeatureFlagDraft, FlagTargeting};
pub use inventory::{InventoryItem, PurchaseOrder, PurchaseOrderStatus, StockAlert, StockMovement, StockTransfer, TransferStatus, Warehouse};
pub use rum::{ErrorReport, PerformanceMetrics, RumEnvelope, RumKind, RumStats, UserInteraction};
