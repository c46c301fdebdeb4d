//! Domain events
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    Experiment(ExperimentEvent),
    Inventory(InventoryEvent),
    Affiliate(AffiliateEvent),
}

impl DomainEvent {
    /// Subject segment used when forwarding to the message bus.
    pub fn subject(&self) -> &'static str {
        match self {
            DomainEvent::Experiment(_) => "fashun.experiments",
            DomainEvent::Inventory(_) => "fashun.inventory",
            DomainEvent::Affiliate(_) => "fashun.affiliate",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "eventType", rename_all = "snake_case")]
pub enum ExperimentEvent {
    Created { experiment_id: String },
    Started { experiment_id: String },
    Stopped { experiment_id: String },
    Assignment { experiment_id: String, variant_id: String, user_id: Option<String>, session_id: String, at: DateTime<Utc> },
    Exposure { experiment_id: String, variant_id: String, user_id: Option<String>, session_id: String, at: DateTime<Utc> },
    Conversion { experiment_id: String, variant_id: String, goal_name: String, value: Option<f64>, metadata: Option<Value>, user_id: Option<String>, session_id: String, at: DateTime<Utc> },
    FeatureFlagCreated { flag_id: String },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "eventType", rename_all = "snake_case")]
pub enum InventoryEvent {
    StockAdjusted { item_id: String, previous_quantity: i64, new_quantity: i64 },
    AlertResolved { alert_id: String },
    PurchaseOrderCreated { purchase_order_id: String, total_amount: i64 },
    TransferCreated { transfer_id: String },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "eventType", rename_all = "snake_case")]
pub enum AffiliateEvent {
    Registered { affiliate_id: String, affiliate_code: String },
    PayoutRequested { affiliate_id: String, amount: Money },
    ClickTracked { affiliate_id: String, affiliate_code: String },
}
