//! Inventory Aggregates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::domain::value_objects::Sku;

/// Upper bound on the units a single stock line may hold.
pub const MAX_STOCK_QUANTITY: i64 = 1_000_000_000;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub id: String,
    pub name: String,
    pub location: String,
    pub address: String,
    pub manager: String,
    pub phone: String,
    pub email: String,
    pub capacity: u32,
    pub current_utilization: u8,
    pub status: WarehouseStatus,
    pub zones: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarehouseStatus { Active, Inactive, Maintenance }

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub sku: Sku,
    pub warehouse_id: String,
    pub warehouse_name: String,
    pub category: String,
    pub size: String,
    pub color: String,
    pub quantity: i64,
    pub reserved_quantity: i64,
    pub available_quantity: i64,
    pub reorder_level: i64,
    pub max_stock_level: i64,
    pub unit_cost: i64,
    pub total_value: i64,
    pub location: StockLocation,
    pub last_updated: DateTime<Utc>,
    pub last_stock_check: DateTime<Utc>,
    pub batch_number: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub supplier: Supplier,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StockLocation { pub zone: String, pub aisle: String, pub shelf: String, pub bin: String }

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier { pub id: String, pub name: String, pub contact_person: String, pub phone: String, pub email: String }

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAlert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub severity: AlertSeverity,
    pub item_id: String,
    pub product_name: String,
    pub sku: Sku,
    pub warehouse_id: String,
    pub warehouse_name: String,
    pub current_quantity: i64,
    pub reorder_level: Option<i64>,
    pub message: String,
    pub is_resolved: bool,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType { LowStock, OutOfStock, Overstock, Expired, Damaged }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity { Low, Medium, High, Critical }

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: String,
    pub order_number: String,
    pub supplier_id: String,
    pub supplier_name: String,
    pub warehouse_id: String,
    pub warehouse_name: String,
    pub status: PurchaseOrderStatus,
    pub items: Vec<PurchaseOrderItem>,
    pub total_amount: i64,
    pub order_date: DateTime<Utc>,
    pub expected_delivery: DateTime<Utc>,
    pub actual_delivery: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_by: String,
    pub approved_by: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderItem {
    pub product_id: String,
    pub product_name: String,
    pub sku: Sku,
    pub quantity_ordered: i64,
    #[serde(default)]
    pub quantity_received: i64,
    pub unit_cost: i64,
    pub total_cost: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus { Draft, Pending, Approved, Sent, Received, Completed, Cancelled }

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockTransfer {
    pub id: String,
    pub transfer_number: String,
    pub from_warehouse_id: String,
    pub from_warehouse_name: String,
    pub to_warehouse_id: String,
    pub to_warehouse_name: String,
    pub status: TransferStatus,
    pub items: Vec<TransferItem>,
    pub requested_by: String,
    pub approved_by: Option<String>,
    pub request_date: DateTime<Utc>,
    pub completed_date: Option<DateTime<Utc>>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferItem {
    pub product_id: String,
    pub product_name: String,
    pub sku: Sku,
    pub quantity: i64,
    pub transferred_quantity: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus { Pending, InTransit, Completed, Cancelled }

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MovementType,
    pub item_id: String,
    pub product_name: String,
    pub sku: Sku,
    pub warehouse_id: String,
    pub quantity: i64,
    pub previous_quantity: i64,
    pub new_quantity: i64,
    pub reason: String,
    pub reference: Option<String>,
    pub performed_by: String,
    pub timestamp: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType { Inbound, Outbound, Transfer, Adjustment, Return, Damage }

impl InventoryItem {
    pub fn is_low_stock(&self) -> bool { self.quantity <= self.reorder_level }
    pub fn is_out_of_stock(&self) -> bool { self.quantity == 0 }

    /// Applies a signed adjustment, flooring stock at zero, and returns the
    /// `(previous, new)` quantities. The item is left untouched on error.
    pub fn adjust(&mut self, adjustment: i64) -> Result<(i64, i64), StockError> {
        let previous = self.quantity;
        let quantity = previous.checked_add(adjustment).ok_or(StockError::OutOfRange)?.max(0);
        if quantity > MAX_STOCK_QUANTITY {
            return Err(StockError::OutOfRange);
        }
        let total_value = quantity.checked_mul(self.unit_cost).ok_or(StockError::OutOfRange)?;

        self.quantity = quantity;
        self.available_quantity = (quantity - self.reserved_quantity).max(0);
        self.total_value = total_value;
        self.touch();
        Ok((previous, quantity))
    }

    pub fn set_reorder_level(&mut self, level: i64) {
        self.reorder_level = level;
        self.touch();
    }

    fn touch(&mut self) { self.last_updated = Utc::now(); }
}

impl StockAlert {
    pub fn resolve(&mut self, by: impl Into<String>) {
        self.is_resolved = true;
        self.resolved_at = Some(Utc::now());
        self.resolved_by = Some(by.into());
    }
}

impl StockTransfer {
    pub fn set_status(&mut self, status: TransferStatus) {
        self.status = status;
        if status == TransferStatus::Completed {
            self.completed_date = Some(Utc::now());
        }
    }
}

impl PurchaseOrderItem {
    pub fn total(items: &[PurchaseOrderItem]) -> i64 {
        items.iter().fold(0_i64, |acc, i| acc.saturating_add(i.total_cost))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum StockError { OutOfRange }
impl std::error::Error for StockError {}
impl fmt::Display for StockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stock quantity must stay between 0 and {MAX_STOCK_QUANTITY}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hoodie() -> InventoryItem {
        InventoryItem {
            id: "inv-001".into(), product_id: "prod-hoodie-001".into(), product_name: "Premium Oversized Hoodie".into(),
            sku: Sku::new("FUC-HOD-001-L-BLK").unwrap(), warehouse_id: "wh-mumbai-001".into(),
            warehouse_name: "Mumbai Central Warehouse".into(), category: "Hoodies".into(), size: "L".into(),
            color: "Black".into(), quantity: 45, reserved_quantity: 5, available_quantity: 40, reorder_level: 20,
            max_stock_level: 200, unit_cost: 1200, total_value: 54000,
            location: StockLocation { zone: "A".into(), aisle: "01".into(), shelf: "03".into(), bin: "B12".into() },
            last_updated: Utc::now(), last_stock_check: Utc::now(), batch_number: None, expiry_date: None,
            supplier: Supplier { id: "sup-001".into(), name: "Urban Threads Pvt Ltd".into(), contact_person: "Vikram Singh".into(), phone: String::new(), email: String::new() },
        }
    }

    #[test]
    fn test_adjust_recomputes_value() {
        let mut item = hoodie();
        assert_eq!(item.adjust(-10), Ok((45, 35)));
        assert_eq!(item.total_value, 42000);
        assert_eq!(item.available_quantity, 30);
    }

    #[test]
    fn test_adjust_floors_at_zero() {
        let mut item = hoodie();
        assert_eq!(item.adjust(-100), Ok((45, 0)));
        assert!(item.is_out_of_stock());
        assert_eq!(item.available_quantity, 0);
        assert_eq!(item.total_value, 0);
    }

    #[test]
    fn test_adjust_rejects_overflow_without_mutating() {
        let mut item = hoodie();
        let stamped = item.last_updated;
        assert_eq!(item.adjust(i64::MAX), Err(StockError::OutOfRange));
        assert_eq!(item.adjust(MAX_STOCK_QUANTITY), Err(StockError::OutOfRange));
        assert_eq!(item.quantity, 45);
        assert_eq!(item.total_value, 54000);
        assert_eq!(item.last_updated, stamped);
        assert_eq!(item.adjust(i64::MIN), Ok((45, 0)));
    }

    #[test]
    fn test_transfer_completion_stamps_date() {
        let mut t = StockTransfer {
            id: "tr-1".into(), transfer_number: "TR-2025-001".into(), from_warehouse_id: "a".into(), from_warehouse_name: String::new(),
            to_warehouse_id: "b".into(), to_warehouse_name: String::new(), status: TransferStatus::InTransit, items: vec![],
            requested_by: "x".into(), approved_by: None, request_date: Utc::now(), completed_date: None, tracking_number: None, notes: None,
        };
        t.set_status(TransferStatus::Cancelled);
        assert!(t.completed_date.is_none());
        t.set_status(TransferStatus::Completed);
        assert!(t.completed_date.is_some());
    }
}
