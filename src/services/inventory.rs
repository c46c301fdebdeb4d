//! Warehouse stock, alerts, purchase orders and transfers.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{paginate, parse_filter, Paginated};
use crate::domain::aggregates::inventory::{
    AlertSeverity, AlertType, MovementType, PurchaseOrderItem, TransferItem, WarehouseStatus,
};
use crate::domain::aggregates::{
    InventoryItem, PurchaseOrder, PurchaseOrderStatus, StockAlert, StockMovement, StockTransfer, TransferStatus, Warehouse,
};
use crate::domain::events::{DomainEvent, InventoryEvent};
use crate::events::EventBus;
use crate::repository::Repositories;
use crate::{Result, StoreError};

const SYSTEM_USER: &str = "System User";

/// Query-string parameters of `GET /api/inventory`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryParams {
    pub action: Option<String>,
    pub warehouse_id: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(rename = "type")]
    pub alert_type: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub item_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum InventoryCommand {
    CreatePurchaseOrder {
        supplier_id: String,
        warehouse_id: String,
        items: Vec<PurchaseOrderItem>,
        expected_delivery: DateTime<Utc>,
        notes: Option<String>,
    },
    CreateTransfer {
        from_warehouse_id: String,
        to_warehouse_id: String,
        transfer_items: Vec<TransferItem>,
        request_notes: Option<String>,
    },
    AdjustStock {
        item_id: String,
        adjustment: i64,
        #[serde(default)]
        reason: String,
        adjustment_notes: Option<String>,
    },
    ResolveAlert {
        alert_id: String,
        resolution_notes: Option<String>,
    },
}

impl InventoryCommand {
    pub const ACTIONS: &'static [&'static str] = &["create-purchase-order", "create-transfer", "adjust-stock", "resolve-alert"];
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum InventoryUpdate {
    UpdateReorderLevel { id: String, new_reorder_level: i64 },
    UpdatePoStatus { id: String, status: PurchaseOrderStatus },
    UpdateTransferStatus { id: String, transfer_status: TransferStatus },
}

impl InventoryUpdate {
    pub const ACTIONS: &'static [&'static str] = &["update-reorder-level", "update-po-status", "update-transfer-status"];
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_stock: i64,
    pub total_value: i64,
    pub low_stock_items: usize,
    pub out_of_stock_items: usize,
    pub active_alerts: usize,
    #[serde(rename = "pendingPOs")]
    pub pending_pos: usize,
}

#[derive(Debug, Serialize)]
pub struct WarehouseUtilization {
    pub name: String,
    pub utilization: u8,
    pub capacity: u32,
    pub status: WarehouseStatus,
}

#[derive(Debug, Serialize)]
pub struct TopProduct {
    pub name: String,
    pub sku: String,
    pub quantity: i64,
    pub value: i64,
    pub warehouse: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub overview: Overview,
    pub warehouses: Vec<WarehouseUtilization>,
    pub recent_alerts: Vec<StockAlert>,
    pub top_products: Vec<TopProduct>,
}

#[derive(Debug, Serialize)]
pub struct StockAdjustment {
    pub item: InventoryItem,
    pub movement: StockMovement,
}

#[derive(Clone)]
pub struct InventoryService {
    repos: Repositories,
    events: EventBus,
}

impl InventoryService {
    pub fn new(repos: Repositories, events: EventBus) -> Self {
        Self { repos, events }
    }

    /// Totals are recomputed from the current items on every call.
    pub async fn dashboard(&self) -> Result<Dashboard> {
        let items = self.repos.items.list().await?;
        let alerts = self.repos.alerts.list().await?;
        let orders = self.repos.purchase_orders.list().await?;
        let warehouses = self.repos.warehouses.list().await?;

        let overview = Overview {
            total_stock: items.iter().fold(0_i64, |acc, i| acc.saturating_add(i.quantity)),
            total_value: items.iter().fold(0_i64, |acc, i| acc.saturating_add(i.total_value)),
            low_stock_items: items.iter().filter(|i| i.is_low_stock()).count(),
            out_of_stock_items: items.iter().filter(|i| i.is_out_of_stock()).count(),
            active_alerts: alerts.iter().filter(|a| !a.is_resolved).count(),
            pending_pos: orders.iter().filter(|o| o.status == PurchaseOrderStatus::Pending).count(),
        };

        let mut by_value: Vec<&InventoryItem> = items.iter().collect();
        by_value.sort_by(|a, b| b.total_value.cmp(&a.total_value));
        let top_products = by_value.into_iter().take(5).map(|i| TopProduct {
            name: i.product_name.clone(),
            sku: i.sku.to_string(),
            quantity: i.quantity,
            value: i.total_value,
            warehouse: i.warehouse_name.clone(),
        }).collect();

        Ok(Dashboard {
            overview,
            warehouses: warehouses.into_iter().map(|w| WarehouseUtilization {
                name: w.name, utilization: w.current_utilization, capacity: w.capacity, status: w.status,
            }).collect(),
            recent_alerts: alerts.into_iter().take(5).collect(),
            top_products,
        })
    }

    pub async fn items(&self, params: &InventoryParams) -> Result<Paginated<InventoryItem>> {
        let mut items = self.repos.items.list().await?;
        if let Some(wh) = params.warehouse_id.as_deref().filter(|w| !w.is_empty()) {
            items.retain(|i| i.warehouse_id == wh);
        }
        if let Some(q) = params.search.as_deref().filter(|q| !q.is_empty()) {
            let needle = q.to_lowercase();
            items.retain(|i| i.product_name.to_lowercase().contains(&needle) || i.sku.contains_ignore_case(q));
        }
        Ok(paginate(items, params.page, params.limit, 20))
    }

    pub async fn warehouses(&self) -> Result<Vec<Warehouse>> {
        self.repos.warehouses.list().await
    }

    pub async fn alerts(&self, params: &InventoryParams) -> Result<Vec<StockAlert>> {
        let kind: Option<AlertType> = parse_filter("type", params.alert_type.as_deref())?;
        let severity: Option<AlertSeverity> = parse_filter("severity", params.severity.as_deref())?;
        let mut alerts = self.repos.alerts.list().await?;
        alerts.retain(|a| kind.map_or(true, |k| a.kind == k) && severity.map_or(true, |s| a.severity == s));
        Ok(alerts)
    }

    pub async fn purchase_orders(&self, params: &InventoryParams) -> Result<Vec<PurchaseOrder>> {
        let status: Option<PurchaseOrderStatus> = parse_filter("status", params.status.as_deref())?;
        let mut orders = self.repos.purchase_orders.list().await?;
        orders.retain(|o| status.map_or(true, |s| o.status == s));
        Ok(orders)
    }

    pub async fn transfers(&self, params: &InventoryParams) -> Result<Vec<StockTransfer>> {
        let status: Option<TransferStatus> = parse_filter("status", params.status.as_deref())?;
        let mut transfers = self.repos.transfers.list().await?;
        transfers.retain(|t| status.map_or(true, |s| t.status == s));
        Ok(transfers)
    }

    pub async fn movements(&self, params: &InventoryParams) -> Result<Vec<StockMovement>> {
        let mut movements = self.repos.movements.list().await?;
        if let Some(item) = params.item_id.as_deref().filter(|i| !i.is_empty()) {
            movements.retain(|m| m.item_id == item);
        }
        Ok(movements)
    }

    pub async fn create_purchase_order(
        &self,
        supplier_id: String,
        warehouse_id: String,
        items: Vec<PurchaseOrderItem>,
        expected_delivery: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<PurchaseOrder> {
        if items.is_empty() {
            return Err(StoreError::Validation("purchase order needs at least one item".into()));
        }
        let warehouse = self.repos.warehouses.get(&warehouse_id).await?.ok_or(StoreError::NotFound("Warehouse"))?;
        let supplier_name = self.repos.items.list().await?
            .into_iter()
            .find(|i| i.supplier.id == supplier_id)
            .map(|i| i.supplier.name)
            .unwrap_or_else(|| supplier_id.clone());
        let sequence = self.repos.purchase_orders.count().await? + 1;
        let now = Utc::now();

        let order = PurchaseOrder {
            id: format!("po-{}", Uuid::now_v7().simple()),
            order_number: format!("PO-{}-{:03}", now.year(), sequence),
            supplier_id,
            supplier_name,
            warehouse_id,
            warehouse_name: warehouse.name,
            status: PurchaseOrderStatus::Draft,
            total_amount: PurchaseOrderItem::total(&items),
            items,
            order_date: now,
            expected_delivery,
            actual_delivery: None,
            notes,
            created_by: SYSTEM_USER.into(),
            approved_by: None,
        };
        let order = self.repos.purchase_orders.insert(order).await?;
        info!(order_number = %order.order_number, total = order.total_amount, "purchase order created");
        self.publish(InventoryEvent::PurchaseOrderCreated { purchase_order_id: order.id.clone(), total_amount: order.total_amount }).await;
        Ok(order)
    }

    pub async fn create_transfer(
        &self,
        from_warehouse_id: String,
        to_warehouse_id: String,
        items: Vec<TransferItem>,
        notes: Option<String>,
    ) -> Result<StockTransfer> {
        if from_warehouse_id == to_warehouse_id {
            return Err(StoreError::Validation("transfer source and destination must differ".into()));
        }
        let from = self.repos.warehouses.get(&from_warehouse_id).await?.ok_or(StoreError::NotFound("Warehouse"))?;
        let to = self.repos.warehouses.get(&to_warehouse_id).await?.ok_or(StoreError::NotFound("Warehouse"))?;
        let sequence = self.repos.transfers.count().await? + 1;
        let now = Utc::now();

        let transfer = StockTransfer {
            id: format!("tr-{}", Uuid::now_v7().simple()),
            transfer_number: format!("TR-{}-{:03}", now.year(), sequence),
            from_warehouse_id,
            from_warehouse_name: from.name,
            to_warehouse_id,
            to_warehouse_name: to.name,
            status: TransferStatus::Pending,
            items,
            requested_by: SYSTEM_USER.into(),
            approved_by: None,
            request_date: now,
            completed_date: None,
            tracking_number: None,
            notes,
        };
        let transfer = self.repos.transfers.insert(transfer).await?;
        info!(transfer_number = %transfer.transfer_number, "stock transfer requested");
        self.publish(InventoryEvent::TransferCreated { transfer_id: transfer.id.clone() }).await;
        Ok(transfer)
    }

    /// Applies a signed adjustment; stock never drops below zero.
    pub async fn adjust_stock(&self, item_id: &str, adjustment: i64, reason: String, notes: Option<String>) -> Result<StockAdjustment> {
        let mut change = None;
        let item = self.repos.items.update(item_id, &mut |i| change = Some(i.adjust(adjustment))).await?
            .ok_or(StoreError::NotFound("Item"))?;
        let (previous_quantity, new_quantity) = change.ok_or(StoreError::NotFound("Item"))??;

        let movement = StockMovement {
            id: format!("mov-{}", Uuid::now_v7().simple()),
            kind: MovementType::Adjustment,
            item_id: item.id.clone(),
            product_name: item.product_name.clone(),
            sku: item.sku.clone(),
            warehouse_id: item.warehouse_id.clone(),
            quantity: adjustment,
            previous_quantity,
            new_quantity,
            reason,
            reference: None,
            performed_by: SYSTEM_USER.into(),
            timestamp: Utc::now(),
            notes,
        };
        let movement = self.repos.movements.insert(movement).await?;
        info!(item_id, previous_quantity, new_quantity, "stock adjusted");
        self.publish(InventoryEvent::StockAdjusted { item_id: item.id.clone(), previous_quantity, new_quantity }).await;
        Ok(StockAdjustment { item, movement })
    }

    pub async fn resolve_alert(&self, alert_id: &str) -> Result<StockAlert> {
        let alert = self.repos.alerts.update(alert_id, &mut |a| a.resolve(SYSTEM_USER)).await?
            .ok_or(StoreError::NotFound("Alert"))?;
        self.publish(InventoryEvent::AlertResolved { alert_id: alert.id.clone() }).await;
        Ok(alert)
    }

    pub async fn update_reorder_level(&self, item_id: &str, level: i64) -> Result<InventoryItem> {
        if level < 0 {
            return Err(StoreError::Validation("reorder level cannot be negative".into()));
        }
        self.repos.items.update(item_id, &mut |i| i.set_reorder_level(level)).await?
            .ok_or(StoreError::NotFound("Item"))
    }

    pub async fn update_po_status(&self, id: &str, status: PurchaseOrderStatus) -> Result<PurchaseOrder> {
        self.repos.purchase_orders.update(id, &mut |o| o.status = status).await?
            .ok_or(StoreError::NotFound("Purchase order"))
    }

    pub async fn update_transfer_status(&self, id: &str, status: TransferStatus) -> Result<StockTransfer> {
        self.repos.transfers.update(id, &mut |t| t.set_status(status)).await?
            .ok_or(StoreError::NotFound("Transfer"))
    }

    async fn publish(&self, event: InventoryEvent) {
        self.events.publish(DomainEvent::Inventory(event)).await;
    }
}
