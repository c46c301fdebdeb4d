//! `/api/inventory` handlers.

use axum::extract::State;
use serde_json::{json, Value};

use super::{data, done, message, page, ApiJson, ApiQuery, ApiResult, AppState};
use crate::services::inventory::{InventoryCommand, InventoryParams, InventoryUpdate};
use crate::services::parse_action;
use crate::StoreError;

pub async fn query(State(s): State<AppState>, ApiQuery(p): ApiQuery<InventoryParams>) -> ApiResult {
    let svc = &s.inventory;
    Ok(match p.action.as_deref().unwrap_or("dashboard") {
        "dashboard" => data(svc.dashboard().await?),
        "inventory" => page("items", svc.items(&p).await?),
        "warehouses" => data(json!({ "warehouses": svc.warehouses().await? })),
        "alerts" => data(json!({ "alerts": svc.alerts(&p).await? })),
        "purchase-orders" => data(json!({ "purchaseOrders": svc.purchase_orders(&p).await? })),
        "transfers" => data(json!({ "transfers": svc.transfers(&p).await? })),
        "movements" => data(json!({ "movements": svc.movements(&p).await? })),
        _ => return Err(StoreError::InvalidAction.into()),
    })
}

pub async fn command(State(s): State<AppState>, ApiJson(body): ApiJson<Value>) -> ApiResult {
    let svc = &s.inventory;
    Ok(match parse_action(body, InventoryCommand::ACTIONS)? {
        InventoryCommand::CreatePurchaseOrder { supplier_id, warehouse_id, items, expected_delivery, notes } => {
            let order = svc.create_purchase_order(supplier_id, warehouse_id, items, expected_delivery, notes).await?;
            done("Purchase order created successfully", order)
        }
        InventoryCommand::CreateTransfer { from_warehouse_id, to_warehouse_id, transfer_items, request_notes } => {
            let transfer = svc.create_transfer(from_warehouse_id, to_warehouse_id, transfer_items, request_notes).await?;
            done("Stock transfer request created successfully", transfer)
        }
        InventoryCommand::AdjustStock { item_id, adjustment, reason, adjustment_notes } => {
            let adjusted = svc.adjust_stock(&item_id, adjustment, reason, adjustment_notes).await?;
            done("Stock adjustment completed successfully", adjusted)
        }
        InventoryCommand::ResolveAlert { alert_id, .. } => {
            svc.resolve_alert(&alert_id).await?;
            message("Alert resolved successfully")
        }
    })
}

pub async fn update(State(s): State<AppState>, ApiJson(body): ApiJson<Value>) -> ApiResult {
    let svc = &s.inventory;
    Ok(match parse_action(body, InventoryUpdate::ACTIONS)? {
        InventoryUpdate::UpdateReorderLevel { id, new_reorder_level } => {
            done("Reorder level updated successfully", svc.update_reorder_level(&id, new_reorder_level).await?)
        }
        InventoryUpdate::UpdatePoStatus { id, status } => {
            svc.update_po_status(&id, status).await?;
            message("Purchase order status updated successfully")
        }
        InventoryUpdate::UpdateTransferStatus { id, transfer_status } => {
            svc.update_transfer_status(&id, transfer_status).await?;
            message("Transfer status updated successfully")
        }
    })
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{app, call};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_dashboard_is_default_and_stable() {
        let app = app();
        let (status, first) = call(&app, Method::GET, "/api/inventory", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["success"], true);
        assert_eq!(first["data"]["overview"]["totalStock"], 68);
        let (_, second) = call(&app, Method::GET, "/api/inventory?action=dashboard", None).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_listing_is_paginated() {
        let (status, body) = call(&app(), Method::GET, "/api/inventory?action=inventory&page=1&limit=2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"]["total"], 3);
        assert_eq!(body["data"]["totalPages"], 2);
    }

    #[tokio::test]
    async fn test_adjust_stock_updates_value() {
        let app = app();
        let (status, body) = call(&app, Method::POST, "/api/inventory", Some(json!({
            "action": "adjust-stock", "itemId": "inv-001", "adjustment": -10, "reason": "Damaged"
        }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Stock adjustment completed successfully");
        assert_eq!(body["data"]["item"]["quantity"], 35);
        assert_eq!(body["data"]["item"]["totalValue"], 42000);
        assert_eq!(body["data"]["movement"]["previousQuantity"], 45);
    }

    #[tokio::test]
    async fn test_overflowing_adjustment_is_rejected_and_dashboard_survives() {
        let app = app();
        let (status, body) = call(&app, Method::POST, "/api/inventory", Some(json!({
            "action": "adjust-stock", "itemId": "inv-001", "adjustment": i64::MAX, "reason": "Recount"
        }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("stock quantity"));

        let (status, body) = call(&app, Method::GET, "/api/inventory?action=dashboard", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["overview"]["totalStock"], 68);
    }

    #[tokio::test]
    async fn test_errors_use_api_shape() {
        let app = app();
        let (status, body) = call(&app, Method::GET, "/api/inventory?action=explode", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid action");

        let (status, body) = call(&app, Method::POST, "/api/inventory", Some(json!({
            "action": "resolve-alert", "alertId": "alert-999"
        }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Alert not found");

        let (status, _) = call(&app, Method::GET, "/api/inventory?action=alerts&severity=apocalyptic", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_patch_po_status() {
        let (status, body) = call(&app(), Method::PATCH, "/api/inventory", Some(json!({
            "action": "update-po-status", "id": "po-002", "status": "approved"
        }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Purchase order status updated successfully");
        assert!(body.get("data").is_none());
    }
}
