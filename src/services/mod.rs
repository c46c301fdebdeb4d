//! Business logic behind the storefront APIs. Nothing here knows about HTTP.

pub mod affiliate;
pub mod inventory;
pub mod rum;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::{Result, StoreError};

pub use affiliate::AffiliateService;
pub use inventory::InventoryService;
pub use rum::RumService;

pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    #[serde(skip)]
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub total_pages: u32,
}

/// 1-based pagination; `page` is clamped to at least 1 and `limit` to `1..=100`.
pub fn paginate<T>(items: Vec<T>, page: Option<u32>, limit: Option<u32>, default_limit: u32) -> Paginated<T> {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE);
    let total = items.len();
    let total_pages = total.div_ceil(limit as usize) as u32;
    let start = (page as usize - 1).saturating_mul(limit as usize);
    let items = items.into_iter().skip(start).take(limit as usize).collect();
    Paginated { items, total, page, total_pages }
}

/// Decodes an `{"action": ...}` body. An action outside `known` is
/// [`StoreError::InvalidAction`]; a known action with a bad body is a
/// validation error.
pub fn parse_action<T: DeserializeOwned>(body: Value, known: &[&str]) -> Result<T> {
    let action = body.get("action").and_then(Value::as_str).unwrap_or_default();
    if !known.contains(&action) {
        return Err(StoreError::InvalidAction);
    }
    serde_json::from_value(body).map_err(|e| StoreError::Validation(e.to_string()))
}

/// Parses a query-string filter into one of the closed status enums.
pub fn parse_filter<T: DeserializeOwned>(name: &str, raw: Option<&str>) -> Result<Option<T>> {
    match raw.filter(|r| !r.is_empty()) {
        None => Ok(None),
        Some(r) => serde_json::from_value(Value::String(r.to_string()))
            .map(Some)
            .map_err(|_| StoreError::Validation(format!("unknown {name} '{r}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::PurchaseOrderStatus;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_paginate_slices_and_counts_pages() {
        let p = paginate((1..=45).collect::<Vec<_>>(), Some(3), Some(20), 20);
        assert_eq!(p.items, vec![41, 42, 43, 44, 45]);
        assert_eq!(p.total, 45);
        assert_eq!(p.total_pages, 3);

        let p = paginate((1..=5).collect::<Vec<_>>(), Some(0), Some(0), 20);
        assert_eq!(p.page, 1);
        assert_eq!(p.items, vec![1]);

        let empty = paginate(Vec::<u8>::new(), None, None, 10);
        assert_eq!(empty.total_pages, 0);
    }

    #[derive(Debug, Deserialize)]
    #[serde(tag = "action", rename_all = "kebab-case")]
    enum Cmd { DoThing { n: u32 } }

    #[test]
    fn test_parse_action_distinguishes_unknown_from_malformed() {
        assert!(matches!(parse_action::<Cmd>(json!({"action": "nope"}), &["do-thing"]), Err(StoreError::InvalidAction)));
        assert!(matches!(parse_action::<Cmd>(json!({}), &["do-thing"]), Err(StoreError::InvalidAction)));
        assert!(matches!(parse_action::<Cmd>(json!({"action": "do-thing"}), &["do-thing"]), Err(StoreError::Validation(_))));
        assert!(matches!(parse_action::<Cmd>(json!({"action": "do-thing", "n": 2}), &["do-thing"]), Ok(Cmd::DoThing { n: 2 })));
    }

    #[test]
    fn test_parse_filter_rejects_unknown_status() {
        assert_eq!(parse_filter::<PurchaseOrderStatus>("status", Some("pending")).unwrap(), Some(PurchaseOrderStatus::Pending));
        assert_eq!(parse_filter::<PurchaseOrderStatus>("status", None).unwrap(), None);
        assert!(parse_filter::<PurchaseOrderStatus>("status", Some("lost")).is_err());
    }
}
