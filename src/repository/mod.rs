//! Repository abstraction over the storefront's records.
//!
//! Every collection is reached through an injected `Arc<dyn Repository<T>>`.
//! The in-memory implementation is the only backend; state resets on restart.

pub mod seed;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::aggregates::*;
use crate::{Result, StoreError};

/// A record addressable by its string id.
pub trait Entity: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
}

macro_rules! entity {
    ($($t:ty),* $(,)?) => {
        $(impl Entity for $t { fn id(&self) -> &str { &self.id } })*
    };
}

entity!(
    Warehouse, InventoryItem, StockAlert, PurchaseOrder, StockTransfer, StockMovement,
    AffiliateProfile, Commission, Payout, PromotionalContent, ReferralClick,
    ExperimentConfig, FeatureFlag,
);

#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// All records in insertion order.
    async fn list(&self) -> Result<Vec<T>>;
    async fn get(&self, id: &str) -> Result<Option<T>>;
    async fn insert(&self, item: T) -> Result<T>;
    /// Runs `apply` against the stored record and returns the updated copy.
    async fn update(&self, id: &str, apply: &mut (dyn for<'x> FnMut(&'x mut T) + Send)) -> Result<Option<T>>;

    async fn count(&self) -> Result<usize> {
        Ok(self.list().await?.len())
    }
}

pub struct InMemoryRepository<T> {
    items: RwLock<Vec<T>>,
}

impl<T: Entity> InMemoryRepository<T> {
    pub fn new() -> Self { Self::with_items(Vec::new()) }

    pub fn with_items(items: Vec<T>) -> Self {
        Self { items: RwLock::new(items) }
    }
}

impl<T: Entity> Default for InMemoryRepository<T> {
    fn default() -> Self { Self::new() }
}

#[async_trait]
impl<T: Entity> Repository<T> for InMemoryRepository<T> {
    async fn list(&self) -> Result<Vec<T>> {
        Ok(self.items.read().await.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<T>> {
        Ok(self.items.read().await.iter().find(|i| i.id() == id).cloned())
    }

    async fn insert(&self, item: T) -> Result<T> {
        let mut items = self.items.write().await;
        if items.iter().any(|i| i.id() == item.id()) {
            return Err(StoreError::Storage(format!("duplicate id {}", item.id())));
        }
        items.push(item.clone());
        Ok(item)
    }

    async fn update(&self, id: &str, apply: &mut (dyn for<'x> FnMut(&'x mut T) + Send)) -> Result<Option<T>> {
        let mut items = self.items.write().await;
        Ok(items.iter_mut().find(|i| i.id() == id).map(|item| {
            apply(item);
            item.clone()
        }))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.items.read().await.len())
    }
}

pub type Repo<T> = Arc<dyn Repository<T>>;

fn repo<T: Entity>(items: Vec<T>) -> Repo<T> {
    Arc::new(InMemoryRepository::with_items(items))
}

/// Every collection the service works with.
#[derive(Clone)]
pub struct Repositories {
    pub warehouses: Repo<Warehouse>,
    pub items: Repo<InventoryItem>,
    pub alerts: Repo<StockAlert>,
    pub purchase_orders: Repo<PurchaseOrder>,
    pub transfers: Repo<StockTransfer>,
    pub movements: Repo<StockMovement>,
    pub affiliates: Repo<AffiliateProfile>,
    pub commissions: Repo<Commission>,
    pub payouts: Repo<Payout>,
    pub promotions: Repo<PromotionalContent>,
    pub clicks: Repo<ReferralClick>,
    pub experiments: Repo<ExperimentConfig>,
    pub feature_flags: Repo<FeatureFlag>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            warehouses: repo(vec![]),
            items: repo(vec![]),
            alerts: repo(vec![]),
            purchase_orders: repo(vec![]),
            transfers: repo(vec![]),
            movements: repo(vec![]),
            affiliates: repo(vec![]),
            commissions: repo(vec![]),
            payouts: repo(vec![]),
            promotions: repo(vec![]),
            clicks: repo(vec![]),
            experiments: repo(vec![]),
            feature_flags: repo(vec![]),
        }
    }

    /// Repositories pre-loaded with the storefront's demo data.
    pub fn seeded() -> Result<Self> {
        let data = seed::SeedData::build()?;
        Ok(Self {
            warehouses: repo(data.warehouses),
            items: repo(data.items),
            alerts: repo(data.alerts),
            purchase_orders: repo(data.purchase_orders),
            transfers: repo(data.transfers),
            movements: repo(data.movements),
            affiliates: repo(data.affiliates),
            commissions: repo(data.commissions),
            payouts: repo(data.payouts),
            promotions: repo(data.promotions),
            clicks: repo(vec![]),
            experiments: repo(data.experiments),
            feature_flags: repo(data.feature_flags),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_rejects_duplicate_ids() {
        let repos = Repositories::seeded().unwrap();
        let existing = repos.items.get("inv-001").await.unwrap().unwrap();
        assert!(matches!(repos.items.insert(existing).await, Err(StoreError::Storage(_))));
    }

    #[tokio::test]
    async fn test_update_returns_modified_copy() {
        let repos = Repositories::seeded().unwrap();
        let updated = repos.items.update("inv-001", &mut |i| { let _ = i.adjust(-10); }).await.unwrap().unwrap();
        assert_eq!(updated.quantity, 35);
        assert_eq!(repos.items.get("inv-001").await.unwrap().unwrap().quantity, 35);
        assert!(repos.items.update("missing", &mut |_| {}).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_seeded_counts() {
        let repos = Repositories::seeded().unwrap();
        assert_eq!(repos.warehouses.count().await.unwrap(), 3);
        assert_eq!(repos.items.count().await.unwrap(), 3);
        assert_eq!(repos.affiliates.count().await.unwrap(), 2);
        assert_eq!(repos.commissions.count().await.unwrap(), 3);
        assert!(Repositories::in_memory().experiments.list().await.unwrap().is_empty());
    }
}
