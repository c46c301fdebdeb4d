//! Server-side persistence of experiment assignments.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::aggregates::ExperimentAssignment;
use crate::Result;

/// Assignments are keyed by experiment and bucketing identity (user id when
/// known, otherwise session id).
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn get(&self, experiment_id: &str, identity: &str) -> Result<Option<ExperimentAssignment>>;
    /// Stores the assignment unless one already exists; returns the stored one.
    async fn put_if_absent(&self, identity: &str, assignment: ExperimentAssignment) -> Result<ExperimentAssignment>;
    async fn update(
        &self,
        experiment_id: &str,
        identity: &str,
        apply: &mut (dyn for<'x> FnMut(&'x mut ExperimentAssignment) + Send),
    ) -> Result<Option<ExperimentAssignment>>;
    async fn list(&self, experiment_id: &str) -> Result<Vec<ExperimentAssignment>>;
}

#[derive(Default)]
pub struct InMemoryAssignmentStore {
    entries: RwLock<HashMap<(String, String), ExperimentAssignment>>,
}

impl InMemoryAssignmentStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl AssignmentStore for InMemoryAssignmentStore {
    async fn get(&self, experiment_id: &str, identity: &str) -> Result<Option<ExperimentAssignment>> {
        let entries = self.entries.read().await;
        Ok(entries.get(&(experiment_id.to_string(), identity.to_string())).cloned())
    }

    async fn put_if_absent(&self, identity: &str, assignment: ExperimentAssignment) -> Result<ExperimentAssignment> {
        let mut entries = self.entries.write().await;
        let key = (assignment.experiment_id.clone(), identity.to_string());
        Ok(entries.entry(key).or_insert(assignment).clone())
    }

    async fn update(
        &self,
        experiment_id: &str,
        identity: &str,
        apply: &mut (dyn for<'x> FnMut(&'x mut ExperimentAssignment) + Send),
    ) -> Result<Option<ExperimentAssignment>> {
        let mut entries = self.entries.write().await;
        Ok(entries.get_mut(&(experiment_id.to_string(), identity.to_string())).map(|a| {
            apply(a);
            a.clone()
        }))
    }

    async fn list(&self, experiment_id: &str) -> Result<Vec<ExperimentAssignment>> {
        let entries = self.entries.read().await;
        let mut found: Vec<_> = entries.values().filter(|a| a.experiment_id == experiment_id).cloned().collect();
        found.sort_by_key(|a| a.assigned_at);
        Ok(found)
    }
}
