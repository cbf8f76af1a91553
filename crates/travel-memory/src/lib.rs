use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::RwLock;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend failure: {0}")]
    Backend(String),
}

/// A generated plan kept around so the dashboard can offer it for download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPlan {
    pub id: Uuid,
    pub file_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl SavedPlan {
    pub fn new<F: Into<String>, C: Into<String>>(file_name: F, content: C) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name: file_name.into(),
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

pub trait PlanStore: Send + Sync + std::fmt::Debug {
    fn put(&self, plan: SavedPlan) -> Result<(), StoreError>;
    fn get(&self, id: &Uuid) -> Result<Option<SavedPlan>, StoreError>;
    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

/// Keeps the most recent `capacity` plans; older ones are evicted first.
#[derive(Debug)]
pub struct InMemoryPlanStore {
    capacity: usize,
    inner: RwLock<VecDeque<SavedPlan>>,
}

impl InMemoryPlanStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: RwLock::new(VecDeque::new()),
        }
    }
}

impl PlanStore for InMemoryPlanStore {
    fn put(&self, plan: SavedPlan) -> Result<(), StoreError> {
        let mut plans = self
            .inner
            .write()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        plans.retain(|existing| existing.id != plan.id);
        while plans.len() >= self.capacity {
            plans.pop_front();
        }
        plans.push_back(plan);
        Ok(())
    }

    fn get(&self, id: &Uuid) -> Result<Option<SavedPlan>, StoreError> {
        Ok(self
            .inner
            .read()
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .iter()
            .find(|plan| &plan.id == id)
            .cloned())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self
            .inner
            .read()
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_fetches_by_id() {
        let store = InMemoryPlanStore::new(4);
        assert!(store.is_empty().unwrap());
        let plan = SavedPlan::new("travel_plan_Paris_Pro.txt", "<h1>Paris</h1>");
        let id = plan.id;
        store.put(plan.clone()).unwrap();
        assert_eq!(store.get(&id).unwrap(), Some(plan));
        assert_eq!(store.get(&Uuid::new_v4()).unwrap(), None);
    }

    #[test]
    fn evicts_oldest_when_full() {
        let store = InMemoryPlanStore::new(2);
        let first = SavedPlan::new("a.txt", "a");
        let second = SavedPlan::new("b.txt", "b");
        let third = SavedPlan::new("c.txt", "c");
        let first_id = first.id;
        let third_id = third.id;
        store.put(first).unwrap();
        store.put(second).unwrap();
        store.put(third).unwrap();
        assert_eq!(store.len().unwrap(), 2);
        assert!(store.get(&first_id).unwrap().is_none());
        assert!(store.get(&third_id).unwrap().is_some());
    }

    #[test]
    fn zero_capacity_still_keeps_latest_plan() {
        let store = InMemoryPlanStore::new(0);
        let plan = SavedPlan::new("a.txt", "a");
        let id = plan.id;
        store.put(plan).unwrap();
        assert!(store.get(&id).unwrap().is_some());
    }
}
