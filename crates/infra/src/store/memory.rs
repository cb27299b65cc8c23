//! In-memory group store
//!
//! Backing map plus an invitation-id index so `find_by_invitation` stays a
//! lookup instead of a scan. Both live under one lock; the coordinator
//! serializes writers per group, so contention here is short and read-heavy.

use std::collections::HashMap;

use async_trait::async_trait;
use slotwise_core::GroupStore;
use slotwise_domain::{Group, Result, SlotwiseError};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    groups: HashMap<Uuid, Group>,
    invitations: HashMap<Uuid, Uuid>,
}

impl Inner {
    /// Drops index entries for the group and re-adds the ones it still has.
    /// Sweeps remove expired invitations, so the index shrinks over time.
    fn reindex(&mut self, group: &Group) {
        self.invitations.retain(|_, group_id| *group_id != group.id);
        for invitation in &group.invitations {
            self.invitations.insert(invitation.id, group.id);
        }
    }
}

/// Volatile `GroupStore` backed by a `HashMap`. State does not survive a
/// restart.
#[derive(Default)]
pub struct MemoryGroupStore {
    inner: RwLock<Inner>,
}

impl MemoryGroupStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GroupStore for MemoryGroupStore {
    async fn insert(&self, group: Group) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.groups.contains_key(&group.id) {
            return Err(SlotwiseError::Storage(format!("group {} already exists", group.id)));
        }
        inner.reindex(&group);
        inner.groups.insert(group.id, group);
        Ok(())
    }

    async fn get(&self, group_id: Uuid) -> Result<Option<Group>> {
        Ok(self.inner.read().await.groups.get(&group_id).cloned())
    }

    async fn save(&self, group: Group) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.groups.contains_key(&group.id) {
            return Err(SlotwiseError::NotFound(format!("group {} is not stored", group.id)));
        }
        inner.reindex(&group);
        inner.groups.insert(group.id, group);
        Ok(())
    }

    async fn delete(&self, group_id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.groups.remove(&group_id);
        inner.invitations.retain(|_, indexed| *indexed != group_id);
        Ok(())
    }

    async fn find_by_invitation(&self, invitation_id: Uuid) -> Result<Option<Uuid>> {
        Ok(self.inner.read().await.invitations.get(&invitation_id).copied())
    }

    async fn list_ids(&self) -> Result<Vec<Uuid>> {
        Ok(self.inner.read().await.groups.keys().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn sample_group() -> Group {
        Group::create(
            "creator@example.com".to_string(),
            "standup".to_string(),
            vec!["ada@example.com".to_string(), "bob@example.com".to_string()],
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let store = MemoryGroupStore::new();
        let group = sample_group();
        let id = group.id;

        store.insert(group).await.unwrap();
        let found = store.get(id).await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.memberships.len(), 2);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_id() {
        let store = MemoryGroupStore::new();
        let group = sample_group();

        store.insert(group.clone()).await.unwrap();
        assert!(matches!(store.insert(group).await, Err(SlotwiseError::Storage(_))));
    }

    #[tokio::test]
    async fn save_requires_existing_group() {
        let store = MemoryGroupStore::new();
        assert!(matches!(store.save(sample_group()).await, Err(SlotwiseError::NotFound(_))));
    }

    #[tokio::test]
    async fn invitations_resolve_to_their_group() {
        let store = MemoryGroupStore::new();
        let group = sample_group();
        let group_id = group.id;
        let invitation_id = group.invitations[0].id;

        store.insert(group).await.unwrap();
        assert_eq!(store.find_by_invitation(invitation_id).await.unwrap(), Some(group_id));
        assert_eq!(store.find_by_invitation(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn save_drops_index_entries_for_removed_invitations() {
        let store = MemoryGroupStore::new();
        let mut group = sample_group();
        let invitation_id = group.invitations[0].id;
        store.insert(group.clone()).await.unwrap();

        group.invitations.clear();
        store.save(group).await.unwrap();

        assert_eq!(store.find_by_invitation(invitation_id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_removes_group_and_index() {
        let store = MemoryGroupStore::new();
        let group = sample_group();
        let group_id = group.id;
        let invitation_id = group.invitations[0].id;
        store.insert(group).await.unwrap();

        store.delete(group_id).await.unwrap();
        store.delete(group_id).await.unwrap();

        assert!(store.get(group_id).await.unwrap().is_none());
        assert_eq!(store.find_by_invitation(invitation_id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_ids_returns_every_stored_group() {
        let store = MemoryGroupStore::new();
        let a = sample_group();
        let b = sample_group();
        let (id_a, id_b) = (a.id, b.id);

        store.insert(a).await.unwrap();
        store.insert(b).await.unwrap();

        let mut ids = store.list_ids().await.unwrap();
        ids.sort();
        let mut expected = vec![id_a, id_b];
        expected.sort();
        assert_eq!(ids, expected);
    }
}
