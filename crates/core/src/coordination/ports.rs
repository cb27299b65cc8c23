//! Coordination port interfaces

use async_trait::async_trait;
use slotwise_domain::{Group, Result, Suggestion};
use uuid::Uuid;

/// Whole-aggregate group persistence.
///
/// The store is the single source of truth for group state; callers read the
/// aggregate, mutate it in memory, and save it back. Per-group serialization
/// of that read-modify-write cycle is the coordinator's job, not the store's.
#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn insert(&self, group: Group) -> Result<()>;
    async fn get(&self, group_id: Uuid) -> Result<Option<Group>>;
    async fn save(&self, group: Group) -> Result<()>;
    /// Removes the aggregate and everything it owns. Unknown ids are a no-op.
    async fn delete(&self, group_id: Uuid) -> Result<()>;
    /// Resolves which group an invitation belongs to.
    async fn find_by_invitation(&self, invitation_id: Uuid) -> Result<Option<Uuid>>;
    async fn list_ids(&self) -> Result<Vec<Uuid>>;
}

/// Outbound invitation delivery
///
/// Fire-and-forget from the coordinator's perspective: failures are logged
/// and never block or roll back group creation.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_invitation(
        &self,
        to_email: &str,
        group_name: &str,
        from_email: &str,
        join_link: &str,
    ) -> Result<()>;
}

/// Downstream consumer of unanimously accepted suggestions
///
/// Invoked exactly once per suggestion, on its first transition to
/// finalized. Hook failures are logged; the vote that triggered the
/// transition has already been persisted.
#[async_trait]
pub trait FinalizeHook: Send + Sync {
    async fn suggestion_finalized(&self, group: &Group, suggestion: &Suggestion) -> Result<()>;
}
