//! Group coordinator
//!
//! Polling clients demand read-after-write consistency, so every mutation is
//! a locked read-modify-write of the whole aggregate: operations on the same
//! group are linearized through a per-group async lock while different groups
//! proceed independently. Derived values are recomputed from the aggregate on
//! every pass and never cached.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use slotwise_domain::{
    CalendarCredential, CoordinationConfig, Group, Membership, Result, SlotwiseError, Suggestion,
    SweepReport, VoteChoice,
};

use crate::coordination::ports::{FinalizeHook, GroupStore, Notifier};
use crate::quota::{OpKind, QuotaGuard};

/// Lazily created per-group locks; entries are removed when their group is
/// deleted or pruned.
#[derive(Default)]
struct GroupLocks {
    inner: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl GroupLocks {
    async fn lock_for(&self, group_id: Uuid) -> Arc<Mutex<()>> {
        Arc::clone(self.inner.lock().await.entry(group_id).or_default())
    }

    async fn forget(&self, group_id: Uuid) {
        self.inner.lock().await.remove(&group_id);
    }
}

/// Counters reported by one full expiry sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepTotals {
    /// Groups examined, whether or not anything changed.
    pub groups_examined: usize,
    pub invitations_removed: usize,
    pub memberships_removed: usize,
    pub groups_pruned: usize,
}

pub struct GroupCoordinator {
    store: Arc<dyn GroupStore>,
    notifier: Arc<dyn Notifier>,
    finalize_hook: Arc<dyn FinalizeHook>,
    quota: Arc<QuotaGuard>,
    settings: CoordinationConfig,
    locks: GroupLocks,
}

impl GroupCoordinator {
    pub fn new(
        store: Arc<dyn GroupStore>,
        notifier: Arc<dyn Notifier>,
        finalize_hook: Arc<dyn FinalizeHook>,
        quota: Arc<QuotaGuard>,
        settings: CoordinationConfig,
    ) -> Self {
        Self { store, notifier, finalize_hook, quota, settings, locks: GroupLocks::default() }
    }

    /// Creates the group with one invitation + membership per invitee as a
    /// single aggregate insert; partial creation is never observable.
    /// Notifications dispatch fire-and-forget after the write.
    #[instrument(skip(self, invitee_emails), fields(invitees = invitee_emails.len()))]
    pub async fn create_group(
        &self,
        creator_email: &str,
        group_name: &str,
        invitee_emails: Vec<String>,
    ) -> Result<Group> {
        let group_name = group_name.trim();
        if group_name.is_empty() {
            return Err(SlotwiseError::InvalidRequest(
                "group name must not be empty".to_string(),
            ));
        }
        let creator = normalize_email(creator_email);
        if creator.is_empty() {
            return Err(SlotwiseError::InvalidRequest(
                "creator email must not be empty".to_string(),
            ));
        }
        let invitees: Vec<String> = invitee_emails
            .iter()
            .map(|email| normalize_email(email))
            .filter(|email| !email.is_empty())
            .collect();
        if invitees.is_empty() {
            return Err(SlotwiseError::InvalidRequest(
                "at least one invitee is required".to_string(),
            ));
        }
        self.admit(OpKind::Write)?;

        let group = Group::create(creator, group_name.to_string(), invitees, Utc::now());
        self.store.insert(group.clone()).await?;
        info!(group_id = %group.id, invitations = group.invitations.len(), "group created");

        self.dispatch_invitations(&group);
        Ok(group)
    }

    fn dispatch_invitations(&self, group: &Group) {
        for invitation in &group.invitations {
            let Some(token) = group.membership(&invitation.email).map(|m| m.token.clone())
            else {
                continue;
            };
            let notifier = Arc::clone(&self.notifier);
            let to_email = invitation.email.clone();
            let group_name = group.group_name.clone();
            let from_email = invitation.from_email.clone();
            let join_link = format!("/join/{}?token={}", group.id, token);
            tokio::spawn(async move {
                if let Err(error) =
                    notifier.send_invitation(&to_email, &group_name, &from_email, &join_link).await
                {
                    warn!(%error, "invitation notification failed");
                }
            });
        }
    }

    /// Joins a group. Idempotent: a second join returns the existing
    /// membership without consuming quota or touching the store.
    pub async fn join_group(
        &self,
        group_id: Uuid,
        email: &str,
        credential: Option<CalendarCredential>,
    ) -> Result<Membership> {
        let email = normalize_email(email);
        let lock = self.locks.lock_for(group_id).await;
        let _guard = lock.lock().await;

        let mut group = self
            .store
            .get(group_id)
            .await?
            .ok_or_else(|| SlotwiseError::NotInvited(email.clone()))?;

        let Some(membership) = group.membership_mut(&email) else {
            return Err(SlotwiseError::NotInvited(email));
        };
        if membership.declined {
            return Err(SlotwiseError::NotInvited(email));
        }
        if membership.joined_at.is_some() {
            debug!(group_id = %group_id, "join repeated, keeping existing membership");
            return Ok(membership.clone());
        }
        self.admit(OpKind::Write)?;
        membership.joined_at = Some(Utc::now());
        membership.credential = credential;
        let joined = membership.clone();

        self.store.save(group).await?;
        info!(group_id = %group_id, "member joined");
        Ok(joined)
    }

    /// One-shot response to an invitation. Accepting performs the join side
    /// effect; declining marks the membership declined unless the member
    /// already joined through their token.
    pub async fn respond_invitation(&self, invitation_id: Uuid, accept: bool) -> Result<Group> {
        let group_id = self
            .store
            .find_by_invitation(invitation_id)
            .await?
            .ok_or_else(|| SlotwiseError::NotFound(format!("invitation {invitation_id}")))?;

        let lock = self.locks.lock_for(group_id).await;
        let _guard = lock.lock().await;

        let mut group = self
            .store
            .get(group_id)
            .await?
            .ok_or_else(|| SlotwiseError::NotFound(format!("group {group_id}")))?;

        let now = Utc::now();
        let email = {
            let invitation = group
                .invitation_mut(invitation_id)
                .ok_or_else(|| SlotwiseError::NotFound(format!("invitation {invitation_id}")))?;
            if invitation.responded_at.is_some() {
                return Err(SlotwiseError::AlreadyResponded(invitation_id.to_string()));
            }
            self.admit(OpKind::Write)?;
            invitation.responded_at = Some(now);
            invitation.accepted = accept;
            invitation.email.clone()
        };

        if let Some(membership) = group.membership_mut(&email) {
            if accept {
                if membership.joined_at.is_none() {
                    membership.joined_at = Some(now);
                }
            } else if membership.joined_at.is_none() {
                // Joined stays terminal even when the stale invitation is
                // declined afterwards.
                membership.declined = true;
            }
        }

        self.store.save(group.clone()).await?;
        info!(group_id = %group_id, accept, "invitation response recorded");
        Ok(group)
    }

    /// Proposes a meeting time. Only joined members may propose.
    pub async fn propose_slot(
        &self,
        group_id: Uuid,
        from_email: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        title: &str,
    ) -> Result<Uuid> {
        if end <= start {
            return Err(SlotwiseError::InvalidRequest(
                "suggestion end must be after start".to_string(),
            ));
        }
        let title = title.trim();
        if title.is_empty() {
            return Err(SlotwiseError::InvalidRequest(
                "suggestion title must not be empty".to_string(),
            ));
        }
        let from_email = normalize_email(from_email);

        let lock = self.locks.lock_for(group_id).await;
        let _guard = lock.lock().await;

        let mut group = self
            .store
            .get(group_id)
            .await?
            .ok_or_else(|| SlotwiseError::NotFound(format!("group {group_id}")))?;
        if !group.is_joined(&from_email) {
            return Err(SlotwiseError::NotJoined(from_email));
        }
        self.admit(OpKind::Write)?;

        let suggestion = Suggestion {
            id: Uuid::new_v4(),
            group_id,
            from_email,
            start,
            end,
            title: title.to_string(),
            votes: HashMap::new(),
            finalized: false,
        };
        let suggestion_id = suggestion.id;
        group.suggestions.push(suggestion);
        self.store.save(group).await?;
        debug!(group_id = %group_id, suggestion_id = %suggestion_id, "slot proposed");
        Ok(suggestion_id)
    }

    /// Upserts one member's vote and recomputes finalization against the
    /// members joined right now. Returns true when this vote finalized the
    /// suggestion; the finalize hook fires after the group lock is released.
    pub async fn vote_slot(
        &self,
        group_id: Uuid,
        suggestion_id: Uuid,
        email: &str,
        choice: VoteChoice,
    ) -> Result<bool> {
        let email = normalize_email(email);

        let event = {
            let lock = self.locks.lock_for(group_id).await;
            let _guard = lock.lock().await;

            let mut group = self
                .store
                .get(group_id)
                .await?
                .ok_or_else(|| SlotwiseError::NotFound(format!("group {group_id}")))?;
            if !group.is_joined(&email) {
                return Err(SlotwiseError::NotJoined(email));
            }

            let joined = group.joined_emails();
            let suggestion = group
                .suggestion_mut(suggestion_id)
                .ok_or_else(|| SlotwiseError::NotFound(format!("suggestion {suggestion_id}")))?;
            if suggestion.finalized {
                return Err(SlotwiseError::SuggestionFinalized(suggestion_id.to_string()));
            }
            self.admit(OpKind::Write)?;
            suggestion.votes.insert(email, choice);
            let newly_finalized = suggestion.unanimously_accepted(&joined);
            if newly_finalized {
                suggestion.finalized = true;
            }
            let snapshot = suggestion.clone();
            self.store.save(group.clone()).await?;
            newly_finalized.then_some((group, snapshot))
        };

        let Some((group, suggestion)) = event else {
            return Ok(false);
        };
        info!(group_id = %group_id, suggestion_id = %suggestion_id, "suggestion finalized");
        if let Err(error) = self.finalize_hook.suggestion_finalized(&group, &suggestion).await {
            warn!(%error, "suggestion finalize hook failed");
        }
        Ok(true)
    }

    /// Current aggregate for polling clients.
    pub async fn group_status(&self, group_id: Uuid) -> Result<Group> {
        self.admit(OpKind::Read)?;
        self.store
            .get(group_id)
            .await?
            .ok_or_else(|| SlotwiseError::NotFound(format!("group {group_id}")))
    }

    pub async fn list_suggestions(&self, group_id: Uuid) -> Result<Vec<Suggestion>> {
        self.admit(OpKind::Read)?;
        let group = self
            .store
            .get(group_id)
            .await?
            .ok_or_else(|| SlotwiseError::NotFound(format!("group {group_id}")))?;
        Ok(group.suggestions)
    }

    /// Erases the whole aggregate. Idempotent: unknown ids succeed.
    pub async fn delete_group(&self, group_id: Uuid) -> Result<()> {
        self.admit(OpKind::Write)?;
        let lock = self.locks.lock_for(group_id).await;
        {
            let _guard = lock.lock().await;
            self.store.delete(group_id).await?;
        }
        self.locks.forget(group_id).await;
        info!(group_id = %group_id, "group deleted");
        Ok(())
    }

    /// One pass over every group: drop expired invitations and the orphaned
    /// memberships they leave, then prune groups with nothing left alive.
    ///
    /// Stops early when the write quota runs out; whatever remains is picked
    /// up by the next scheduled run.
    #[instrument(skip(self))]
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<SweepTotals> {
        let ttl_days = self.settings.invitation_ttl_days;
        let mut totals = SweepTotals::default();

        for group_id in self.store.list_ids().await? {
            let lock = self.locks.lock_for(group_id).await;
            let _guard = lock.lock().await;

            let Some(mut group) = self.store.get(group_id).await? else {
                continue;
            };
            totals.groups_examined += 1;

            let report = group.sweep_expired(now, ttl_days);
            let prune = !group.has_active_memberships();
            if !prune && report == SweepReport::default() {
                continue;
            }
            if !self.quota.admit(OpKind::Write) {
                warn!(
                    groups_examined = totals.groups_examined,
                    "write quota exhausted, stopping sweep early"
                );
                break;
            }
            totals.invitations_removed += report.expired_invitations;
            totals.memberships_removed += report.dropped_memberships;
            if prune {
                self.store.delete(group_id).await?;
                drop(_guard);
                self.locks.forget(group_id).await;
                totals.groups_pruned += 1;
            } else {
                self.store.save(group).await?;
            }
        }

        if totals != SweepTotals::default() {
            info!(
                groups_examined = totals.groups_examined,
                invitations_removed = totals.invitations_removed,
                memberships_removed = totals.memberships_removed,
                groups_pruned = totals.groups_pruned,
                "expiry sweep complete"
            );
        }
        Ok(totals)
    }

    fn admit(&self, op: OpKind) -> Result<()> {
        if self.quota.admit(op) {
            Ok(())
        } else {
            Err(SlotwiseError::QuotaExhausted(format!(
                "daily {} ceiling reached",
                op.label()
            )))
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
