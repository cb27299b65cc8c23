//! Group coordination aggregate
//!
//! A `Group` exclusively owns its memberships, invitations, and suggestions;
//! the whole aggregate is cascade-deleted with the group. Group status and
//! suggestion finalization are derived from current state, never stored
//! independently.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::availability::CalendarCredential;
use crate::impl_status_conversions;

/// A member's vote on a suggested time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Accepted,
    Declined,
}

impl_status_conversions!(VoteChoice {
    Accepted => "accepted",
    Declined => "declined",
});

/// Group lifecycle status, derived from memberships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    Forming,
    AllJoined,
    Abandoned,
}

impl_status_conversions!(GroupStatus {
    Forming => "forming",
    AllJoined => "all_joined",
    Abandoned => "abandoned",
});

/// Membership state, derived from the joined/declined fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipState {
    Invited,
    Joined,
    Declined,
}

impl_status_conversions!(MembershipState {
    Invited => "invited",
    Joined => "joined",
    Declined => "declined",
});

/// One invited participant. Unique per (group, email).
///
/// Transitions `Invited -> Joined` or `Invited -> Declined`, both terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub email: String,
    pub token: String,
    pub joined_at: Option<DateTime<Utc>>,
    pub declined: bool,
    /// Calendar credential registered at join time; never serialized out.
    #[serde(skip_serializing, default)]
    pub credential: Option<CalendarCredential>,
}

impl Membership {
    fn invited(email: String) -> Self {
        Self {
            email,
            token: Uuid::new_v4().simple().to_string(),
            joined_at: None,
            declined: false,
            credential: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> MembershipState {
        if self.declined {
            MembershipState::Declined
        } else if self.joined_at.is_some() {
            MembershipState::Joined
        } else {
            MembershipState::Invited
        }
    }
}

/// An invitation to join a group.
///
/// Responding is a one-shot transition; unresponded invitations expire after
/// a fixed TTL and are purged by the sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    pub id: Uuid,
    pub group_id: Uuid,
    pub email: String,
    pub from_email: String,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub accepted: bool,
}

impl Invitation {
    /// True once the TTL has elapsed without a response.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, ttl_days: i64) -> bool {
        self.responded_at.is_none() && now - self.created_at > Duration::days(ttl_days)
    }
}

/// A proposed meeting time with accumulated votes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: Uuid,
    pub group_id: Uuid,
    pub from_email: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub title: String,
    pub votes: HashMap<String, VoteChoice>,
    pub finalized: bool,
}

impl Suggestion {
    /// True iff every joined member has voted `accepted`.
    ///
    /// Recomputed against current membership on every vote; a member who
    /// joined after earlier votes blocks finalization until they vote too.
    #[must_use]
    pub fn unanimously_accepted(&self, joined_emails: &[String]) -> bool {
        !joined_emails.is_empty()
            && joined_emails
                .iter()
                .all(|email| self.votes.get(email) == Some(&VoteChoice::Accepted))
    }
}

/// Counts reported by one expiry sweep over a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired_invitations: usize,
    pub dropped_memberships: usize,
}

/// The group aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub creator_email: String,
    pub group_name: String,
    pub created_at: DateTime<Utc>,
    pub memberships: Vec<Membership>,
    pub invitations: Vec<Invitation>,
    pub suggestions: Vec<Suggestion>,
}

impl Group {
    /// Builds the aggregate with one Invitation + Membership per invitee.
    ///
    /// Duplicate invitee emails collapse to a single membership.
    #[must_use]
    pub fn create(
        creator_email: String,
        group_name: String,
        invitee_emails: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let id = Uuid::new_v4();
        let mut memberships: Vec<Membership> = Vec::new();
        let mut invitations: Vec<Invitation> = Vec::new();
        for email in invitee_emails {
            if memberships.iter().any(|m| m.email == email) {
                continue;
            }
            invitations.push(Invitation {
                id: Uuid::new_v4(),
                group_id: id,
                email: email.clone(),
                from_email: creator_email.clone(),
                created_at: now,
                responded_at: None,
                accepted: false,
            });
            memberships.push(Membership::invited(email));
        }
        Self {
            id,
            creator_email,
            group_name,
            created_at: now,
            memberships,
            invitations,
            suggestions: Vec::new(),
        }
    }

    /// Derived group status.
    ///
    /// `AllJoined` iff every non-declined membership has joined;
    /// `Abandoned` once no non-declined membership remains.
    #[must_use]
    pub fn status(&self) -> GroupStatus {
        if self.memberships.is_empty() {
            return GroupStatus::Forming;
        }
        let mut any_active = false;
        let mut all_joined = true;
        for membership in &self.memberships {
            if membership.declined {
                continue;
            }
            any_active = true;
            if membership.joined_at.is_none() {
                all_joined = false;
            }
        }
        if !any_active {
            GroupStatus::Abandoned
        } else if all_joined {
            GroupStatus::AllJoined
        } else {
            GroupStatus::Forming
        }
    }

    #[must_use]
    pub fn membership(&self, email: &str) -> Option<&Membership> {
        self.memberships.iter().find(|m| m.email == email)
    }

    pub fn membership_mut(&mut self, email: &str) -> Option<&mut Membership> {
        self.memberships.iter_mut().find(|m| m.email == email)
    }

    #[must_use]
    pub fn is_joined(&self, email: &str) -> bool {
        self.membership(email).is_some_and(|m| m.joined_at.is_some())
    }

    /// Emails of all currently-joined members.
    #[must_use]
    pub fn joined_emails(&self) -> Vec<String> {
        self.memberships
            .iter()
            .filter(|m| m.joined_at.is_some())
            .map(|m| m.email.clone())
            .collect()
    }

    pub fn invitation_mut(&mut self, invitation_id: Uuid) -> Option<&mut Invitation> {
        self.invitations.iter_mut().find(|i| i.id == invitation_id)
    }

    #[must_use]
    pub fn suggestion(&self, suggestion_id: Uuid) -> Option<&Suggestion> {
        self.suggestions.iter().find(|s| s.id == suggestion_id)
    }

    pub fn suggestion_mut(&mut self, suggestion_id: Uuid) -> Option<&mut Suggestion> {
        self.suggestions.iter_mut().find(|s| s.id == suggestion_id)
    }

    /// Purges expired invitations and the never-joined memberships they
    /// leave behind.
    pub fn sweep_expired(&mut self, now: DateTime<Utc>, ttl_days: i64) -> SweepReport {
        let invitations_before = self.invitations.len();
        self.invitations.retain(|i| !i.is_expired(now, ttl_days));

        let memberships_before = self.memberships.len();
        let invitations = &self.invitations;
        self.memberships.retain(|m| {
            m.joined_at.is_some()
                || m.declined
                || invitations.iter().any(|i| i.email == m.email && i.responded_at.is_none())
        });

        SweepReport {
            expired_invitations: invitations_before - self.invitations.len(),
            dropped_memberships: memberships_before - self.memberships.len(),
        }
    }

    /// True while anyone has joined or an invitation is still awaiting a
    /// response. Groups where this is false are pruned by the sweep.
    #[must_use]
    pub fn has_active_memberships(&self) -> bool {
        self.memberships.iter().any(|m| m.joined_at.is_some() && !m.declined)
            || self.invitations.iter().any(|i| i.responded_at.is_none())
    }
}
