//! Domain types and models

pub mod availability;
pub mod group;

pub use availability::{
    AvailabilityMetadata, AvailabilityRequest, AvailabilityResponse, BusyInterval,
    CalendarCredential, CandidateSlot, ProviderKind,
};
pub use group::{
    Group, GroupStatus, Invitation, Membership, MembershipState, Suggestion, SweepReport,
    VoteChoice,
};
