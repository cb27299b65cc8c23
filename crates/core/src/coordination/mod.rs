//! Group coordination
//!
//! The coordinator owns every group mutation: creation, joins, invitation
//! responses, suggestions, votes, and the expiry sweep. Derived state
//! (`AllJoined`, `finalized`) lives in the domain aggregate; persistence,
//! notification, and finalize delivery go through ports.

pub mod coordinator;
pub mod ports;
