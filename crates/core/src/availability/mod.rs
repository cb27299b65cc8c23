//! Availability computation
//!
//! Turns per-participant busy intervals into a ranked list of conflict-free
//! candidate slots. The engine orchestrates concurrent provider fetches
//! through the injected ports; slot generation itself is pure.

pub mod engine;
pub mod fingerprint;
pub mod ports;
pub mod slots;
