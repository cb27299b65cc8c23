//! Group storage implementations

pub mod memory;

pub use memory::MemoryGroupStore;
