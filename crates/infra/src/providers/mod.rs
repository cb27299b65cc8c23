//! Calendar provider clients and the busy-interval source adapter

pub mod adapter;
pub mod detect;
pub mod google;
pub mod microsoft;

pub use adapter::CalendarBusySource;
pub use detect::detect_provider;
pub use google::GoogleBusyClient;
pub use microsoft::MicrosoftBusyClient;
