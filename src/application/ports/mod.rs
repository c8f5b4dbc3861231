//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod dispatcher;
pub mod host;
pub mod monitors;

// Re-export common types
pub use dispatcher::Dispatcher;
pub use host::HostChannel;
pub use monitors::{
    AudioActivityProbe, AudioMonitor, EventSink, SubscribeError, SubscriptionGuard,
    TelephonyMonitor,
};
