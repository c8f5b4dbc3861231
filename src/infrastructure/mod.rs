//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces: scripted
//! event sources for simulation and testing, and the channel-backed
//! bridge to a host application.

pub mod host_bridge;
pub mod scripted;

// Re-export adapters
pub use host_bridge::{HostCommand, HostEndpoint, MpscHostChannel, StateQuery};
pub use scripted::{
    ObservedCommand, ScriptedAudioEvent, ScriptedAudioMonitor, ScriptedHost,
    ScriptedTelephonyMonitor, TimelineAudioProbe,
};
