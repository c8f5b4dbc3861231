//! Application layer - Use cases and port interfaces
//!
//! Contains the aggregator, the continuity controller, the serialized
//! engine, and trait definitions for external system interactions.

pub mod aggregator;
pub mod controller;
pub mod engine;
pub mod ports;

// Re-export use cases
pub use aggregator::{ActivityChange, CallActivityAggregator};
pub use controller::ContinuityController;
pub use engine::{
    Engine, EngineError, EngineEvent, EngineHandle, QueryPurpose, TimerEvent, TokioDispatcher,
};
