//! Callguard - recording continuity across telephony activity
//!
//! Fuses call, audio-route, and interruption events into pause and resume
//! decisions for a host recorder, so a recording never captures a phone
//! call and never stays paused once the call is over.
//!
//! The crate follows a hexagonal architecture:
//! - `domain`: events, call-activity state machine, classification rules
//! - `application`: the serialized engine, aggregator, controller, ports
//! - `infrastructure`: scripted event sources and the host bridge
//! - `cli`: the simulator and classifier commands

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
