//! CLI layer - Command-line interface
//!
//! Argument parsing, scenario loading, and output presentation for the
//! simulator and classifier commands.

pub mod app;
pub mod args;
pub mod presenter;
pub mod scenario;

// Re-exports
pub use app::{run_classify, run_simulation, SimulateOverrides};
pub use args::{Cli, Commands};
pub use presenter::Presenter;
pub use scenario::{load_scenario, Scenario, ScenarioError, ScenarioEvent, TimedEvent};
