pub mod config;
pub mod sequence;
pub mod state;

pub use config::{ExperimentConfig, ExperimentMode};
pub use state::{ExperimentError, ExperimentEvent, ExperimentStateMachine, PhaseSnapshot};
