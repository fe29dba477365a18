pub mod reports;
pub mod simulation;

pub use simulation::{SimulationConfig, SimulationResult, run_simulation};
