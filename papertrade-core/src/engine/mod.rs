//! The simulator engine: cash ledger, order lifecycle, trigger evaluation,
//! and trade statistics.

pub mod simulator;
pub mod stats;

pub use simulator::{Simulator, SimulatorError, SimulatorSnapshot, DEFAULT_INITIAL_BALANCE};
pub use stats::TradeStatistics;
