// Order execution and cycle orchestration
pub mod position_manager;
pub mod scheduler;

pub use position_manager::PositionManager;
pub use scheduler::{CycleError, CyclePhase, CycleScheduler};
