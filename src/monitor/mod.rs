pub mod classifier;
pub mod controller;
pub mod debounce;
mod loop_worker;
pub mod notifier;
pub mod state;

pub use controller::{MonitorController, MonitorSettings};
pub use state::{MonitorPhase, PostureStateMachine};
