pub mod tracker;

pub use tracker::{SessionTracker, TokenOutcome, TrackerError};
