pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, CampaignConfig, EvaluationThresholds, PhaseConfig};
pub use error::{RaffleError, RaffleResult};
pub use types::{Snapshot, TrafficLight};
