//! Shared value types exchanged between the engine and its callers.

use serde::{Deserialize, Serialize};

/// A point-in-time observation of actual campaign (or phase) performance.
///
/// All metrics are cumulative from the start of the period being evaluated.
/// The engine never stores snapshots; each one lives for a single call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current day index, 1-based, within the period being evaluated.
    pub day: u32,
    pub gmv: f64,
    pub spend: f64,
    pub new_customers: u64,
    pub returning_customers: u64,
    pub orders: u64,
    /// Spend attributable to new-customer acquisition. Falls back to the
    /// total `spend` when not tracked separately.
    #[serde(default)]
    pub acquisition_spend: Option<f64>,
}

impl Snapshot {
    /// Resolve the acquisition-spend fallback once, at the start of an
    /// evaluation, rather than at each use site.
    pub fn acquisition_spend(&self) -> f64 {
        self.acquisition_spend.unwrap_or(self.spend)
    }
}

/// Three-level ordinal health status. `Red < Amber < Green`, so the worst
/// of a set of statuses is simply the minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficLight {
    Red,
    Amber,
    Green,
}

impl TrafficLight {
    /// Roll two statuses up to the worse of the pair.
    pub fn worst(self, other: TrafficLight) -> TrafficLight {
        self.min(other)
    }
}
