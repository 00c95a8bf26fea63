//! Phase planner — derives the expected customer/order split for a single
//! phase from its budget and targets, independent of time.

use raffle_core::config::PhaseConfig;
use serde::Serialize;

/// Planned outcome for one phase. Counts are rounded to the nearest integer
/// for presentation; the underlying ratios are computed in floating point.
#[derive(Debug, Clone, Serialize)]
pub struct PhasePlan {
    pub phase_id: String,
    pub planned_new_users: u64,
    pub planned_orders: u64,
    /// Order volume not explained by one-order-per-new-user, attributed to
    /// returning customers. Never negative.
    pub planned_returning_orders: u64,
}

/// Plan a single phase. Pure and stateless.
pub fn plan_phase(phase: &PhaseConfig) -> PhasePlan {
    let new_users = if phase.target_cac > 0.0 {
        phase.budget / phase.target_cac
    } else {
        0.0
    };
    let orders = if phase.expected_aov > 0.0 {
        phase.target_gmv / phase.expected_aov
    } else {
        0.0
    };
    // The subtraction runs on the unrounded values so the rounded outputs
    // stay mutually consistent.
    let returning_orders = (orders - new_users).max(0.0);

    PhasePlan {
        phase_id: phase.id.clone(),
        planned_new_users: new_users.round() as u64,
        planned_orders: orders.round() as u64,
        planned_returning_orders: returning_orders.round() as u64,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
