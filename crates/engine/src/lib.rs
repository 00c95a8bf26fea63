//! Raffle forecasting and health evaluation — turns a campaign's baselines
//! into a forecast, projects live snapshots onto it, derives traffic-light
//! statuses per KPI, and allocates ticket-phase budgets.
//!
//! Every operation in this crate is a pure, synchronous computation over
//! immutable inputs; concurrent callers need no coordination.

pub mod allocation;
pub mod forecast;
pub mod health;
pub mod phase;
pub mod projection;
pub mod recommend;

pub use allocation::{
    allocate, AllocationResult, CacByIntensity, TicketCampaignParams, LIFECYCLE_CAC_TABLE,
    TICKET_CAC_TABLE,
};
pub use forecast::{forecast_campaign, Forecast};
pub use health::{evaluate_health, evaluate_phase_health, HealthStatus, PhaseHealth};
pub use phase::{plan_phase, PhasePlan};
pub use projection::{project, Projected};
