//! Ticket-phase budget allocation — computes a raw budget per phase from a
//! nominal CAC-by-intensity table, then rescales so the phase budgets sum
//! to the declared campaign budget.

use chrono::{DateTime, Utc};
use raffle_core::config::{SpendIntensity, TicketPhaseConfig};
use raffle_core::{RaffleError, RaffleResult};
use serde::Serialize;

/// Nominal CAC per declared spend intensity. Injected into [`allocate`] so
/// callers (and tests) can substitute alternate tables without touching any
/// global state.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacByIntensity {
    pub none: f64,
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl CacByIntensity {
    pub fn cac_for(&self, intensity: SpendIntensity) -> f64 {
        match intensity {
            SpendIntensity::None => self.none,
            SpendIntensity::Low => self.low,
            SpendIntensity::Medium => self.medium,
            SpendIntensity::High => self.high,
        }
    }
}

/// Table used by the ticket-raffle campaign type.
///
/// NOTE: this disagrees with [`LIFECYCLE_CAC_TABLE`] on the high tier (25
/// vs 20). Which value is authoritative has never been settled; both tables
/// are kept and the caller picks per campaign type.
pub const TICKET_CAC_TABLE: CacByIntensity = CacByIntensity {
    none: 0.0,
    low: 10.0,
    medium: 15.0,
    high: 25.0,
};

/// Table used by the four-stage lifecycle planner. See the note on
/// [`TICKET_CAC_TABLE`].
pub const LIFECYCLE_CAC_TABLE: CacByIntensity = CacByIntensity {
    none: 0.0,
    low: 10.0,
    medium: 15.0,
    high: 20.0,
};

/// Campaign-level inputs for the allocator.
#[derive(Debug, Clone)]
pub struct TicketCampaignParams {
    pub target_gmv_total: f64,
    /// Campaign average order value, shared across phases.
    pub aov: f64,
    pub budget_total: f64,
}

/// Allocation output for a single phase.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseAllocation {
    pub phase_id: String,
    pub label: String,
    pub tickets_target: u64,
    pub target_gmv: f64,
    /// `target_gmv / tickets_target`; 0 for an organic phase with no
    /// ticket target.
    pub ticket_price: f64,
    pub orders_target: f64,
    pub cac_nominal: f64,
    /// Budget before rescaling. Never used verbatim downstream.
    pub budget_raw: f64,
    pub budget_final: f64,
    /// `budget_final / orders_target`; 0 when there are no orders to buy.
    pub cac_effective: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AllocationResult {
    pub phases: Vec<PhaseAllocation>,
    pub tickets_total: u64,
    pub gmv_total: f64,
    pub orders_total: f64,
    pub budget_total: f64,
    pub cac_effective: f64,
    pub computed_at: DateTime<Utc>,
}

/// Allocate the campaign budget across ticket phases.
///
/// Two passes: first a raw budget per phase (nominal CAC x orders target),
/// then a rescale so the final budgets sum exactly to
/// `params.budget_total`, preserving each phase's relative spend intensity.
/// When every phase is organic (raw sum <= 0) all final budgets and
/// effective CACs are exactly 0 and no scaling is attempted.
pub fn allocate(
    params: &TicketCampaignParams,
    phases: &[TicketPhaseConfig],
    table: &CacByIntensity,
) -> RaffleResult<AllocationResult> {
    if params.target_gmv_total <= 0.0 {
        return Err(RaffleError::InvalidInput(
            "total target GMV must be positive".to_string(),
        ));
    }
    if params.aov <= 0.0 {
        return Err(RaffleError::InvalidInput(
            "campaign AOV must be positive".to_string(),
        ));
    }
    if params.budget_total <= 0.0 {
        return Err(RaffleError::InvalidInput(
            "total budget must be positive".to_string(),
        ));
    }

    // Pass 1: raw budgets at nominal CAC.
    let mut allocations: Vec<PhaseAllocation> = phases
        .iter()
        .map(|phase| {
            let ticket_price = if phase.tickets_target > 0 {
                phase.target_gmv / phase.tickets_target as f64
            } else {
                0.0
            };
            let orders_target = phase.target_gmv / params.aov;
            let cac_nominal = table.cac_for(phase.intensity);
            let budget_raw = cac_nominal * orders_target;
            PhaseAllocation {
                phase_id: phase.id.clone(),
                label: phase.label.clone(),
                tickets_target: phase.tickets_target,
                target_gmv: phase.target_gmv,
                ticket_price,
                orders_target,
                cac_nominal,
                budget_raw,
                budget_final: 0.0,
                cac_effective: 0.0,
            }
        })
        .collect();

    // Pass 2: normalize so the final budgets sum to the declared total.
    let raw_sum: f64 = allocations.iter().map(|a| a.budget_raw).sum();
    if raw_sum > 0.0 {
        let scale = params.budget_total / raw_sum;
        for alloc in &mut allocations {
            alloc.budget_final = alloc.budget_raw * scale;
            alloc.cac_effective = if alloc.orders_target > 0.0 {
                alloc.budget_final / alloc.orders_target
            } else {
                0.0
            };
        }
    }

    let tickets_total = allocations.iter().map(|a| a.tickets_target).sum();
    let gmv_total = allocations.iter().map(|a| a.target_gmv).sum();
    let orders_total: f64 = allocations.iter().map(|a| a.orders_target).sum();
    let budget_total: f64 = allocations.iter().map(|a| a.budget_final).sum();
    let cac_effective = if orders_total > 0.0 {
        budget_total / orders_total
    } else {
        0.0
    };

    tracing::debug!(
        phases = allocations.len(),
        budget_total,
        cac_effective,
        "Ticket-phase budget allocated"
    );

    Ok(AllocationResult {
        phases: allocations,
        tickets_total,
        gmv_total,
        orders_total,
        budget_total,
        cac_effective,
        computed_at: Utc::now(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(id: &str, tickets: u64, gmv: f64, intensity: SpendIntensity) -> TicketPhaseConfig {
        TicketPhaseConfig {
            id: id.to_string(),
            label: id.to_string(),
            tickets_target: tickets,
            target_gmv: gmv,
            intensity,
        }
    }

    fn params() -> TicketCampaignParams {
        TicketCampaignParams {
            target_gmv_total: 100_000.0,
            aov: 40.0,
            budget_total: 15_000.0,
        }
    }

    // 1. Rescaling invariant -------------------------------------------------

    #[test]
    fn test_final_budgets_sum_to_declared_total() {
        let phases = vec![
            phase("teaser", 2_000, 20_000.0, SpendIntensity::Low),
            phase("main", 5_000, 60_000.0, SpendIntensity::High),
            phase("last-call", 2_000, 20_000.0, SpendIntensity::Medium),
        ];
        let result = allocate(&params(), &phases, &TICKET_CAC_TABLE).unwrap();

        let sum: f64 = result.phases.iter().map(|p| p.budget_final).sum();
        let relative = (sum - 15_000.0).abs() / 15_000.0;
        assert!(relative < 1e-6, "sum {} deviates from total", sum);
        assert!((result.budget_total - 15_000.0).abs() / 15_000.0 < 1e-6);
    }

    #[test]
    fn test_relative_intensity_preserved() {
        let phases = vec![
            phase("a", 1_000, 20_000.0, SpendIntensity::Low),
            phase("b", 1_000, 20_000.0, SpendIntensity::High),
        ];
        let result = allocate(&params(), &phases, &TICKET_CAC_TABLE).unwrap();

        // Same orders target, so the budget ratio equals the CAC ratio
        // (25 / 10) regardless of the absolute scale.
        let ratio = result.phases[1].budget_final / result.phases[0].budget_final;
        assert!((ratio - 2.5).abs() < 1e-9);
    }

    // 2. Per-phase arithmetic ------------------------------------------------

    #[test]
    fn test_ticket_price_and_orders_target() {
        let phases = vec![phase("main", 5_000, 60_000.0, SpendIntensity::High)];
        let result = allocate(&params(), &phases, &TICKET_CAC_TABLE).unwrap();

        let main = &result.phases[0];
        assert!((main.ticket_price - 12.0).abs() < f64::EPSILON);
        assert!((main.orders_target - 1_500.0).abs() < f64::EPSILON);
        assert!((main.cac_nominal - 25.0).abs() < f64::EPSILON);
        assert!((main.budget_raw - 37_500.0).abs() < f64::EPSILON);
        // Only phase, so it absorbs the whole budget.
        assert!((main.budget_final - 15_000.0).abs() < 1e-9);
        assert!((main.cac_effective - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_tickets_target_gives_zero_ticket_price() {
        let phases = vec![phase("organic", 0, 10_000.0, SpendIntensity::Low)];
        let result = allocate(&params(), &phases, &TICKET_CAC_TABLE).unwrap();
        assert_eq!(result.phases[0].ticket_price, 0.0);
    }

    // 3. All-organic campaign ------------------------------------------------

    #[test]
    fn test_all_none_intensity_yields_exact_zeros() {
        let phases = vec![
            phase("a", 1_000, 20_000.0, SpendIntensity::None),
            phase("b", 2_000, 30_000.0, SpendIntensity::None),
        ];
        let result = allocate(&params(), &phases, &TICKET_CAC_TABLE).unwrap();

        for p in &result.phases {
            assert_eq!(p.budget_final, 0.0);
            assert_eq!(p.cac_effective, 0.0);
        }
        assert_eq!(result.budget_total, 0.0);
        assert_eq!(result.cac_effective, 0.0);
    }

    // 4. Input validation ----------------------------------------------------

    #[test]
    fn test_non_positive_campaign_params_are_rejected() {
        let phases = vec![phase("a", 1_000, 20_000.0, SpendIntensity::Low)];

        for bad in [
            TicketCampaignParams {
                target_gmv_total: 0.0,
                ..params()
            },
            TicketCampaignParams {
                aov: -1.0,
                ..params()
            },
            TicketCampaignParams {
                budget_total: 0.0,
                ..params()
            },
        ] {
            assert!(matches!(
                allocate(&bad, &phases, &TICKET_CAC_TABLE),
                Err(RaffleError::InvalidInput(_))
            ));
        }
    }

    // 5. Table injection -----------------------------------------------------

    #[test]
    fn test_alternate_table_changes_nominal_cac_only() {
        let phases = vec![phase("main", 5_000, 60_000.0, SpendIntensity::High)];

        let ticket = allocate(&params(), &phases, &TICKET_CAC_TABLE).unwrap();
        let lifecycle = allocate(&params(), &phases, &LIFECYCLE_CAC_TABLE).unwrap();

        assert!((ticket.phases[0].cac_nominal - 25.0).abs() < f64::EPSILON);
        assert!((lifecycle.phases[0].cac_nominal - 20.0).abs() < f64::EPSILON);
        // A single phase still absorbs the full budget under either table.
        assert!((ticket.phases[0].budget_final - lifecycle.phases[0].budget_final).abs() < 1e-9);
    }

    #[test]
    fn test_aggregates() {
        let phases = vec![
            phase("a", 1_000, 20_000.0, SpendIntensity::Low),
            phase("b", 3_000, 60_000.0, SpendIntensity::Medium),
        ];
        let result = allocate(&params(), &phases, &TICKET_CAC_TABLE).unwrap();

        assert_eq!(result.tickets_total, 4_000);
        assert!((result.gmv_total - 80_000.0).abs() < f64::EPSILON);
        assert!((result.orders_total - 2_000.0).abs() < f64::EPSILON);
        assert!((result.cac_effective - 15_000.0 / 2_000.0).abs() < 1e-9);
    }
}
