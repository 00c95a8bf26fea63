//! Snapshot projection — linear extrapolation of cumulative metrics from
//! day `k` of a period to its end.

use raffle_core::{RaffleError, RaffleResult, Snapshot};
use serde::Serialize;

/// End-of-period values extrapolated from a snapshot at constant run-rate.
#[derive(Debug, Clone, Serialize)]
pub struct Projected {
    /// `duration / day`; exactly 1.0 when the snapshot is at period end.
    pub multiplier: f64,
    pub gmv: f64,
    pub spend: f64,
    pub acquisition_spend: f64,
    pub new_customers: f64,
    pub returning_customers: f64,
    pub orders: f64,
}

/// Extrapolate every cumulative metric to end-of-period, assuming a constant
/// run-rate: `m * (duration / day)`.
///
/// The snapshot day must lie in `[1, duration_days]`. Day 0 is rejected as
/// invalid input, not treated as a division guard.
pub fn project(snapshot: &Snapshot, duration_days: u32) -> RaffleResult<Projected> {
    if snapshot.day == 0 || snapshot.day > duration_days {
        return Err(RaffleError::DayOutOfRange {
            day: snapshot.day,
            duration_days,
        });
    }

    let multiplier = duration_days as f64 / snapshot.day as f64;

    Ok(Projected {
        multiplier,
        gmv: snapshot.gmv * multiplier,
        spend: snapshot.spend * multiplier,
        acquisition_spend: snapshot.acquisition_spend() * multiplier,
        new_customers: snapshot.new_customers as f64 * multiplier,
        returning_customers: snapshot.returning_customers as f64 * multiplier,
        orders: snapshot.orders as f64 * multiplier,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(day: u32) -> Snapshot {
        Snapshot {
            day,
            gmv: 10_000.0,
            spend: 2_000.0,
            new_customers: 100,
            returning_customers: 60,
            orders: 250,
            acquisition_spend: Some(1_500.0),
        }
    }

    #[test]
    fn test_midpoint_projection_doubles() {
        let projected = project(&snapshot(10), 20).unwrap();

        assert!((projected.multiplier - 2.0).abs() < f64::EPSILON);
        assert!((projected.gmv - 20_000.0).abs() < f64::EPSILON);
        assert!((projected.spend - 4_000.0).abs() < f64::EPSILON);
        assert!((projected.acquisition_spend - 3_000.0).abs() < f64::EPSILON);
        assert!((projected.new_customers - 200.0).abs() < f64::EPSILON);
        assert!((projected.orders - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_period_end_projection_is_identity() {
        let snap = snapshot(20);
        let projected = project(&snap, 20).unwrap();

        assert!((projected.multiplier - 1.0).abs() < f64::EPSILON);
        assert!((projected.gmv - snap.gmv).abs() < f64::EPSILON);
    }

    #[test]
    fn test_day_zero_is_rejected() {
        let err = project(&snapshot(0), 20).unwrap_err();
        assert!(matches!(
            err,
            RaffleError::DayOutOfRange {
                day: 0,
                duration_days: 20
            }
        ));
    }

    #[test]
    fn test_day_past_period_end_is_rejected() {
        let err = project(&snapshot(21), 20).unwrap_err();
        assert!(matches!(err, RaffleError::DayOutOfRange { day: 21, .. }));
    }

    #[test]
    fn test_acquisition_spend_falls_back_to_total_spend() {
        let snap = Snapshot {
            acquisition_spend: None,
            ..snapshot(10)
        };
        let projected = project(&snap, 20).unwrap();
        assert!((projected.acquisition_spend - projected.spend).abs() < f64::EPSILON);
    }
}
