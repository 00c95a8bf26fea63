//! REST API handlers for forecast requests, snapshot evaluation, and
//! operational endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use raffle_core::config::{CampaignBook, CampaignConfig, ForecastDefaults};
use raffle_core::{RaffleError, Snapshot};
use raffle_engine::{
    evaluate_health, evaluate_phase_health, forecast_campaign, Forecast, HealthStatus, PhaseHealth,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub book: Arc<CampaignBook>,
    pub defaults: ForecastDefaults,
    pub start_time: Instant,
}

/// Body of `POST /v1/forecast`. Only the headline numbers are required;
/// everything else comes from the configured default baselines.
#[derive(Debug, Deserialize)]
pub struct ForecastRequest {
    pub target_gmv: Option<f64>,
    pub aov_new: Option<f64>,
    pub budget: Option<f64>,
    pub duration_days: Option<u32>,
    /// Optional explicit CAC; when absent the LTV-derived value is used.
    pub target_cac: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub forecast: Forecast,
    /// Customers needed to hit the stated GMV target at the given AOV,
    /// alongside what the budget actually buys.
    pub orders_needed_for_target: f64,
    pub target_gmv: f64,
    pub gmv_gap: f64,
}

/// Validate a forecast request at the API boundary.
fn validate_forecast_request(
    request: &ForecastRequest,
) -> Result<(f64, f64, f64, u32), &'static str> {
    let target_gmv = request.target_gmv.ok_or("'target_gmv' is required")?;
    let aov_new = request.aov_new.ok_or("'aov_new' is required")?;
    let budget = request.budget.ok_or("'budget' is required")?;
    let duration_days = request.duration_days.ok_or("'duration_days' is required")?;

    if target_gmv <= 0.0 {
        return Err("'target_gmv' must be positive");
    }
    if aov_new <= 0.0 {
        return Err("'aov_new' must be positive");
    }
    if budget < 0.0 {
        return Err("'budget' must be non-negative");
    }
    if duration_days == 0 {
        return Err("'duration_days' must be positive");
    }
    Ok((target_gmv, aov_new, budget, duration_days))
}

/// POST /v1/forecast — ad-hoc forecast from headline numbers plus default
/// baselines.
pub async fn handle_forecast(
    State(state): State<AppState>,
    Json(request): Json<ForecastRequest>,
) -> Result<Json<ForecastResponse>, (StatusCode, Json<ErrorResponse>)> {
    let (target_gmv, aov_new, budget, duration_days) =
        match validate_forecast_request(&request) {
            Ok(fields) => fields,
            Err(msg) => {
                warn!(error = msg, "Forecast request validation failed");
                metrics::counter!("api.validation_errors").increment(1);
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: "invalid_forecast_request".to_string(),
                        message: msg.to_string(),
                    }),
                ));
            }
        };

    let d = &state.defaults;
    let config = CampaignConfig {
        id: "ad-hoc".to_string(),
        label: "Ad-hoc forecast".to_string(),
        duration_days: Some(duration_days),
        start_date: None,
        end_date: None,
        target_gmv,
        total_budget: budget,
        baseline_ltv: d.baseline_ltv,
        target_ltv_cac_ratio: d.target_ltv_cac_ratio,
        baseline_crr_20d: d.baseline_crr_20d,
        baseline_gmv_per_retained_20d: d.baseline_gmv_per_retained_20d,
        customer_base_size: d.customer_base_size,
        aov_new,
        aov_returning: d.aov_returning,
        budget_split_new: d.budget_split_new,
        target_cac_override: request.target_cac,
        target_cpa: None,
        phases: Vec::new(),
        ticket_phases: Vec::new(),
    };

    match forecast_campaign(&config) {
        Ok(forecast) => {
            metrics::counter!("api.forecasts").increment(1);
            let orders_needed_for_target = target_gmv / aov_new;
            let gmv_gap = target_gmv - forecast.gmv_total;
            Ok(Json(ForecastResponse {
                forecast,
                orders_needed_for_target,
                target_gmv,
                gmv_gap,
            }))
        }
        Err(e) => {
            error!(error = %e, "Forecast computation failed");
            metrics::counter!("api.errors").increment(1);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "forecast_failed".to_string(),
                    message: "Internal processing error".to_string(),
                }),
            ))
        }
    }
}

/// Body of `POST /v1/evaluate`: a configured campaign id plus a live
/// snapshot of its cumulative performance.
#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub campaign_id: String,
    pub snapshot: Snapshot,
}

/// POST /v1/evaluate — project a snapshot onto the campaign forecast and
/// return its health status.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<HealthStatus>, (StatusCode, Json<ErrorResponse>)> {
    let result = state
        .book
        .find(&request.campaign_id)
        .and_then(|campaign| {
            let forecast = forecast_campaign(campaign)?;
            evaluate_health(campaign, &forecast, &request.snapshot, &state.book.thresholds)
        });

    match result {
        Ok(health) => {
            metrics::counter!("api.evaluations").increment(1);
            Ok(Json(health))
        }
        Err(e @ RaffleError::UnknownCampaign(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "unknown_campaign".to_string(),
                message: e.to_string(),
            }),
        )),
        Err(e @ (RaffleError::DayOutOfRange { .. } | RaffleError::InvalidInput(_))) => {
            metrics::counter!("api.validation_errors").increment(1);
            Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "invalid_snapshot".to_string(),
                    message: e.to_string(),
                }),
            ))
        }
        Err(e) => {
            error!(error = %e, campaign_id = %request.campaign_id, "Evaluation failed");
            metrics::counter!("api.errors").increment(1);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "evaluation_failed".to_string(),
                    message: "Internal processing error".to_string(),
                }),
            ))
        }
    }
}

/// Body of `POST /v1/evaluate-phase`: one phase's cumulative snapshot plus
/// the campaign-cumulative stats used for the parallel roll-up.
#[derive(Debug, Deserialize)]
pub struct EvaluatePhaseRequest {
    pub campaign_id: String,
    pub phase_id: String,
    pub phase_snapshot: Snapshot,
    pub campaign_snapshot: Snapshot,
}

/// POST /v1/evaluate-phase — evaluate one phase of a campaign alongside the
/// campaign-level roll-up.
pub async fn handle_evaluate_phase(
    State(state): State<AppState>,
    Json(request): Json<EvaluatePhaseRequest>,
) -> Result<Json<PhaseHealth>, (StatusCode, Json<ErrorResponse>)> {
    let result = state.book.find(&request.campaign_id).and_then(|campaign| {
        let phase = campaign.find_phase(&request.phase_id)?;
        evaluate_phase_health(
            campaign,
            phase,
            &request.phase_snapshot,
            &request.campaign_snapshot,
            &state.book.thresholds,
        )
    });

    match result {
        Ok(health) => {
            metrics::counter!("api.phase_evaluations").increment(1);
            Ok(Json(health))
        }
        Err(e @ (RaffleError::UnknownCampaign(_) | RaffleError::UnknownPhase { .. })) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "unknown_campaign_or_phase".to_string(),
                message: e.to_string(),
            }),
        )),
        Err(e @ (RaffleError::DayOutOfRange { .. } | RaffleError::InvalidInput(_))) => {
            metrics::counter!("api.validation_errors").increment(1);
            Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "invalid_snapshot".to_string(),
                    message: e.to_string(),
                }),
            ))
        }
        Err(e) => {
            error!(error = %e, campaign_id = %request.campaign_id, "Phase evaluation failed");
            metrics::counter!("api.errors").increment(1);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "evaluation_failed".to_string(),
                    message: "Internal processing error".to_string(),
                }),
            ))
        }
    }
}

/// GET /health — Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        campaigns: state.book.campaigns.len(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /ready — Readiness probe.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.book.campaigns.is_empty() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

/// GET /live — Liveness probe.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub campaigns: usize,
    pub uptime_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_requires_all_headline_fields() {
        let request = ForecastRequest {
            target_gmv: Some(100_000.0),
            aov_new: Some(40.0),
            budget: None,
            duration_days: Some(20),
            target_cac: None,
        };
        assert!(validate_forecast_request(&request).is_err());
    }

    #[test]
    fn test_validation_rejects_non_positive_figures() {
        let request = ForecastRequest {
            target_gmv: Some(0.0),
            aov_new: Some(40.0),
            budget: Some(15_000.0),
            duration_days: Some(20),
            target_cac: None,
        };
        assert!(validate_forecast_request(&request).is_err());
    }

    #[test]
    fn test_validation_accepts_minimal_request() {
        let request = ForecastRequest {
            target_gmv: Some(100_000.0),
            aov_new: Some(40.0),
            budget: Some(15_000.0),
            duration_days: Some(20),
            target_cac: None,
        };
        let (gmv, aov, budget, days) = validate_forecast_request(&request).unwrap();
        assert_eq!((gmv, aov, budget, days), (100_000.0, 40.0, 15_000.0, 20));
    }
}
