//! Application and campaign configuration.
//!
//! Runtime settings come from environment variables with the prefix
//! `RAFFLE_PULSE__`; campaign definitions come from a TOML file. A campaigns
//! file with no `[[campaigns]]` section is a fatal load error — the engine
//! trusts every numeric field it receives, so nothing may be silently
//! defaulted away at this boundary.

use crate::error::{RaffleError, RaffleResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Runtime configuration
// ---------------------------------------------------------------------------

/// Root application configuration. Loaded from environment variables with
/// the prefix `RAFFLE_PULSE__`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_campaigns_file")]
    pub campaigns_file: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub forecast_defaults: ForecastDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Baselines applied by the HTTP forecast endpoint when a request supplies
/// only the headline numbers (target GMV, AOV, budget, duration).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastDefaults {
    #[serde(default = "default_baseline_ltv")]
    pub baseline_ltv: f64,
    #[serde(default = "default_ltv_cac_ratio")]
    pub target_ltv_cac_ratio: f64,
    #[serde(default = "default_crr_20d")]
    pub baseline_crr_20d: f64,
    #[serde(default = "default_gmv_per_retained_20d")]
    pub baseline_gmv_per_retained_20d: f64,
    #[serde(default = "default_customer_base_size")]
    pub customer_base_size: u64,
    #[serde(default = "default_aov_returning")]
    pub aov_returning: f64,
    #[serde(default = "default_budget_split_new")]
    pub budget_split_new: f64,
}

// Default functions
fn default_campaigns_file() -> String {
    "campaigns.toml".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_baseline_ltv() -> f64 {
    90.0
}
fn default_ltv_cac_ratio() -> f64 {
    5.0
}
fn default_crr_20d() -> f64 {
    0.12
}
fn default_gmv_per_retained_20d() -> f64 {
    25.0
}
fn default_customer_base_size() -> u64 {
    10_000
}
fn default_aov_returning() -> f64 {
    35.0
}
fn default_budget_split_new() -> f64 {
    0.75
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

impl Default for ForecastDefaults {
    fn default() -> Self {
        Self {
            baseline_ltv: default_baseline_ltv(),
            target_ltv_cac_ratio: default_ltv_cac_ratio(),
            baseline_crr_20d: default_crr_20d(),
            baseline_gmv_per_retained_20d: default_gmv_per_retained_20d(),
            customer_base_size: default_customer_base_size(),
            aov_returning: default_aov_returning(),
            budget_split_new: default_budget_split_new(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            campaigns_file: default_campaigns_file(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            forecast_defaults: ForecastDefaults::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("RAFFLE_PULSE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

// ---------------------------------------------------------------------------
// Campaign definitions
// ---------------------------------------------------------------------------

/// One time-boxed sales campaign (a "raffle") with its acquisition and
/// retention baselines. Constructed once from configuration input and
/// treated as immutable for the duration of one evaluation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignConfig {
    pub id: String,
    #[serde(default)]
    pub label: String,

    /// Explicit duration in days. When absent, the inclusive span of
    /// `start_date..=end_date` is used instead.
    #[serde(default)]
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,

    pub target_gmv: f64,
    pub total_budget: f64,

    // Acquisition / retention baselines.
    pub baseline_ltv: f64,
    pub target_ltv_cac_ratio: f64,
    /// Retention rate observed over the 20-day reference window.
    pub baseline_crr_20d: f64,
    /// GMV per retained customer over the 20-day reference window.
    pub baseline_gmv_per_retained_20d: f64,
    pub customer_base_size: u64,

    pub aov_new: f64,
    pub aov_returning: f64,

    /// Fraction of the total budget allocated to new-customer acquisition;
    /// the remainder goes to retention.
    pub budget_split_new: f64,

    /// Explicit target CAC. Takes precedence over the LTV-derived value.
    #[serde(default)]
    pub target_cac_override: Option<f64>,
    /// Baseline cost-per-order target. When absent, CPA health is reported
    /// as a neutral AMBER rather than pass/fail.
    #[serde(default)]
    pub target_cpa: Option<f64>,

    #[serde(default)]
    pub phases: Vec<PhaseConfig>,
    #[serde(default)]
    pub ticket_phases: Vec<TicketPhaseConfig>,
}

impl CampaignConfig {
    /// Resolve the campaign duration. Explicit `duration_days` wins; else
    /// the inclusive day count between start and end dates
    /// (`floor(end - start) + 1`).
    pub fn duration_days(&self) -> RaffleResult<u32> {
        if let Some(days) = self.duration_days {
            return Ok(days);
        }
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if end >= start => {
                Ok((end - start).num_days() as u32 + 1)
            }
            (Some(_), Some(_)) => Err(RaffleError::Config(format!(
                "campaign '{}': end_date precedes start_date",
                self.id
            ))),
            _ => Err(RaffleError::MissingSchedule(self.id.clone())),
        }
    }

    /// Target CAC for new customers: the explicit override when present,
    /// otherwise `baseline_ltv / target_ltv_cac_ratio`.
    pub fn target_cac(&self) -> f64 {
        match self.target_cac_override {
            Some(cac) => cac,
            None => {
                if self.target_ltv_cac_ratio > 0.0 {
                    self.baseline_ltv / self.target_ltv_cac_ratio
                } else {
                    0.0
                }
            }
        }
    }

    pub fn find_phase(&self, phase_id: &str) -> RaffleResult<&PhaseConfig> {
        self.phases
            .iter()
            .find(|p| p.id == phase_id)
            .ok_or_else(|| RaffleError::UnknownPhase {
                campaign: self.id.clone(),
                phase: phase_id.to_string(),
            })
    }

    /// Check the structural invariants the engine's math relies on.
    pub fn validate(&self) -> RaffleResult<()> {
        let duration = self.duration_days()?;
        if duration == 0 {
            return Err(RaffleError::Config(format!(
                "campaign '{}': duration must be a positive number of days",
                self.id
            )));
        }
        if !(0.0..=1.0).contains(&self.budget_split_new) {
            return Err(RaffleError::Config(format!(
                "campaign '{}': budget_split_new must be in [0, 1]",
                self.id
            )));
        }
        for (field, value) in [
            ("target_gmv", self.target_gmv),
            ("total_budget", self.total_budget),
            ("baseline_ltv", self.baseline_ltv),
            ("baseline_crr_20d", self.baseline_crr_20d),
            ("baseline_gmv_per_retained_20d", self.baseline_gmv_per_retained_20d),
            ("aov_new", self.aov_new),
            ("aov_returning", self.aov_returning),
        ] {
            if value < 0.0 {
                return Err(RaffleError::Config(format!(
                    "campaign '{}': {} must be non-negative",
                    self.id, field
                )));
            }
        }
        for phase in &self.phases {
            if phase.start_day == 0 || phase.start_day > phase.end_day {
                return Err(RaffleError::Config(format!(
                    "campaign '{}': phase '{}' has an invalid day range {}..={}",
                    self.id, phase.id, phase.start_day, phase.end_day
                )));
            }
        }
        Ok(())
    }
}

/// One of an ordered, non-overlapping sequence of sub-periods within a
/// campaign. Day ranges are 1-based and inclusive; contiguous phases are
/// expected to cover `1..=duration_days`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseConfig {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub start_day: u32,
    pub end_day: u32,
    pub target_gmv: f64,
    pub target_cac: f64,
    pub expected_aov: f64,
    pub budget: f64,
}

impl PhaseConfig {
    /// Inclusive length of the phase window in days.
    pub fn duration_days(&self) -> u32 {
        self.end_day - self.start_day + 1
    }
}

/// Ticket-phase input for the budget allocator: a phase described by its
/// ticket and GMV targets plus a declared spend intensity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketPhaseConfig {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub tickets_target: u64,
    pub target_gmv: f64,
    pub intensity: SpendIntensity,
}

/// Declared marketing intensity for a ticket phase, mapped to a nominal CAC
/// by an injected lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpendIntensity {
    None,
    Low,
    #[serde(alias = "normal")]
    Medium,
    High,
}

// ---------------------------------------------------------------------------
// Evaluation thresholds
// ---------------------------------------------------------------------------

/// Ratio cutoffs for traffic-light derivation. Progress thresholds are
/// "at least this fraction of target pace"; overrun thresholds are "at most
/// this multiple of the cost target".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationThresholds {
    #[serde(default = "default_gmv_green")]
    pub gmv_green: f64,
    #[serde(default = "default_gmv_amber")]
    pub gmv_amber: f64,
    #[serde(default = "default_retention_green")]
    pub retention_green: f64,
    #[serde(default = "default_retention_amber")]
    pub retention_amber: f64,
    #[serde(default = "default_cac_over_green")]
    pub cac_over_green: f64,
    #[serde(default = "default_cac_over_amber")]
    pub cac_over_amber: f64,
    #[serde(default = "default_cpa_over_green")]
    pub cpa_over_green: f64,
    #[serde(default = "default_cpa_over_amber")]
    pub cpa_over_amber: f64,
}

fn default_gmv_green() -> f64 {
    0.95
}
fn default_gmv_amber() -> f64 {
    0.75
}
fn default_retention_green() -> f64 {
    0.90
}
fn default_retention_amber() -> f64 {
    0.70
}
fn default_cac_over_green() -> f64 {
    1.00
}
fn default_cac_over_amber() -> f64 {
    1.20
}
fn default_cpa_over_green() -> f64 {
    1.00
}
fn default_cpa_over_amber() -> f64 {
    1.25
}

impl Default for EvaluationThresholds {
    fn default() -> Self {
        Self {
            gmv_green: default_gmv_green(),
            gmv_amber: default_gmv_amber(),
            retention_green: default_retention_green(),
            retention_amber: default_retention_amber(),
            cac_over_green: default_cac_over_green(),
            cac_over_amber: default_cac_over_amber(),
            cpa_over_green: default_cpa_over_green(),
            cpa_over_amber: default_cpa_over_amber(),
        }
    }
}

// ---------------------------------------------------------------------------
// Campaigns file
// ---------------------------------------------------------------------------

/// The parsed campaigns file: global thresholds plus one or more campaign
/// definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignBook {
    #[serde(default)]
    pub thresholds: EvaluationThresholds,
    pub campaigns: Vec<CampaignConfig>,
}

impl CampaignBook {
    /// Load and validate a campaigns file. A file with no campaigns, or a
    /// campaign missing a required numeric field, fails here rather than
    /// inside the engine.
    pub fn load(path: &str) -> RaffleResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(path));
        let book: CampaignBook = builder.build()?.try_deserialize()?;

        if book.campaigns.is_empty() {
            return Err(RaffleError::Config(format!(
                "campaigns file '{}' defines no campaigns",
                path
            )));
        }
        for campaign in &book.campaigns {
            campaign.validate()?;
        }
        tracing::info!(
            file = path,
            campaigns = book.campaigns.len(),
            "Campaigns file loaded"
        );
        Ok(book)
    }

    pub fn find(&self, campaign_id: &str) -> RaffleResult<&CampaignConfig> {
        self.campaigns
            .iter()
            .find(|c| c.id == campaign_id)
            .ok_or_else(|| RaffleError::UnknownCampaign(campaign_id.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn base_campaign() -> CampaignConfig {
        CampaignConfig {
            id: "spring-raffle".to_string(),
            label: "Spring raffle".to_string(),
            duration_days: Some(20),
            start_date: None,
            end_date: None,
            target_gmv: 100_000.0,
            total_budget: 15_000.0,
            baseline_ltv: 90.0,
            target_ltv_cac_ratio: 5.0,
            baseline_crr_20d: 0.12,
            baseline_gmv_per_retained_20d: 25.0,
            customer_base_size: 10_000,
            aov_new: 40.0,
            aov_returning: 35.0,
            budget_split_new: 0.75,
            target_cac_override: None,
            target_cpa: None,
            phases: Vec::new(),
            ticket_phases: Vec::new(),
        }
    }

    // 1. Duration resolution -------------------------------------------------

    #[test]
    fn test_explicit_duration_wins() {
        let campaign = base_campaign();
        assert_eq!(campaign.duration_days().unwrap(), 20);
    }

    #[test]
    fn test_duration_from_dates_is_inclusive() {
        let campaign = CampaignConfig {
            duration_days: None,
            start_date: Some(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()),
            end_date: Some(NaiveDate::from_ymd_opt(2026, 3, 20).unwrap()),
            ..base_campaign()
        };
        // 1st through 20th inclusive = 20 days.
        assert_eq!(campaign.duration_days().unwrap(), 20);
    }

    #[test]
    fn test_single_day_campaign() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let campaign = CampaignConfig {
            duration_days: None,
            start_date: Some(date),
            end_date: Some(date),
            ..base_campaign()
        };
        assert_eq!(campaign.duration_days().unwrap(), 1);
    }

    #[test]
    fn test_missing_schedule_is_an_error() {
        let campaign = CampaignConfig {
            duration_days: None,
            ..base_campaign()
        };
        assert!(matches!(
            campaign.duration_days(),
            Err(RaffleError::MissingSchedule(_))
        ));
    }

    // 2. Target CAC fallback -------------------------------------------------

    #[test]
    fn test_target_cac_derived_from_ltv() {
        let campaign = base_campaign();
        // 90 / 5 = 18
        assert!((campaign.target_cac() - 18.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_target_cac_override_takes_precedence() {
        let campaign = CampaignConfig {
            target_cac_override: Some(22.5),
            ..base_campaign()
        };
        assert!((campaign.target_cac() - 22.5).abs() < f64::EPSILON);
    }

    // 3. Validation ----------------------------------------------------------

    #[test]
    fn test_validate_accepts_well_formed_campaign() {
        assert!(base_campaign().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_budget_split() {
        let campaign = CampaignConfig {
            budget_split_new: 1.3,
            ..base_campaign()
        };
        assert!(campaign.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_duration() {
        let campaign = CampaignConfig {
            duration_days: Some(0),
            ..base_campaign()
        };
        assert!(campaign.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_phase_range() {
        let campaign = CampaignConfig {
            phases: vec![PhaseConfig {
                id: "p1".to_string(),
                label: String::new(),
                start_day: 8,
                end_day: 5,
                target_gmv: 10_000.0,
                target_cac: 15.0,
                expected_aov: 40.0,
                budget: 3_000.0,
            }],
            ..base_campaign()
        };
        assert!(campaign.validate().is_err());
    }

    // 4. Thresholds ----------------------------------------------------------

    #[test]
    fn test_threshold_defaults_are_ordered() {
        let t = EvaluationThresholds::default();
        assert!(t.gmv_green > t.gmv_amber);
        assert!(t.retention_green > t.retention_amber);
        assert!(t.cac_over_green < t.cac_over_amber);
        assert!(t.cpa_over_green < t.cpa_over_amber);
    }
}
