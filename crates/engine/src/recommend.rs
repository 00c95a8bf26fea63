//! Recommendation rules — a deterministic decision table keyed by the
//! combination of detected KPI issues, not a single-issue lookup. Every note
//! carries concrete figures from the same metrics that drove the statuses.

use raffle_core::TrafficLight;

/// A detected KPI problem. Feeding an enum set (rather than string tags)
/// into the decision table keeps the rules exhaustive and checkable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KpiIssue {
    GmvRed,
    GmvAmber,
    CacRed,
    CacAmber,
    CpaRed,
    CpaAmber,
}

/// Figures referenced by the note text. Taken verbatim from the health
/// evaluation that produced the statuses.
#[derive(Debug, Clone)]
pub struct NoteContext {
    pub gmv_progress: f64,
    pub projected_gmv: f64,
    pub target_gmv: f64,
    pub actual_cac: Option<f64>,
    pub target_cac: f64,
    pub actual_cpa: Option<f64>,
}

/// Translate the three roll-up-relevant statuses into issue tags. Retention
/// is deliberately absent, matching the overall-status roll-up.
pub fn collect_issues(
    gmv: TrafficLight,
    cac: TrafficLight,
    cpa: TrafficLight,
) -> Vec<KpiIssue> {
    let mut issues = Vec::new();
    match gmv {
        TrafficLight::Red => issues.push(KpiIssue::GmvRed),
        TrafficLight::Amber => issues.push(KpiIssue::GmvAmber),
        TrafficLight::Green => {}
    }
    match cac {
        TrafficLight::Red => issues.push(KpiIssue::CacRed),
        TrafficLight::Amber => issues.push(KpiIssue::CacAmber),
        TrafficLight::Green => {}
    }
    match cpa {
        TrafficLight::Red => issues.push(KpiIssue::CpaRed),
        TrafficLight::Amber => issues.push(KpiIssue::CpaAmber),
        TrafficLight::Green => {}
    }
    issues
}

/// Apply the decision table and append the trailing projected-vs-target
/// summary line.
pub fn notes(issues: &[KpiIssue], ctx: &NoteContext) -> Vec<String> {
    let gmv_red = issues.contains(&KpiIssue::GmvRed);
    let gmv_amber = issues.contains(&KpiIssue::GmvAmber);
    let cost_issue = issues.iter().any(|i| {
        matches!(
            i,
            KpiIssue::CacRed | KpiIssue::CacAmber | KpiIssue::CpaRed | KpiIssue::CpaAmber
        )
    });

    let mut notes = Vec::new();

    // Rows are combination-keyed and not mutually exclusive; every row whose
    // condition holds contributes a note.
    if issues.is_empty() {
        notes.push(format!(
            "All KPIs are on track at {} of the target pace — hold the current plan.",
            percent(ctx.gmv_progress)
        ));
    }
    if (gmv_red || gmv_amber) && !cost_issue {
        // Revenue is behind while acquisition costs are healthy: the lever
        // is order value, not more traffic.
        notes.push(format!(
            "GMV is pacing at {} of target with acquisition costs on plan — raise average \
             order value via bundles or higher ticket tiers rather than buying more traffic.",
            percent(ctx.gmv_progress)
        ));
    }
    if gmv_red && cost_issue {
        notes.push(format!(
            "Projected GMV {} is behind target {} while acquisition is inefficient \
             ({} actual CAC vs {} target) — cut the weakest spend and refine targeting \
             before adding budget.",
            currency(ctx.projected_gmv),
            currency(ctx.target_gmv),
            currency_opt(ctx.actual_cac),
            currency(ctx.target_cac)
        ));
    }
    if gmv_amber {
        notes.push(format!(
            "GMV is tracking at {} of the target pace — monitor daily and optimize \
             offers and creatives before escalating.",
            percent(ctx.gmv_progress)
        ));
    }
    if cost_issue && !gmv_red {
        notes.push(format!(
            "Acquisition costs are over target (CAC {} vs {}, CPA {}) — tighten \
             audience targeting and pause the weakest channels.",
            currency_opt(ctx.actual_cac),
            currency(ctx.target_cac),
            currency_opt(ctx.actual_cpa)
        ));
    }

    notes.push(format!(
        "Projected GMV {} against a target of {}.",
        currency(ctx.projected_gmv),
        currency(ctx.target_gmv)
    ));
    notes
}

/// Note emitted when a phase is healthy but the enclosing campaign is not:
/// the phase cannot fix the gap, later phases must.
pub fn phase_shortfall_note(campaign_projected_gmv: f64, campaign_target_gmv: f64) -> String {
    let shortfall = (campaign_target_gmv - campaign_projected_gmv).max(0.0);
    format!(
        "This phase is on plan, but the campaign overall is projected {} short of its {} \
         target — raise the targets or budget for the remaining phases.",
        currency(shortfall),
        currency(campaign_target_gmv)
    )
}

fn currency(value: f64) -> String {
    if value.is_finite() {
        format!("${:.0}", value)
    } else {
        "n/a".to_string()
    }
}

fn currency_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => currency(v),
        None => "n/a".to_string(),
    }
}

fn percent(ratio: f64) -> String {
    if ratio.is_finite() {
        format!("{:.0}%", ratio * 100.0)
    } else {
        "n/a".to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
