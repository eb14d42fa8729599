//! Security-forces (IDF) retiree reduction
//!
//! Retirees of the security forces who commuted part of their pension have
//! their exemption reduced by a separate formula: the commutation reduction,
//! rescaled to the current commutation percentage and capped at 35% of the
//! monthly ceiling, times the whole months during which commutation and
//! eligibility overlap before the promoter-age date.

use crate::calendar::whole_months_between;
use crate::rounding::round_money;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Share of the monthly ceiling the reduction may not exceed
pub const MAX_REDUCTION_SHARE_OF_CAP: f64 = 0.35;

/// Input to the IDF reduction; every field is required
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdfFixationInput {
    pub reduction_amount: Option<f64>,
    pub original_commutation_percent: Option<f64>,
    pub current_commutation_percent: Option<f64>,
    pub monthly_cap: Option<f64>,
    pub eligibility_date: Option<NaiveDate>,
    pub commutation_date: Option<NaiveDate>,
    pub promoter_age_date: Option<NaiveDate>,
}

/// Domain validation failures, reported in the result rather than raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdfError {
    #[error("סכום ההפחתה חסר או אינו חיובי")]
    MissingReductionAmount,
    #[error("אחוז ההיוון המקורי חסר או אינו חיובי")]
    MissingOriginalCommutationPercent,
    #[error("אחוז ההיוון הנוכחי חסר או אינו חיובי")]
    MissingCurrentCommutationPercent,
    #[error("אחוז ההיוון הנוכחי הוא אפס - לא ניתן לחלק באפס")]
    ZeroCurrentCommutationPercent,
    #[error("תקרת הקצבה החודשית חסרה או אינה חיובית")]
    MissingMonthlyCap,
    #[error("תאריך הזכאות חסר")]
    MissingEligibilityDate,
    #[error("תאריך ההיוון חסר")]
    MissingCommutationDate,
    #[error("תאריך הגיל המקדם חסר")]
    MissingPromoterAgeDate,
    #[error("חישוב ההפחתה הבסיסית נכשל")]
    InvalidBaseReduction,
    #[error("אין תקופה חופפת לחישוב")]
    NoOverlappingPeriod,
}

/// Outcome of the IDF reduction
///
/// On any error every figure is zero; a result is never partially filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdfFixationResult {
    pub impact: f64,
    pub overlap_months: i64,
    pub overlap_start: Option<NaiveDate>,
    pub overlap_end: Option<NaiveDate>,
    pub base_reduction: f64,
    pub max_reduction: f64,
    pub monthly_reduction_for_calc: f64,
    pub error: Option<IdfError>,
}

impl IdfFixationResult {
    fn failed(error: IdfError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Human-readable (Hebrew) error message
    pub fn error_message(&self) -> Option<String> {
        self.error.map(|e| e.to_string())
    }
}

fn positive(value: Option<f64>, error: IdfError) -> Result<f64, IdfError> {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(error),
    }
}

fn compute(input: &IdfFixationInput) -> Result<IdfFixationResult, IdfError> {
    let reduction_amount = positive(input.reduction_amount, IdfError::MissingReductionAmount)?;
    let original_pct = positive(
        input.original_commutation_percent,
        IdfError::MissingOriginalCommutationPercent,
    )?;
    let current_pct = match input.current_commutation_percent {
        Some(v) if v == 0.0 => return Err(IdfError::ZeroCurrentCommutationPercent),
        other => positive(other, IdfError::MissingCurrentCommutationPercent)?,
    };
    let monthly_cap = positive(input.monthly_cap, IdfError::MissingMonthlyCap)?;
    let eligibility_date = input.eligibility_date.ok_or(IdfError::MissingEligibilityDate)?;
    let commutation_date = input.commutation_date.ok_or(IdfError::MissingCommutationDate)?;
    let promoter_age_date = input.promoter_age_date.ok_or(IdfError::MissingPromoterAgeDate)?;

    let base_reduction = reduction_amount * (original_pct / current_pct);
    if !base_reduction.is_finite() {
        return Err(IdfError::InvalidBaseReduction);
    }
    let max_reduction = monthly_cap * MAX_REDUCTION_SHARE_OF_CAP;
    let monthly_reduction_for_calc = base_reduction.min(max_reduction);

    let overlap_start = eligibility_date.max(commutation_date);
    let overlap_end = promoter_age_date;
    if overlap_end <= overlap_start {
        return Err(IdfError::NoOverlappingPeriod);
    }
    let overlap_months = whole_months_between(overlap_start, overlap_end);
    if overlap_months <= 0 {
        return Err(IdfError::NoOverlappingPeriod);
    }

    Ok(IdfFixationResult {
        impact: round_money(monthly_reduction_for_calc * overlap_months as f64),
        overlap_months,
        overlap_start: Some(overlap_start),
        overlap_end: Some(overlap_end),
        base_reduction: round_money(base_reduction),
        max_reduction: round_money(max_reduction),
        monthly_reduction_for_calc: round_money(monthly_reduction_for_calc),
        error: None,
    })
}

/// Compute the IDF reduction impact
///
/// Never panics and never returns a partial result: input defects come back
/// as a zero result with `error` set.
pub fn compute_idf_impact(input: &IdfFixationInput) -> IdfFixationResult {
    compute(input).unwrap_or_else(|e| {
        log::debug!("IDF reduction not computed: {:?}", e);
        IdfFixationResult::failed(e)
    })
}
