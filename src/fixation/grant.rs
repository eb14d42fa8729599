//! Per-grant indexation and 32-year capitalization ratio

use crate::calendar::fractional_months_between;
use crate::client::Grant;
use crate::reference::ReferenceSnapshot;
use crate::rounding::round_money;
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Years of service that count toward the exemption, per grant
pub const MAX_COUNTABLE_SERVICE_YEARS: u32 = 32;

/// Why a grant contributes nothing to the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    #[error("grant amount is zero or negative")]
    NonPositiveAmount,
    #[error("work end date is missing")]
    MissingWorkEnd,
    #[error("work start date is missing")]
    MissingWorkStart,
    #[error("service period has zero length")]
    ZeroLengthService,
    #[error("grant was paid after the eligibility date")]
    GrantAfterEligibility,
}

/// Derived figures for one grant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantComputationResult {
    pub grant_id: u32,
    pub employer_name: String,
    pub grant_date: NaiveDate,
    pub grant_amount: f64,

    /// Growth factor from grant date to eligibility date
    pub indexation_factor: f64,
    pub indexed_full_amount: f64,

    /// Service months between work start and work end
    pub service_months: f64,
    /// Service months inside the 32-year window
    pub countable_months: f64,
    pub ratio_32y: f64,

    pub limited_indexed_amount: f64,

    /// Amount this grant asks of the exemption pool
    pub impact_on_exemption: f64,

    pub exclusion_reason: Option<ExclusionReason>,
}

impl GrantComputationResult {
    /// Zero-valued result for a grant that can't be computed
    pub fn excluded(grant: &Grant, reason: ExclusionReason) -> Self {
        Self {
            grant_id: grant.grant_id,
            employer_name: grant.employer_name.clone(),
            grant_date: grant.grant_date,
            grant_amount: grant.grant_amount,
            indexation_factor: 0.0,
            indexed_full_amount: 0.0,
            service_months: 0.0,
            countable_months: 0.0,
            ratio_32y: 0.0,
            limited_indexed_amount: 0.0,
            impact_on_exemption: 0.0,
            exclusion_reason: Some(reason),
        }
    }

    pub fn is_excluded(&self) -> bool {
        self.exclusion_reason.is_some()
    }
}

/// Validate the grant and return its service period
fn service_period(
    grant: &Grant,
    eligibility_date: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), ExclusionReason> {
    if !grant.grant_amount.is_finite() || grant.grant_amount <= 0.0 {
        return Err(ExclusionReason::NonPositiveAmount);
    }
    let end = grant.work_end_date.ok_or(ExclusionReason::MissingWorkEnd)?;
    let start = grant.work_start_date.ok_or(ExclusionReason::MissingWorkStart)?;
    if end <= start {
        return Err(ExclusionReason::ZeroLengthService);
    }
    if grant.grant_date > eligibility_date {
        return Err(ExclusionReason::GrantAfterEligibility);
    }
    Ok((start, end))
}

/// Share of a service period that falls within 32 years of its end
///
/// Returns `(service_months, countable_months, ratio)`.
pub fn capitalization_ratio(work_start: NaiveDate, work_end: NaiveDate) -> (f64, f64, f64) {
    let window_start = work_end
        .checked_sub_months(Months::new(MAX_COUNTABLE_SERVICE_YEARS * 12))
        .unwrap_or(NaiveDate::MIN);

    let service_months = fractional_months_between(work_start, work_end);
    if service_months <= 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let countable_months = fractional_months_between(work_start.max(window_start), work_end);
    let ratio = (countable_months / service_months).clamp(0.0, 1.0);

    (service_months, countable_months, ratio)
}

/// Index one grant to the eligibility date and limit it to 32 years of service
///
/// Defective grants come back zero-valued with an `exclusion_reason`.
pub fn compute_grant(
    grant: &Grant,
    eligibility_date: NaiveDate,
    reference: &ReferenceSnapshot,
) -> GrantComputationResult {
    let (work_start, work_end) = match service_period(grant, eligibility_date) {
        Ok(period) => period,
        Err(reason) => {
            log::debug!("grant {} ({}) excluded: {}", grant.grant_id, grant.employer_name, reason);
            return GrantComputationResult::excluded(grant, reason);
        }
    };

    let indexation_factor = reference.indexation.factor(grant.grant_date, eligibility_date);
    let indexed_full_amount = grant.grant_amount * indexation_factor;

    let (service_months, countable_months, ratio_32y) = capitalization_ratio(work_start, work_end);
    let limited_indexed_amount = indexed_full_amount * ratio_32y;

    log::debug!(
        "grant {} ({}): indexed {:.2} x ratio {:.6} = {:.2}",
        grant.grant_id, grant.employer_name, indexed_full_amount, ratio_32y, limited_indexed_amount
    );

    GrantComputationResult {
        grant_id: grant.grant_id,
        employer_name: grant.employer_name.clone(),
        grant_date: grant.grant_date,
        grant_amount: grant.grant_amount,
        indexation_factor,
        indexed_full_amount: round_money(indexed_full_amount),
        service_months,
        countable_months,
        ratio_32y,
        limited_indexed_amount: round_money(limited_indexed_amount),
        impact_on_exemption: round_money(limited_indexed_amount),
        exclusion_reason: None,
    }
}

/// Compute every grant, keeping input order
pub fn compute_grants(
    grants: &[Grant],
    eligibility_date: NaiveDate,
    reference: &ReferenceSnapshot,
) -> Vec<GrantComputationResult> {
    grants
        .iter()
        .map(|g| compute_grant(g, eligibility_date, reference))
        .collect()
}
