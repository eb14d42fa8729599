//! Eligibility gate for rights fixation
//!
//! A client may fix rights once the statutory retirement age is reached AND
//! a pension has started paying. The gate is a pure predicate: a negative
//! verdict is an ordinary result carrying reason codes, never an error.

use crate::client::{Client, Gender};
use chrono::{Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Which threshold applies to a gender token that matched neither list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnknownGenderPolicy {
    /// Use the male (later) retirement age
    MaleThreshold,
    /// Use the female (earlier) retirement age
    FemaleThreshold,
}

/// Retirement-age rule configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityRules {
    pub male_retirement_age: u32,
    pub female_retirement_age: u32,
    pub unknown_gender_policy: UnknownGenderPolicy,
}

impl Default for EligibilityRules {
    fn default() -> Self {
        Self {
            male_retirement_age: 67,
            female_retirement_age: 62,
            unknown_gender_policy: UnknownGenderPolicy::MaleThreshold,
        }
    }
}

impl EligibilityRules {
    /// Retirement age in whole years for a gender
    pub fn retirement_age(&self, gender: Gender) -> u32 {
        match gender {
            Gender::Male => self.male_retirement_age,
            Gender::Female => self.female_retirement_age,
            Gender::Unknown => match self.unknown_gender_policy {
                UnknownGenderPolicy::MaleThreshold => self.male_retirement_age,
                UnknownGenderPolicy::FemaleThreshold => self.female_retirement_age,
            },
        }
    }

    /// Date the client reaches retirement age
    ///
    /// A Feb 29 birthday lands on Feb 28 in non-leap target years.
    pub fn eligibility_date(&self, birth_date: NaiveDate, gender: Gender) -> NaiveDate {
        let months = Months::new(self.retirement_age(gender) * 12);
        birth_date.checked_add_months(months).unwrap_or(NaiveDate::MAX)
    }
}

/// Why a client is not yet eligible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IneligibilityReason {
    AgeNotReached,
    PensionNotStarted,
}

impl IneligibilityReason {
    pub fn code(&self) -> &'static str {
        match self {
            IneligibilityReason::AgeNotReached => "age_not_reached",
            IneligibilityReason::PensionNotStarted => "pension_not_started",
        }
    }
}

/// Verdict of the eligibility gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityResult {
    pub eligible: bool,
    pub eligibility_date: NaiveDate,
    pub age_condition_ok: bool,
    pub pension_condition_ok: bool,
    /// False when the gender token was not recognised and the fallback applied
    pub gender_recognized: bool,
    pub reasons: Vec<IneligibilityReason>,
}

/// Check eligibility with the default rules
///
/// `as_of` defaults to today.
pub fn check_eligibility(
    birth_date: NaiveDate,
    gender: Gender,
    pension_start_date: Option<NaiveDate>,
    as_of: Option<NaiveDate>,
) -> EligibilityResult {
    check_eligibility_with(
        &EligibilityRules::default(),
        birth_date,
        gender,
        pension_start_date,
        as_of,
    )
}

/// Check eligibility under explicit rules
pub fn check_eligibility_with(
    rules: &EligibilityRules,
    birth_date: NaiveDate,
    gender: Gender,
    pension_start_date: Option<NaiveDate>,
    as_of: Option<NaiveDate>,
) -> EligibilityResult {
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
    let eligibility_date = rules.eligibility_date(birth_date, gender);

    let age_condition_ok = as_of >= eligibility_date;
    let pension_condition_ok = matches!(pension_start_date, Some(start) if start <= as_of);

    let mut reasons = Vec::new();
    if !age_condition_ok {
        reasons.push(IneligibilityReason::AgeNotReached);
    }
    if !pension_condition_ok {
        reasons.push(IneligibilityReason::PensionNotStarted);
    }

    EligibilityResult {
        eligible: age_condition_ok && pension_condition_ok,
        eligibility_date,
        age_condition_ok,
        pension_condition_ok,
        gender_recognized: gender.is_recognized(),
        reasons,
    }
}

/// Check eligibility for a client record
pub fn check_client(
    rules: &EligibilityRules,
    client: &Client,
    as_of: Option<NaiveDate>,
) -> EligibilityResult {
    check_eligibility_with(
        rules,
        client.birth_date,
        client.gender,
        client.pension_start_date,
        as_of,
    )
}
