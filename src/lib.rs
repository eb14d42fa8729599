//! Rights Fixation - severance exemption engine for Israeli retirement planning
//!
//! This library provides:
//! - Eligibility gate (retirement age and pension start)
//! - Grant indexation and the 32-year capitalization ratio
//! - Sequential depletion of the statutory exemption capital
//! - Security-forces (IDF) commutation reduction
//! - Reference-data fetch with unit inference and fallback
//! - Monthly cashflow projection over severance, pension, income and assets

pub mod calendar;
pub mod client;
pub mod eligibility;
pub mod reference;
pub mod fixation;
pub mod cashflow;
pub mod scenario;
pub mod rounding;

// Re-export commonly used types
pub use calendar::YearMonth;
pub use client::{Client, Gender, Grant};
pub use eligibility::{check_eligibility, EligibilityResult, EligibilityRules};
pub use reference::{fetch_reference_snapshot, Indexation, ReferenceSnapshot};
pub use fixation::{
    compute_grant, compute_idf_impact, deplete_exemption, FixationConfig, FixationEngine,
    FixationOutcome, FixationRequest, FixationResult,
};
pub use cashflow::{assemble_cashflow, CashflowRow, CashflowSource};
pub use scenario::ScenarioRunner;
