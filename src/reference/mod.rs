//! Statutory reference data: severance caps, indexation and exemption capital
//!
//! A `ReferenceSnapshot` is a point-in-time capture of everything the
//! calculators need from outside the client file. It is passed explicitly
//! into every computation; a new fetch produces a new snapshot.

mod units;
mod indexation;
mod exempt_capital;
pub mod audit;
pub mod fetch;
pub mod loader;

pub use units::{normalize_caps, UnitInference, UnitThresholds};
pub use indexation::{CpiPoint, CpiSeries, Indexation};
pub use exempt_capital::{
    statutory_exemption_rate, ExemptCapitalRow, ExemptCapitalTable, CAPITALIZATION_MONTHS,
};
pub use audit::{AuditEntry, JsonLinesAudit, LogAudit, ReferenceAudit};
pub use fetch::{
    fetch_reference_snapshot, FetchConfig, FetchError, HttpSource, ReferenceNormalizer,
    ReferenceSource,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Monthly exempt severance cap used when the endpoint is unavailable
pub const FALLBACK_MONTHLY_CAP: f64 = 13_750.0;

/// Annual exempt severance cap used when the endpoint is unavailable
pub const FALLBACK_ANNUAL_CAP: f64 = 165_000.0;

/// Where a snapshot's cap figures came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    Fetched,
    Fallback,
}

impl SnapshotSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotSource::Fetched => "fetched",
            SnapshotSource::Fallback => "fallback",
        }
    }
}

/// Immutable capture of the statutory reference data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceSnapshot {
    pub monthly_cap: f64,
    pub annual_cap: f64,
    pub unit_inferred: UnitInference,
    pub source: SnapshotSource,
    pub fetched_at: DateTime<Utc>,
    pub trace_id: Uuid,

    /// Figure exactly as found in the response (None for fallback)
    pub raw_value: Option<f64>,

    /// How grants are indexed to the eligibility date
    pub indexation: Indexation,

    /// Year-indexed exemption capital parameters
    pub exempt_capital: ExemptCapitalTable,
}

impl ReferenceSnapshot {
    /// Snapshot built from the fallback constants
    pub fn fallback() -> Self {
        Self::fallback_traced(Uuid::new_v4())
    }

    pub(crate) fn fallback_traced(trace_id: Uuid) -> Self {
        Self {
            monthly_cap: FALLBACK_MONTHLY_CAP,
            annual_cap: FALLBACK_ANNUAL_CAP,
            unit_inferred: UnitInference::Monthly,
            source: SnapshotSource::Fallback,
            fetched_at: Utc::now(),
            trace_id,
            raw_value: None,
            indexation: Indexation::None,
            exempt_capital: ExemptCapitalTable::statutory(),
        }
    }

    /// Copy of this snapshot with a different indexation basis
    pub fn with_indexation(self, indexation: Indexation) -> Self {
        Self { indexation, ..self }
    }

    /// Copy of this snapshot with a different exempt-capital table
    pub fn with_exempt_capital(self, exempt_capital: ExemptCapitalTable) -> Self {
        Self { exempt_capital, ..self }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == SnapshotSource::Fallback
    }

    /// Exempt capital for a fixation year
    pub fn exempt_capital_for_year(&self, year: i32) -> f64 {
        self.exempt_capital.exempt_capital(year)
    }
}
