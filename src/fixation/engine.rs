//! Rights-fixation engine: eligibility gate, grants, ledger and IDF reduction

use super::grant::{compute_grants, GrantComputationResult};
use super::idf::{compute_idf_impact, IdfFixationInput, IdfFixationResult};
use super::ledger::{deplete_exemption, ExemptionLedgerResult};
use crate::client::{Client, Grant};
use crate::eligibility::{check_client, EligibilityResult, EligibilityRules};
use crate::reference::{ReferenceSnapshot, SnapshotSource, CAPITALIZATION_MONTHS};
use crate::rounding::round_money;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Configuration for a fixation run
#[derive(Debug, Clone, Default)]
pub struct FixationConfig {
    pub eligibility: EligibilityRules,

    /// Evaluation date (None = today); a request may override it
    pub as_of: Option<NaiveDate>,
}

/// Everything known about one client for a fixation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixationRequest {
    pub client: Client,
    pub grants: Vec<Grant>,

    /// Security-forces reduction input, for retirees of that class
    #[serde(default)]
    pub idf: Option<IdfFixationInput>,

    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

impl FixationRequest {
    pub fn new(client: Client, grants: Vec<Grant>) -> Self {
        Self {
            client,
            grants,
            idf: None,
            as_of: None,
        }
    }

    pub fn with_idf(mut self, idf: IdfFixationInput) -> Self {
        self.idf = Some(idf);
        self
    }

    pub fn as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = Some(as_of);
        self
    }
}

/// Complete fixation for an eligible client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixationResult {
    pub client_id: u32,
    pub eligibility: EligibilityResult,
    pub fixation_year: i32,

    /// Grants in input order
    pub grants: Vec<GrantComputationResult>,
    pub ledger: ExemptionLedgerResult,
    pub idf: Option<IdfFixationResult>,

    /// Ledger remainder less the IDF impact, floored at zero
    pub final_remaining_exempt_capital: f64,
    pub final_remaining_monthly_exemption: f64,

    /// Qualifying monthly pension ceiling for the fixation year
    pub pension_ceiling: f64,
    /// Share of the pension ceiling still exempt, in percent
    pub exempt_pension_percentage: f64,

    pub reference_source: SnapshotSource,
    pub reference_trace_id: Uuid,
}

/// Result of running the engine for one request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FixationOutcome {
    /// Blocked at the gate; nothing downstream ran
    NotEligible(EligibilityResult),
    Fixed(Box<FixationResult>),
}

impl FixationOutcome {
    pub fn is_eligible(&self) -> bool {
        matches!(self, FixationOutcome::Fixed(_))
    }

    pub fn result(&self) -> Option<&FixationResult> {
        match self {
            FixationOutcome::Fixed(result) => Some(result),
            FixationOutcome::NotEligible(_) => None,
        }
    }

    pub fn eligibility(&self) -> &EligibilityResult {
        match self {
            FixationOutcome::Fixed(result) => &result.eligibility,
            FixationOutcome::NotEligible(eligibility) => eligibility,
        }
    }
}

/// Main fixation engine
#[derive(Debug, Clone)]
pub struct FixationEngine {
    reference: ReferenceSnapshot,
    config: FixationConfig,
}

impl FixationEngine {
    /// Create an engine over a reference snapshot
    pub fn new(reference: ReferenceSnapshot, config: FixationConfig) -> Self {
        Self { reference, config }
    }

    pub fn reference(&self) -> &ReferenceSnapshot {
        &self.reference
    }

    pub fn config(&self) -> &FixationConfig {
        &self.config
    }

    /// Run the fixation for one client
    pub fn compute(&self, request: &FixationRequest) -> FixationOutcome {
        let as_of = request.as_of.or(self.config.as_of);
        let eligibility = check_client(&self.config.eligibility, &request.client, as_of);
        if !eligibility.eligible {
            log::info!(
                "client {} not eligible: {:?}",
                request.client.client_id,
                eligibility.reasons.iter().map(|r| r.code()).collect::<Vec<_>>()
            );
            return FixationOutcome::NotEligible(eligibility);
        }

        let eligibility_date = eligibility.eligibility_date;
        let fixation_year = eligibility_date.year();
        let grants = compute_grants(&request.grants, eligibility_date, &self.reference);
        let exempt_capital = self.reference.exempt_capital_for_year(fixation_year);
        let ledger = deplete_exemption(&grants, exempt_capital);
        let pension_ceiling = self.reference.exempt_capital.pension_ceiling(fixation_year);

        let idf = request
            .idf
            .as_ref()
            .map(|input| compute_idf_impact(&self.complete_idf_input(input, eligibility_date)));
        let idf_impact = idf.as_ref().map(|r| r.impact).unwrap_or(0.0);

        let final_remaining = (ledger.remaining_exempt_capital - idf_impact).max(0.0);
        let final_monthly = final_remaining / CAPITALIZATION_MONTHS;
        let exempt_pension_percentage = if pension_ceiling > 0.0 {
            (final_monthly / pension_ceiling * 100.0).min(100.0)
        } else {
            0.0
        };

        log::info!(
            "client {}: exempt capital {:.2}, impact {:.2}, IDF {:.2}, remaining {:.2}",
            request.client.client_id,
            ledger.exempt_capital_initial,
            ledger.total_impact,
            idf_impact,
            final_remaining
        );

        FixationOutcome::Fixed(Box::new(FixationResult {
            client_id: request.client.client_id,
            eligibility,
            fixation_year,
            grants,
            ledger,
            idf,
            final_remaining_exempt_capital: round_money(final_remaining),
            final_remaining_monthly_exemption: round_money(final_monthly),
            pension_ceiling,
            exempt_pension_percentage: round_money(exempt_pension_percentage),
            reference_source: self.reference.source,
            reference_trace_id: self.reference.trace_id,
        }))
    }

    /// Fill the IDF fields the engine already knows
    ///
    /// The eligibility date comes from the gate and the monthly cap from the
    /// reference snapshot, unless the caller supplied them.
    fn complete_idf_input(
        &self,
        input: &IdfFixationInput,
        eligibility_date: NaiveDate,
    ) -> IdfFixationInput {
        IdfFixationInput {
            eligibility_date: input.eligibility_date.or(Some(eligibility_date)),
            monthly_cap: input.monthly_cap.or(Some(self.reference.monthly_cap)),
            ..input.clone()
        }
    }
}
