//! Rights fixation: grant indexation, exemption depletion and IDF reduction

pub mod grant;
pub mod ledger;
pub mod idf;
mod engine;

pub use grant::{
    capitalization_ratio, compute_grant, compute_grants, ExclusionReason, GrantComputationResult,
    MAX_COUNTABLE_SERVICE_YEARS,
};
pub use ledger::{deplete_exemption, depletion_order, ExemptionLedgerResult, LedgerEntry};
pub use idf::{
    compute_idf_impact, IdfError, IdfFixationInput, IdfFixationResult, MAX_REDUCTION_SHARE_OF_CAP,
};
pub use engine::{FixationConfig, FixationEngine, FixationOutcome, FixationRequest, FixationResult};
