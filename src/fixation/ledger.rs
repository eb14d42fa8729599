//! Sequential depletion of the shared exemption pool
//!
//! Grants are consumed oldest first. Each takes what it asks for or what is
//! left, whichever is smaller, so the per-grant split depends on the order.
//! The order is therefore fixed: grant date, then employer name, then input
//! position.

use super::grant::GrantComputationResult;
use crate::reference::CAPITALIZATION_MONTHS;
use crate::rounding::round_money;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One step of the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub grant_id: u32,
    pub employer_name: String,
    pub grant_date: NaiveDate,
    /// Impact the grant asked for
    pub requested_impact: f64,
    /// Impact actually taken from the pool
    pub consumed: f64,
    /// Requested impact the pool could not cover
    pub excess: f64,
    pub remaining_after: f64,
    pub excluded: bool,
}

/// Outcome of depleting the exemption pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExemptionLedgerResult {
    pub exempt_capital_initial: f64,
    pub total_impact: f64,
    pub remaining_exempt_capital: f64,
    /// Remaining capital spread back over 180 months
    pub remaining_monthly_exemption: f64,
    /// Remaining capital as a percentage of the initial pool
    pub exemption_percentage: f64,
    /// Requested impact that found the pool already empty
    pub total_excess_impact: f64,
    /// Grants in processing order
    pub processed_grant_ids: Vec<u32>,
    pub entries: Vec<LedgerEntry>,
}

/// Running totals carried through the fold
#[derive(Debug, Clone)]
struct LedgerState {
    remaining: f64,
    total_impact: f64,
    total_excess: f64,
    entries: Vec<LedgerEntry>,
}

impl LedgerState {
    fn new(initial: f64, capacity: usize) -> Self {
        Self {
            remaining: initial,
            total_impact: 0.0,
            total_excess: 0.0,
            entries: Vec::with_capacity(capacity),
        }
    }

    fn apply(mut self, grant: &GrantComputationResult) -> Self {
        let requested = if grant.is_excluded() {
            0.0
        } else {
            grant.limited_indexed_amount.max(0.0)
        };
        let consumed = requested.min(self.remaining);
        let excess = requested - consumed;

        self.remaining = (self.remaining - consumed).max(0.0);
        self.total_impact += consumed;
        self.total_excess += excess;

        log::debug!(
            "ledger: grant {} requested {:.2}, consumed {:.2}, remaining {:.2}",
            grant.grant_id, requested, consumed, self.remaining
        );

        self.entries.push(LedgerEntry {
            grant_id: grant.grant_id,
            employer_name: grant.employer_name.clone(),
            grant_date: grant.grant_date,
            requested_impact: round_money(requested),
            consumed: round_money(consumed),
            excess: round_money(excess),
            remaining_after: round_money(self.remaining),
            excluded: grant.is_excluded(),
        });
        self
    }
}

/// Grants in the order the ledger consumes them
///
/// Stable sort, so equal (date, employer) pairs keep their input order.
pub fn depletion_order(results: &[GrantComputationResult]) -> Vec<&GrantComputationResult> {
    let mut ordered: Vec<&GrantComputationResult> = results.iter().collect();
    ordered.sort_by(|a, b| {
        a.grant_date
            .cmp(&b.grant_date)
            .then_with(|| a.employer_name.cmp(&b.employer_name))
    });
    ordered
}

/// Consume `exempt_capital_initial` across all grants
///
/// Excluded grants appear in the entries with zero impact. A negative or
/// non-finite initial pool is treated as empty.
pub fn deplete_exemption(
    results: &[GrantComputationResult],
    exempt_capital_initial: f64,
) -> ExemptionLedgerResult {
    let initial = if exempt_capital_initial.is_finite() {
        exempt_capital_initial.max(0.0)
    } else {
        0.0
    };

    let state = depletion_order(results)
        .into_iter()
        .fold(LedgerState::new(initial, results.len()), LedgerState::apply);

    debug_assert!(state.remaining >= 0.0, "remaining exemption went negative");
    debug_assert!(
        state.total_impact <= initial + 1e-6,
        "total impact {} exceeds initial pool {}",
        state.total_impact,
        initial
    );

    let exemption_percentage = if initial > 0.0 {
        state.remaining / initial * 100.0
    } else {
        0.0
    };

    ExemptionLedgerResult {
        exempt_capital_initial: round_money(initial),
        total_impact: round_money(state.total_impact),
        remaining_exempt_capital: round_money(state.remaining),
        remaining_monthly_exemption: round_money(state.remaining / CAPITALIZATION_MONTHS),
        exemption_percentage: round_money(exemption_percentage),
        total_excess_impact: round_money(state.total_excess),
        processed_grant_ids: state.entries.iter().map(|e| e.grant_id).collect(),
        entries: state.entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixation::grant::ExclusionReason;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn result(
        grant_id: u32,
        employer: &str,
        grant_date: NaiveDate,
        impact: f64,
    ) -> GrantComputationResult {
        GrantComputationResult {
            grant_id,
            employer_name: employer.to_string(),
            grant_date,
            grant_amount: impact,
            indexation_factor: 1.0,
            indexed_full_amount: impact,
            service_months: 120.0,
            countable_months: 120.0,
            ratio_32y: 1.0,
            limited_indexed_amount: impact,
            impact_on_exemption: impact,
            exclusion_reason: None,
        }
    }

    #[test]
    fn test_two_grants_partially_deplete() {
        let g1 = result(1, "Alpha", date(2005, 1, 1), 300_000.0);
        let g2 = result(2, "Beta", date(2012, 1, 1), 300_000.0);

        let ledger = deplete_exemption(&[g1, g2], 400_000.0);

        assert_eq!(ledger.processed_grant_ids, vec![1, 2]);
        assert_eq!(ledger.entries[0].consumed, 300_000.0);
        assert_eq!(ledger.entries[0].remaining_after, 100_000.0);
        assert_eq!(ledger.entries[1].consumed, 100_000.0);
        assert_eq!(ledger.entries[1].excess, 200_000.0);
        assert_eq!(ledger.entries[1].remaining_after, 0.0);
        assert_eq!(ledger.total_impact, 400_000.0);
        assert_eq!(ledger.remaining_exempt_capital, 0.0);
        assert_eq!(ledger.total_excess_impact, 200_000.0);
        assert_eq!(ledger.exemption_percentage, 0.0);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let g1 = result(1, "Alpha", date(2005, 1, 1), 300_000.0);
        let g2 = result(2, "Beta", date(2012, 1, 1), 250_000.0);

        let forward = deplete_exemption(&[g1.clone(), g2.clone()], 400_000.0);
        let reversed = deplete_exemption(&[g2, g1], 400_000.0);

        assert_eq!(forward, reversed);
        assert_eq!(reversed.processed_grant_ids, vec![1, 2]);
        assert_eq!(reversed.entries[1].consumed, 100_000.0);
    }

    #[test]
    fn test_tie_break_by_employer_then_input_order() {
        let d = date(2010, 6, 1);
        let results = vec![
            result(10, "Zeta", d, 1.0),
            result(11, "Acme", d, 1.0),
            result(12, "Acme", d, 1.0),
        ];
        let ledger = deplete_exemption(&results, 10.0);
        assert_eq!(ledger.processed_grant_ids, vec![11, 12, 10]);
    }

    #[test]
    fn test_excluded_grants_listed_with_zero_impact() {
        let mut excluded = result(1, "Alpha", date(2001, 1, 1), 0.0);
        excluded.exclusion_reason = Some(ExclusionReason::MissingWorkEnd);
        excluded.limited_indexed_amount = 0.0;
        let counted = result(2, "Beta", date(2002, 1, 1), 50_000.0);

        let ledger = deplete_exemption(&[excluded, counted], 100_000.0);

        assert_eq!(ledger.entries.len(), 2);
        assert!(ledger.entries[0].excluded);
        assert_eq!(ledger.entries[0].consumed, 0.0);
        assert_eq!(ledger.total_impact, 50_000.0);
        assert_eq!(ledger.remaining_exempt_capital, 50_000.0);
        assert_eq!(ledger.exemption_percentage, 50.0);
    }

    #[test]
    fn test_monthly_exemption_from_remaining() {
        let ledger =
            deplete_exemption(&[result(1, "Alpha", date(2010, 1, 1), 76_005.0)], 976_005.0);
        assert_eq!(ledger.remaining_exempt_capital, 900_000.0);
        assert_eq!(ledger.remaining_monthly_exemption, 5_000.0);
    }

    #[test]
    fn test_empty_and_negative_pools() {
        let empty = deplete_exemption(&[], 500_000.0);
        assert_eq!(empty.remaining_exempt_capital, 500_000.0);
        assert_eq!(empty.exemption_percentage, 100.0);
        assert!(empty.entries.is_empty());

        let negative = deplete_exemption(&[result(1, "Alpha", date(2010, 1, 1), 10.0)], -5.0);
        assert_eq!(negative.exempt_capital_initial, 0.0);
        assert_eq!(negative.total_impact, 0.0);
        assert_eq!(negative.total_excess_impact, 10.0);
    }

    fn grants_strategy() -> impl Strategy<Value = Vec<GrantComputationResult>> {
        prop::collection::vec((0i64..10_000, 0u32..600_000), 0..12).prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, (offset, amount))| {
                    let grant_date = date(1990, 1, 1) + chrono::Duration::days(offset);
                    result(i as u32, &format!("Employer {}", i), grant_date, amount as f64)
                })
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_ledger_never_negative(grants in grants_strategy(), initial in 0u32..2_000_000) {
            let initial = initial as f64;
            let ledger = deplete_exemption(&grants, initial);

            prop_assert!(ledger.remaining_exempt_capital >= 0.0);
            prop_assert!(ledger.total_impact <= initial + 0.005);
            prop_assert!(ledger.entries.iter().all(|e| e.consumed <= e.requested_impact));

            let requested: f64 = grants.iter().map(|g| g.limited_indexed_amount).sum();
            prop_assert!((ledger.total_impact - requested.min(initial)).abs() < 0.01);
        }

        #[test]
        fn prop_ledger_remaining_is_non_increasing(
            grants in grants_strategy(),
            initial in 0u32..2_000_000
        ) {
            let ledger = deplete_exemption(&grants, initial as f64);
            let mut previous = ledger.exempt_capital_initial;
            for entry in &ledger.entries {
                prop_assert!(entry.remaining_after <= previous);
                previous = entry.remaining_after;
            }
        }

        #[test]
        fn prop_ledger_ignores_input_order(
            grants in grants_strategy(),
            initial in 0u32..2_000_000
        ) {
            let mut reversed = grants.clone();
            reversed.reverse();
            prop_assert_eq!(
                deplete_exemption(&grants, initial as f64),
                deplete_exemption(&reversed, initial as f64)
            );
        }
    }
}
