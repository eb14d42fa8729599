//! Scenario runner for batch fixations
//!
//! Holds one reference snapshot and configuration, then runs any number of
//! clients or indexation scenarios against them without refetching.

use crate::client::{Client, Grant};
use crate::fixation::{FixationConfig, FixationEngine, FixationOutcome, FixationRequest};
use crate::reference::{Indexation, ReferenceSnapshot};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Pre-loaded scenario runner for batch fixations
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::with_reference(fetch_reference_snapshot(url));
///
/// // Same client under different indexation bases
/// let bases = [Indexation::None, Indexation::Fixed { annual_rate: 0.02 }];
/// let outcomes = runner.run_scenarios(&request, &bases);
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    reference: ReferenceSnapshot,
    config: FixationConfig,
}

impl ScenarioRunner {
    /// Create runner over the fallback reference data
    pub fn new() -> Self {
        Self::with_reference(ReferenceSnapshot::fallback())
    }

    /// Create runner over a fetched or hand-built snapshot
    pub fn with_reference(reference: ReferenceSnapshot) -> Self {
        Self {
            reference,
            config: FixationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: FixationConfig) -> Self {
        self.config = config;
        self
    }

    fn engine(&self) -> FixationEngine {
        FixationEngine::new(self.reference.clone(), self.config.clone())
    }

    /// Run a single fixation
    pub fn run(&self, request: &FixationRequest) -> FixationOutcome {
        self.engine().compute(request)
    }

    /// Run many independent clients in parallel; outcomes keep input order
    pub fn run_batch(&self, requests: &[FixationRequest]) -> Vec<FixationOutcome> {
        let engine = self.engine();
        requests.par_iter().map(|request| engine.compute(request)).collect()
    }

    /// Run one client under several indexation bases
    pub fn run_scenarios(
        &self,
        request: &FixationRequest,
        bases: &[Indexation],
    ) -> Vec<FixationOutcome> {
        bases
            .iter()
            .map(|indexation| {
                let reference = self.reference.clone().with_indexation(indexation.clone());
                FixationEngine::new(reference, self.config.clone()).compute(request)
            })
            .collect()
    }

    pub fn reference(&self) -> &ReferenceSnapshot {
        &self.reference
    }

    /// Mutable snapshot for adjusting indexation or the exempt-capital table
    pub fn reference_mut(&mut self) -> &mut ReferenceSnapshot {
        &mut self.reference
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Pair each client with its grants; clients without grants get an empty list
pub fn build_requests(
    clients: Vec<Client>,
    mut grants_by_client: BTreeMap<u32, Vec<Grant>>,
) -> Vec<FixationRequest> {
    clients
        .into_iter()
        .map(|client| {
            let grants = grants_by_client.remove(&client.client_id).unwrap_or_default();
            FixationRequest::new(client, grants)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Gender;
    use chrono::{Datelike, NaiveDate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(client_id: u32, birth_year: i32) -> FixationRequest {
        let client = Client::new(
            client_id,
            date(birth_year, 1, 1),
            Gender::Female,
            Some(date(2020, 1, 1)),
        );
        let grants = vec![Grant::new(
            client_id * 10,
            "Acme",
            Some(date(1995, 1, 1)),
            Some(date(2015, 1, 1)),
            date(2015, 1, 1),
            100_000.0,
        )];
        FixationRequest::new(client, grants).as_of(date(2025, 1, 1))
    }

    #[test]
    fn test_run_batch_keeps_order() {
        let runner = ScenarioRunner::new();
        let requests: Vec<_> = (1..=20).map(|id| request(id, 1950 + id as i32)).collect();

        let outcomes = runner.run_batch(&requests);
        assert_eq!(outcomes.len(), 20);
        for (request, outcome) in requests.iter().zip(&outcomes) {
            assert_eq!(
                outcome.eligibility().eligibility_date,
                date(request.client.birth_date.year() + 62, 1, 1)
            );
            let serial = runner.run(request);
            assert_eq!(outcome.is_eligible(), serial.is_eligible());
        }
        // born 1963 turns 62 exactly on the as-of date
        assert!(outcomes[12].is_eligible());
        assert!(!outcomes[13].is_eligible());
    }

    #[test]
    fn test_scenarios_with_higher_indexation_use_more_exemption() {
        let runner = ScenarioRunner::new();
        let bases = [
            Indexation::None,
            Indexation::Fixed { annual_rate: 0.02 },
            Indexation::Fixed { annual_rate: 0.04 },
        ];

        let outcomes = runner.run_scenarios(&request(1, 1955), &bases);
        let impacts: Vec<f64> = outcomes
            .iter()
            .map(|o| o.result().unwrap().ledger.total_impact)
            .collect();

        assert_eq!(impacts[0], 100_000.0);
        assert!(impacts[1] > impacts[0]);
        assert!(impacts[2] > impacts[1]);
    }

    #[test]
    fn test_build_requests() {
        let clients = vec![
            Client::new(1, date(1950, 1, 1), Gender::Male, None),
            Client::new(2, date(1950, 1, 1), Gender::Male, None),
        ];
        let mut grants = BTreeMap::new();
        grants.insert(2, vec![Grant::new(5, "Acme", None, None, date(2010, 1, 1), 1.0)]);

        let requests = build_requests(clients, grants);
        assert!(requests[0].grants.is_empty());
        assert_eq!(requests[1].grants.len(), 1);
    }
}
