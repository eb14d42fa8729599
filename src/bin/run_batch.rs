//! Run fixation for a whole client file
//!
//! Reads a clients extract and a grants extract keyed by ClientID, fixes
//! every client in parallel and writes one summary row per client.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use rights_fixation::client::{load_clients, load_grants_by_client};
use rights_fixation::reference::fetch_reference_snapshot;
use rights_fixation::scenario::build_requests;
use rights_fixation::{
    FixationConfig, FixationOutcome, Indexation, ReferenceSnapshot, ScenarioRunner,
};
use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "run_batch")]
#[command(about = "Parallel rights fixation over a client file")]
struct Args {
    /// Clients CSV (ClientID,BirthDate,Gender,PensionStart)
    #[arg(long)]
    clients: PathBuf,

    /// Grants CSV with a ClientID column
    #[arg(long)]
    grants: PathBuf,

    #[arg(long)]
    as_of: Option<NaiveDate>,

    #[arg(long)]
    endpoint: Option<String>,

    #[arg(long)]
    fixed_rate: Option<f64>,

    #[arg(long, default_value = "batch_fixation_output.csv")]
    output: PathBuf,
}

#[derive(Debug, serde::Serialize)]
struct SummaryRow {
    #[serde(rename = "ClientID")]
    client_id: u32,
    #[serde(rename = "Eligible")]
    eligible: bool,
    #[serde(rename = "EligibilityDate")]
    eligibility_date: NaiveDate,
    #[serde(rename = "Reasons")]
    reasons: String,
    #[serde(rename = "Grants")]
    grants: usize,
    #[serde(rename = "ExcludedGrants")]
    excluded_grants: usize,
    #[serde(rename = "ExemptCapital")]
    exempt_capital: f64,
    #[serde(rename = "TotalImpact")]
    total_impact: f64,
    #[serde(rename = "ExcessImpact")]
    excess_impact: f64,
    #[serde(rename = "RemainingCapital")]
    remaining_capital: f64,
    #[serde(rename = "MonthlyExemption")]
    monthly_exemption: f64,
}

impl SummaryRow {
    fn from_outcome(client_id: u32, outcome: &FixationOutcome) -> Self {
        let eligibility = outcome.eligibility();
        let mut row = SummaryRow {
            client_id,
            eligible: eligibility.eligible,
            eligibility_date: eligibility.eligibility_date,
            reasons: eligibility.reasons.iter().map(|r| r.code()).collect::<Vec<_>>().join(";"),
            grants: 0,
            excluded_grants: 0,
            exempt_capital: 0.0,
            total_impact: 0.0,
            excess_impact: 0.0,
            remaining_capital: 0.0,
            monthly_exemption: 0.0,
        };
        if let Some(result) = outcome.result() {
            row.grants = result.grants.len();
            row.excluded_grants = result.grants.iter().filter(|g| g.is_excluded()).count();
            row.exempt_capital = result.ledger.exempt_capital_initial;
            row.total_impact = result.ledger.total_impact;
            row.excess_impact = result.ledger.total_excess_impact;
            row.remaining_capital = result.final_remaining_exempt_capital;
            row.monthly_exemption = result.final_remaining_monthly_exemption;
        }
        row
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let start = Instant::now();
    println!("Loading clients from {}...", args.clients.display());
    let clients = load_clients(&args.clients)
        .with_context(|| format!("loading clients from {}", args.clients.display()))?;
    let grants_file = File::open(&args.grants)
        .with_context(|| format!("opening {}", args.grants.display()))?;
    let grants = load_grants_by_client(grants_file)
        .with_context(|| format!("loading grants from {}", args.grants.display()))?;
    println!("Loaded {} clients in {:?}", clients.len(), start.elapsed());

    let reference = match &args.endpoint {
        Some(url) => fetch_reference_snapshot(url),
        None => ReferenceSnapshot::fallback(),
    };
    let reference = match args.fixed_rate {
        Some(annual_rate) => reference.with_indexation(Indexation::Fixed { annual_rate }),
        None => reference,
    };
    println!("Reference data: {} (trace {})", reference.source.as_str(), reference.trace_id);

    let runner = ScenarioRunner::with_reference(reference).with_config(FixationConfig {
        as_of: args.as_of,
        ..FixationConfig::default()
    });
    let requests = build_requests(clients, grants);

    println!("Running fixations...");
    let run_start = Instant::now();
    let outcomes = runner.run_batch(&requests);
    println!("Fixations complete in {:?}", run_start.elapsed());

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let mut eligible = 0usize;
    let mut total_remaining = 0.0;
    for (request, outcome) in requests.iter().zip(&outcomes) {
        let row = SummaryRow::from_outcome(request.client.client_id, outcome);
        if row.eligible {
            eligible += 1;
            total_remaining += row.remaining_capital;
        }
        writer.serialize(row)?;
    }
    writer.flush()?;
    println!("Output written to {}", args.output.display());

    println!("\nBatch Summary:");
    println!("  Clients:   {}", requests.len());
    println!("  Eligible:  {}", eligible);
    println!("  Remaining exempt capital (eligible clients): {:.2}", total_remaining);
    println!("\nTotal time: {:?}", start.elapsed());

    Ok(())
}
