//! Rights Fixation CLI
//!
//! Fixes one client's severance exemption from a grants extract, prints the
//! ledger and writes the monthly cashflow to CSV.
//!
//! Usage:
//!   rights-fixation --birth-date 1957-05-10 --gender male --pension-start 2024-06-01 \
//!       --grants grants.csv --pension-monthly 9000

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use rights_fixation::cashflow::{project_cashflow, CashflowSource};
use rights_fixation::client::load_grants;
use rights_fixation::reference::loader::{load_cpi_series, load_exempt_capital_from_reader};
use rights_fixation::reference::{
    fetch_reference_snapshot, FetchConfig, HttpSource, JsonLinesAudit, ReferenceNormalizer,
};
use rights_fixation::{
    Client, FixationConfig, FixationEngine, FixationOutcome, FixationRequest, Gender, Indexation,
    ReferenceSnapshot, YearMonth,
};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::fs::File;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rights-fixation")]
#[command(about = "Severance exemption fixation and cashflow projection for one client")]
struct Args {
    #[arg(long, default_value = "1")]
    client_id: u32,

    /// Birth date (YYYY-MM-DD)
    #[arg(long)]
    birth_date: NaiveDate,

    /// male / m / זכר, female / f / נקבה
    #[arg(long, default_value = "male")]
    gender: String,

    /// Pension start date (YYYY-MM-DD)
    #[arg(long)]
    pension_start: Option<NaiveDate>,

    /// Grants CSV (GrantID,Employer,WorkStart,WorkEnd,GrantDate,Amount)
    #[arg(long)]
    grants: PathBuf,

    /// Evaluation date (default: today)
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Severance-cap endpoint; fallback constants are used when absent
    #[arg(long)]
    endpoint: Option<String>,

    /// Append the reference audit trail to this JSON-lines file
    #[arg(long, requires = "endpoint")]
    audit_log: Option<PathBuf>,

    /// CPI series CSV (year,month,index)
    #[arg(long, conflicts_with = "fixed_rate")]
    cpi: Option<PathBuf>,

    /// Fixed annual indexation rate (e.g. 0.02)
    #[arg(long)]
    fixed_rate: Option<f64>,

    /// Exempt-capital overrides CSV (year,pension_ceiling,exemption_rate)
    #[arg(long)]
    exempt_capital: Option<PathBuf>,

    /// Gross monthly pension for the cashflow
    #[arg(long)]
    pension_monthly: Option<f64>,

    #[arg(long, default_value = "0.0")]
    pension_indexation: f64,

    /// Flat tax rate on the taxable part of the pension
    #[arg(long, default_value = "0.1")]
    pension_tax_rate: f64,

    /// Net severance released as a lump sum in the first cashflow month
    #[arg(long)]
    severance_net: Option<f64>,

    /// First cashflow month (YYYY-MM, default: eligibility month)
    #[arg(long)]
    from: Option<YearMonth>,

    /// Last cashflow month (YYYY-MM, default: ten years after `from`)
    #[arg(long)]
    to: Option<YearMonth>,

    /// Cashflow CSV output
    #[arg(long, default_value = "cashflow_output.csv")]
    output: PathBuf,

    /// Print the full fixation result as JSON
    #[arg(long)]
    json: bool,
}

fn decimal(value: f64, what: &str) -> Result<Decimal> {
    Decimal::from_f64(value).with_context(|| format!("{} is not a valid amount: {}", what, value))
}

fn load_reference(args: &Args) -> Result<ReferenceSnapshot> {
    let snapshot = match (&args.endpoint, &args.audit_log) {
        (Some(url), Some(audit_path)) => {
            let config = FetchConfig::default();
            let source = HttpSource::new(config.timeout).context("building HTTP client")?;
            ReferenceNormalizer::new(source, JsonLinesAudit::new(audit_path), config).snapshot(url)
        }
        (Some(url), None) => fetch_reference_snapshot(url),
        (None, _) => ReferenceSnapshot::fallback(),
    };

    let indexation = match (&args.cpi, args.fixed_rate) {
        (Some(path), _) => Indexation::Cpi(
            load_cpi_series(path)
                .with_context(|| format!("loading CPI series from {}", path.display()))?,
        ),
        (None, Some(annual_rate)) => Indexation::Fixed { annual_rate },
        (None, None) => Indexation::None,
    };
    let snapshot = snapshot.with_indexation(indexation);

    match &args.exempt_capital {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            let table = load_exempt_capital_from_reader(file)
                .with_context(|| format!("loading exempt-capital table from {}", path.display()))?;
            Ok(snapshot.with_exempt_capital(table))
        }
        None => Ok(snapshot),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    println!("Rights Fixation v{}", env!("CARGO_PKG_VERSION"));
    println!("======================\n");

    let gender = Gender::parse(&args.gender);
    let client = Client::new(args.client_id, args.birth_date, gender, args.pension_start);
    let grants = load_grants(&args.grants)
        .with_context(|| format!("loading grants from {}", args.grants.display()))?;

    let reference = load_reference(&args)?;
    println!("Reference: {} (trace {})", reference.source.as_str(), reference.trace_id);
    println!("  Monthly cap: {:.2}", reference.monthly_cap);
    println!("  Annual cap:  {:.2}", reference.annual_cap);
    println!();

    let engine = FixationEngine::new(reference, FixationConfig::default());
    let mut request = FixationRequest::new(client, grants);
    request.as_of = args.as_of;
    let outcome = engine.compute(&request);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }

    let result = match &outcome {
        FixationOutcome::NotEligible(eligibility) => {
            println!("Client {} is not eligible for fixation", args.client_id);
            println!("  Eligibility date: {}", eligibility.eligibility_date);
            for reason in &eligibility.reasons {
                println!("  Reason: {}", reason.code());
            }
            return Ok(());
        }
        FixationOutcome::Fixed(result) => result,
    };

    if !result.eligibility.gender_recognized {
        println!("Warning: gender '{}' not recognised, male retirement age applied", args.gender);
    }
    println!("Eligibility date: {}", result.eligibility.eligibility_date);
    println!(
        "Exempt capital ({}): {:.2}",
        result.fixation_year, result.ledger.exempt_capital_initial
    );
    println!();
    println!(
        "{:>6} {:<20} {:>10} {:>14} {:>8} {:>14} {:>14}",
        "Grant", "Employer", "Date", "Indexed", "Ratio", "Consumed", "Remaining"
    );
    println!("{}", "-".repeat(92));
    for entry in &result.ledger.entries {
        let grant = result.grants.iter().find(|g| g.grant_id == entry.grant_id);
        match grant.and_then(|g| g.exclusion_reason) {
            Some(reason) => println!(
                "{:>6} {:<20} {:>10} excluded: {}",
                entry.grant_id, entry.employer_name, entry.grant_date, reason
            ),
            None => println!(
                "{:>6} {:<20} {:>10} {:>14.2} {:>8.4} {:>14.2} {:>14.2}",
                entry.grant_id,
                entry.employer_name,
                entry.grant_date,
                grant.map(|g| g.indexed_full_amount).unwrap_or(0.0),
                grant.map(|g| g.ratio_32y).unwrap_or(0.0),
                entry.consumed,
                entry.remaining_after,
            ),
        }
    }

    println!("\nSummary:");
    println!("  Total impact:          {:.2}", result.ledger.total_impact);
    println!("  Remaining capital:     {:.2}", result.final_remaining_exempt_capital);
    println!("  Monthly exemption:     {:.2}", result.final_remaining_monthly_exemption);
    println!("  Exempt pension share:  {:.2}%", result.exempt_pension_percentage);

    let from = args
        .from
        .unwrap_or_else(|| YearMonth::from_date(result.eligibility.eligibility_date));
    let to = args.to.unwrap_or_else(|| from.offset(119));
    if to < from {
        bail!("cashflow range is empty: {} is after {}", from, to);
    }

    let mut sources = Vec::new();
    if let Some(net) = args.severance_net {
        sources.push(CashflowSource::severance_release(
            "severance",
            from,
            decimal(net, "severance")?,
        ));
    }
    if let Some(monthly) = args.pension_monthly {
        let pension_start = args.pension_start.map(YearMonth::from_date).unwrap_or(from);
        sources.push(CashflowSource::fixed_pension(
            "pension",
            result,
            pension_start,
            decimal(monthly, "pension")?,
            decimal(args.pension_indexation, "pension indexation")?,
            decimal(args.pension_tax_rate, "pension tax rate")?,
        ));
    }

    let projection = project_cashflow(&sources, from, to)?;
    let names: Vec<String> = sources.iter().map(|s| s.name.clone()).collect();

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let mut header = vec!["Month".to_string(), "Inflow".into(), "Outflow".into(), "Net".into()];
    header.extend(names.iter().cloned());
    writer.write_record(&header)?;
    for row in &projection.rows {
        let mut record = vec![
            row.month.to_string(),
            row.inflow.to_string(),
            row.outflow.to_string(),
            row.net.to_string(),
        ];
        record.extend(
            names
                .iter()
                .map(|n| row.breakdown.get(n).copied().unwrap_or_default().to_string()),
        );
        writer.write_record(&record)?;
    }
    writer.flush()?;
    println!(
        "\nCashflow ({} months) written to: {}",
        projection.rows.len(),
        args.output.display()
    );

    let summary = projection.summary();
    for year in &summary.yearly {
        println!(
            "  {}: inflow {} outflow {} net {}",
            year.year, year.inflow, year.outflow, year.net
        );
    }

    Ok(())
}
